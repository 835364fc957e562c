// SPDX-License-Identifier: GPL-3.0-or-later
use image::imageops;
use image::Luma;
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_circle_mut};
use imageproc::rect::Rect;

use crate::image_buffer::{allocate_rgb565, Rgb565Image};

use super::color::{BLACK, WHITE};
use super::color_map::COLOR_MAP;

/// Height of the information panel drawn below the thermal image.
pub(crate) const PANEL_HEIGHT: u32 = 240;

const DARK_GREY: u16 = 0x7BEF;

const DARKER_GREY: u16 = 0x18E3;

const RULER_TOP: i32 = 5;

const RULER_HEIGHT: u32 = 42;

/// Top of the dividing line between the ruler and the button area.
const DIVIDER_Y: i32 = RULER_TOP + RULER_HEIGHT as i32 + 51;

const TEXT_AREA_HEIGHT: u32 = 48;

const TEXT_AREA_BORDER: i32 = 2;

const TEXT_BOX_WIDTH: u32 = 59;

const TEXT_BOX_HEIGHT: u32 = TEXT_AREA_HEIGHT / 2 - TEXT_AREA_BORDER as u32 * 2 + 1;

fn fill(panel: &mut Rgb565Image, x: i32, y: i32, width: u32, height: u32, color: u16) {
    if width == 0 || height == 0 {
        return;
    }
    draw_filled_rect_mut(panel, Rect::at(x, y).of_size(width, height), Luma([color]));
}

/// Draw the static parts of the information panel: the palette ruler, the dividers and the
/// backgrounds for the buttons and text boxes.
pub(crate) fn draw_panel(width: u32) -> anyhow::Result<Rgb565Image> {
    let mut panel = allocate_rgb565(width, PANEL_HEIGHT, BLACK)?;
    let text_area_y = (PANEL_HEIGHT - TEXT_AREA_HEIGHT) as i32;
    fill(
        &mut panel,
        0,
        DIVIDER_Y,
        width,
        (text_area_y - DIVIDER_Y) as u32,
        DARKER_GREY,
    );
    // Palette ruler, with a black tick at each quarter boundary.
    let span = width.saturating_sub(1);
    for (index, color) in COLOR_MAP.iter().enumerate() {
        let color = if index % 64 == 0 || (index + 1) % 64 == 0 {
            BLACK
        } else {
            *color
        };
        let x = index as u32 * span / 255 + 1;
        fill(&mut panel, x as i32, RULER_TOP, 1, RULER_HEIGHT, color);
    }
    // Text area frames
    fill(&mut panel, 0, text_area_y, width, TEXT_AREA_HEIGHT, DARK_GREY);
    let long_box_width =
        width.saturating_sub(2 * (TEXT_AREA_BORDER as u32 * 2 + TEXT_BOX_WIDTH));
    let box_y = text_area_y + TEXT_AREA_BORDER;
    let mut box_x = TEXT_AREA_BORDER;
    for box_width in [TEXT_BOX_WIDTH, long_box_width, TEXT_BOX_WIDTH].iter() {
        fill(&mut panel, box_x, box_y, *box_width, TEXT_BOX_HEIGHT, DARKER_GREY);
        box_x += *box_width as i32 + TEXT_AREA_BORDER;
    }
    fill(
        &mut panel,
        TEXT_AREA_BORDER,
        box_y + TEXT_AREA_BORDER + TEXT_BOX_HEIGHT as i32,
        width.saturating_sub(TEXT_AREA_BORDER as u32 * 2),
        TEXT_BOX_HEIGHT,
        DARKER_GREY,
    );
    // Dividers
    fill(&mut panel, 0, DIVIDER_Y, width, 2, DARK_GREY);
    let divider_height = PANEL_HEIGHT - DIVIDER_Y as u32 - 2;
    for x in [0, 1, width as i32 - 1, width as i32 - 2].iter() {
        fill(&mut panel, *x, DIVIDER_Y + 1, 1, divider_height, DARK_GREY);
    }
    Ok(panel)
}

/// Draw the probe marker: alternating rings around a small dot.
pub(crate) fn draw_probe(image: &mut Rgb565Image, x: u32, y: u32) {
    let center = (x as i32, y as i32);
    for (radius, color) in [(8, BLACK), (7, WHITE), (6, BLACK), (5, WHITE)].iter() {
        draw_hollow_circle_mut(image, center, *radius, Luma([*color]));
    }
    draw_filled_circle_mut(image, center, 2, Luma([BLACK]));
}

/// The whole display: the thermal image on top and the information panel below it.
#[derive(Clone, Debug)]
pub(crate) struct Screen {
    panel: Rgb565Image,
    image: Rgb565Image,
}

impl Screen {
    pub(crate) fn new(raster_width: u32, raster_height: u32) -> anyhow::Result<Self> {
        Ok(Self {
            panel: draw_panel(raster_width)?,
            image: allocate_rgb565(raster_width, raster_height + PANEL_HEIGHT, BLACK)?,
        })
    }

    /// Redraw the screen from a freshly rendered raster. The probe marker is only drawn on the
    /// screen, and never extends into the panel.
    pub(crate) fn compose(&mut self, raster: &Rgb565Image, probe: Option<(u32, u32)>) {
        imageops::replace(&mut self.image, raster, 0, 0);
        if let Some((x, y)) = probe {
            draw_probe(&mut self.image, x, y);
        }
        imageops::replace(&mut self.image, &self.panel, 0, raster.height());
    }

    pub(crate) fn image(&self) -> &Rgb565Image {
        &self.image
    }
}
