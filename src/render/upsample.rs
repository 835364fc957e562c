// SPDX-License-Identifier: GPL-3.0-or-later
use std::error::Error as StdError;
use std::fmt;

use image::Luma;
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use serde::Deserialize;
use tracing::trace;

use crate::image_buffer::{Rgb565Image, ThermalImage};
use crate::temperature::TemperatureRange;

use super::color_map::{color_for, color_index, COLOR_MAP};

/// The denominator used when blending between anchor rows.
#[derive(Copy, Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub(crate) enum VerticalWeighting {
    /// Blend rows with the horizontal scale factor, as the device firmware always has. Only
    /// usable when both scale factors are the same.
    HorizontalScale,

    /// Blend rows with the vertical scale factor.
    VerticalScale,
}

impl Default for VerticalWeighting {
    fn default() -> Self {
        Self::HorizontalScale
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum UpsampleError {
    /// The raster is not a whole multiple of the grid in one or both dimensions.
    NotAMultiple {
        grid: (u32, u32),
        raster: (u32, u32),
    },

    /// Either the grid or the raster has no cells.
    ZeroScale,

    /// Blending rows by the horizontal scale needs both scale factors to match, otherwise rows
    /// would be left stale or written past the end of the raster.
    NonSquareLegacyWeighting { scale_x: u32, scale_y: u32 },
}

impl fmt::Display for UpsampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpsampleError::NotAMultiple { grid, raster } => write!(
                f,
                "A {}x{} raster is not a whole multiple of a {}x{} grid",
                raster.0, raster.1, grid.0, grid.1
            ),
            UpsampleError::ZeroScale => f.write_str("Cannot upsample to or from an empty image"),
            UpsampleError::NonSquareLegacyWeighting { scale_x, scale_y } => write!(
                f,
                "Horizontal scale weighting requires equal scale factors (got {} and {})",
                scale_x, scale_y
            ),
        }
    }
}

impl StdError for UpsampleError {}

/// Expands a temperature grid into a full resolution raster of colors.
///
/// Upsampling happens in two phases sharing the one raster. The index phase
/// ([`place_anchors`](Self::place_anchors), [`interpolate_rows`](Self::interpolate_rows) and
/// [`interpolate_columns`](Self::interpolate_columns)) leaves color map indices in every pixel,
/// then [`colorize`](Self::colorize) swaps each index for its color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Upsampler {
    grid_width: u32,
    grid_height: u32,
    scale_x: u32,
    scale_y: u32,
    weighting: VerticalWeighting,
}

impl Upsampler {
    pub(crate) fn new(
        grid: (u32, u32),
        raster: (u32, u32),
        weighting: VerticalWeighting,
    ) -> Result<Self, UpsampleError> {
        let (grid_width, grid_height) = grid;
        let (raster_width, raster_height) = raster;
        if grid_width == 0 || grid_height == 0 || raster_width == 0 || raster_height == 0 {
            return Err(UpsampleError::ZeroScale);
        }
        if raster_width % grid_width != 0
            || raster_height % grid_height != 0
            || raster_width < grid_width
            || raster_height < grid_height
        {
            return Err(UpsampleError::NotAMultiple { grid, raster });
        }
        let scale_x = raster_width / grid_width;
        let scale_y = raster_height / grid_height;
        if weighting == VerticalWeighting::HorizontalScale && scale_x != scale_y {
            return Err(UpsampleError::NonSquareLegacyWeighting { scale_x, scale_y });
        }
        Ok(Self {
            grid_width,
            grid_height,
            scale_x,
            scale_y,
            weighting,
        })
    }

    pub(crate) fn scale(&self) -> (u32, u32) {
        (self.scale_x, self.scale_y)
    }

    pub(crate) fn raster_dimensions(&self) -> (u32, u32) {
        (
            self.grid_width * self.scale_x,
            self.grid_height * self.scale_y,
        )
    }

    fn check_dimensions(&self, grid: &ThermalImage, raster: &Rgb565Image) {
        assert_eq!(
            grid.dimensions(),
            (self.grid_width, self.grid_height),
            "Unexpected grid size"
        );
        assert_eq!(
            raster.dimensions(),
            self.raster_dimensions(),
            "Unexpected raster size"
        );
    }

    /// The denominator (and the number of rows plus one filled per segment) of the vertical
    /// pass.
    fn vertical_steps(&self) -> usize {
        match self.weighting {
            VerticalWeighting::HorizontalScale => self.scale_x as usize,
            VerticalWeighting::VerticalScale => self.scale_y as usize,
        }
    }

    /// Write the color map index of each grid cell to the top-left pixel of its footprint.
    /// Every other pixel is left as it was.
    pub(crate) fn place_anchors(
        &self,
        grid: &ThermalImage,
        range: &TemperatureRange,
        raster: &mut Rgb565Image,
    ) {
        self.check_dimensions(grid, raster);
        for (column, row, temperature) in grid.enumerate_pixels() {
            raster.put_pixel(
                column * self.scale_x,
                row * self.scale_y,
                Luma([color_index(temperature[0], range) as u16]),
            );
        }
    }

    /// Blend between horizontally adjacent anchors along each anchor row. The pixels right of
    /// the last anchor repeat it.
    pub(crate) fn interpolate_rows(&self, raster: &mut Rgb565Image) {
        let width = raster.width() as usize;
        let scale = self.scale_x as usize;
        let steps = scale as u32;
        for row in raster
            .chunks_exact_mut(width)
            .step_by(self.scale_y as usize)
        {
            for left in (0..width - scale).step_by(scale) {
                let left_index = row[left] as u32;
                let right_index = row[left + scale] as u32;
                for i in 0..scale - 1 {
                    let offset = i as u32;
                    row[left + 1 + i] = ((left_index * (steps - 1 - offset)
                        + right_index * (offset + 1))
                        / steps) as u16;
                }
            }
            let last = row[width - scale];
            row[width - scale + 1..].iter_mut().for_each(|p| *p = last);
        }
    }

    /// Blend between vertically adjacent anchor rows, using the already filled anchor rows as
    /// input. The rows below the last anchor row repeat it.
    pub(crate) fn interpolate_columns(&self, raster: &mut Rgb565Image) {
        let width = raster.width() as usize;
        let height = raster.height() as usize;
        let scale = self.scale_y as usize;
        let steps = self.vertical_steps();
        let samples: &mut [u16] = raster;
        for top in (0..height - scale).step_by(scale) {
            let (above, below) = samples.split_at_mut((top + 1) * width);
            let top_row = &above[top * width..];
            let (between, rest) = below.split_at_mut((steps - 1) * width);
            let bottom_row = &rest[..width];
            for (i, row) in between.chunks_exact_mut(width).enumerate() {
                let offset = i as u32;
                for (column, pixel) in row.iter_mut().enumerate() {
                    let top_index = top_row[column] as u32;
                    let bottom_index = bottom_row[column] as u32;
                    *pixel = ((top_index * (steps as u32 - 1 - offset)
                        + bottom_index * (offset + 1))
                        / steps as u32) as u16;
                }
            }
        }
        let last_start = (height - scale) * width;
        let (above, below) = samples.split_at_mut(last_start + width);
        let last_row = &above[last_start..];
        for row in below.chunks_exact_mut(width).take(steps - 1) {
            row.copy_from_slice(last_row);
        }
    }

    /// Replace every color map index in the raster with its color.
    pub(crate) fn colorize(raster: &mut Rgb565Image) {
        for pixel in raster.iter_mut() {
            *pixel = COLOR_MAP[(*pixel as usize).min(COLOR_MAP.len() - 1)];
        }
    }

    /// Run both phases, leaving a raster of colors.
    pub(crate) fn upsample(
        &self,
        grid: &ThermalImage,
        range: &TemperatureRange,
        raster: &mut Rgb565Image,
    ) {
        self.place_anchors(grid, range, raster);
        self.interpolate_rows(raster);
        self.interpolate_columns(raster);
        Self::colorize(raster);
        trace!(
            width = raster.width(),
            height = raster.height(),
            "upsampled frame"
        );
    }

    /// Paint each grid cell as a solid block of its color, without any blending.
    pub(crate) fn fill_blocks(
        &self,
        grid: &ThermalImage,
        range: &TemperatureRange,
        raster: &mut Rgb565Image,
    ) {
        self.check_dimensions(grid, raster);
        for (column, row, temperature) in grid.enumerate_pixels() {
            let block = Rect::at((column * self.scale_x) as i32, (row * self.scale_y) as i32)
                .of_size(self.scale_x, self.scale_y);
            draw_filled_rect_mut(raster, block, Luma([color_for(temperature[0], range)]));
        }
    }
}
