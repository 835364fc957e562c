// SPDX-License-Identifier: GPL-3.0-or-later
pub(crate) mod color;
pub(crate) mod color_map;
mod filter;
mod legend;
mod settings;
mod upsample;

pub(crate) use color::rgb565_to_rgb555;
pub(crate) use filter::TemporalFilter;
pub(crate) use legend::Screen;
pub(crate) use settings::RenderSettings;
pub(crate) use upsample::{Upsampler, VerticalWeighting};
