// SPDX-License-Identifier: GPL-3.0-or-later
use serde::Deserialize;

use super::VerticalWeighting;

fn default_width() -> u32 {
    320
}

fn default_height() -> u32 {
    240
}

fn default_true() -> bool {
    true
}

fn default_status_interval() -> u32 {
    3
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub(crate) struct RenderSettings {
    /// Width of the thermal image in pixels. Must be a multiple of the sensor width.
    #[serde(default = "default_width")]
    pub(crate) width: u32,

    /// Height of the thermal image in pixels. Must be a multiple of the sensor height.
    #[serde(default = "default_height")]
    pub(crate) height: u32,

    /// Blend between sensor cells. When disabled each cell is drawn as a solid block.
    #[serde(default = "default_true")]
    pub(crate) interpolation: bool,

    /// Average each new frame with the previous one.
    #[serde(default = "default_true")]
    pub(crate) smoothing: bool,

    #[serde(default)]
    pub(crate) vertical_weighting: VerticalWeighting,

    /// How many frames between statistics log messages.
    #[serde(default = "default_status_interval")]
    pub(crate) status_interval: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            interpolation: default_true(),
            smoothing: default_true(),
            vertical_weighting: VerticalWeighting::default(),
            status_interval: default_status_interval(),
        }
    }
}
