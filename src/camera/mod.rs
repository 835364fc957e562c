// SPDX-License-Identifier: GPL-3.0-or-later
mod i2c;
mod measurement;
mod mock_camera;
mod settings;
mod thermal_camera;

pub(crate) use measurement::Measurement;
#[cfg(test)]
pub(crate) use mock_camera::{MockCamera, RepeatMode};
pub(crate) use settings::{CameraSettings, CommonSettings};
pub(crate) use thermal_camera::ThermalCamera;

/// Number of columns in a sensor frame.
pub(crate) const SENSOR_WIDTH: u32 = 32;

/// Number of rows in a sensor frame.
pub(crate) const SENSOR_HEIGHT: u32 = 24;
