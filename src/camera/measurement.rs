// SPDX-License-Identifier: GPL-3.0-or-later
use crate::image_buffer::ThermalImage;
use crate::temperature::Temperature;

/// A single frame read from a camera.
#[derive(Clone, Debug)]
pub(crate) struct Measurement {
    /// The temperature of every sensor cell, in row-major order.
    pub(crate) image: ThermalImage,

    /// The temperature of the sensor package itself.
    pub(crate) ambient: Temperature,

    /// The sensor supply voltage, when the camera reports it.
    pub(crate) vdd: Option<f32>,
}
