// SPDX-License-Identifier: GPL-3.0-or-later
use anyhow::anyhow;
use image::{ImageBuffer, Luma};

/// Images where each point is a temperature in degrees Celsius.
///
/// The sensor grid is stored with the image width being the number of sensor columns, so the
/// samples are in row-major order.
pub(crate) type ThermalImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Images where each pixel is a 16-bit RGB565 color (or, in the middle of upsampling, a color map
/// index).
pub(crate) type Rgb565Image = ImageBuffer<Luma<u16>, Vec<u16>>;

/// Allocate a sample buffer once, failing with a useful message instead of aborting when the
/// allocator can't satisfy the request.
fn allocate<T: Copy>(len: usize, fill: T) -> anyhow::Result<Vec<T>> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(len).map_err(|_| {
        anyhow!(
            "Unable to allocate {} bytes for an image buffer",
            len * std::mem::size_of::<T>()
        )
    })?;
    buffer.resize(len, fill);
    Ok(buffer)
}

pub(crate) fn allocate_thermal(width: u32, height: u32, fill: f32) -> anyhow::Result<ThermalImage> {
    let samples = allocate((width * height) as usize, fill)?;
    ThermalImage::from_raw(width, height, samples)
        .ok_or_else(|| anyhow!("Thermal buffer does not match {}x{}", width, height))
}

pub(crate) fn allocate_rgb565(width: u32, height: u32, fill: u16) -> anyhow::Result<Rgb565Image> {
    let samples = allocate((width * height) as usize, fill)?;
    Rgb565Image::from_raw(width, height, samples)
        .ok_or_else(|| anyhow!("Raster buffer does not match {}x{}", width, height))
}
