// SPDX-License-Identifier: GPL-3.0-or-later
use std::convert::TryFrom;
use std::error::Error as StdError;
use std::time::Duration;

use anyhow::{anyhow, Context as _};
use embedded_hal::blocking::i2c;
use image::flat::{FlatSamples, SampleLayout};

use crate::temperature::Temperature;

use super::measurement::Measurement;

/// The operations a thermal camera needs to have to feed the frame loop.
pub(crate) trait ThermalCamera {
    /// Read a frame from the camera.
    ///
    /// An error here is a dropped read; the frame loop counts it and tries again.
    fn measure(&mut self) -> anyhow::Result<Measurement>;

    /// How long the camera takes to produce a new frame.
    fn frame_period(&self) -> Duration;
}

#[derive(Debug)]
pub(crate) struct Mlx90640<I2C> {
    camera: mlx9064x::Mlx90640Driver<I2C>,
    temperature_buffer: Vec<f32>,
    frame_period: Duration,
}

impl<I2C> Mlx90640<I2C>
where
    I2C: 'static + i2c::WriteRead + i2c::Write,
    <I2C as i2c::WriteRead>::Error: 'static + StdError + Sync + Send,
    <I2C as i2c::Write>::Error: 'static + StdError + Sync + Send,
{
    pub(crate) fn new(
        mut camera: mlx9064x::Mlx90640Driver<I2C>,
        frame_rate: mlx9064x::FrameRate,
    ) -> anyhow::Result<Self> {
        camera
            .set_frame_rate(frame_rate)
            .context("Error setting camera frame rate")?;
        let num_pixels = camera.height() * camera.width();
        let frame_period = Duration::from_secs_f32(1.0 / f32::from(frame_rate));
        Ok(Self {
            camera,
            temperature_buffer: vec![0f32; num_pixels],
            frame_period,
        })
    }
}

impl<I2C> ThermalCamera for Mlx90640<I2C>
where
    I2C: 'static + i2c::WriteRead + i2c::Write,
    <I2C as i2c::WriteRead>::Error: 'static + StdError + Sync + Send,
    <I2C as i2c::Write>::Error: 'static + StdError + Sync + Send,
{
    fn measure(&mut self) -> anyhow::Result<Measurement> {
        let ready = self
            .camera
            .generate_image_if_ready(&mut self.temperature_buffer)
            .context("Error reading frame from MLX90640")?;
        if !ready {
            return Err(anyhow!("MLX90640 frame not ready yet"));
        }
        let ambient = self
            .camera
            .ambient_temperature()
            .ok_or_else(|| anyhow!("MLX90640 did not report an ambient temperature"))?;
        // mlx9064x uses row-major ordering, so no swapping needed here.
        let layout = SampleLayout::row_major_packed(
            1,
            u32::try_from(self.camera.width())?,
            u32::try_from(self.camera.height())?,
        );
        let buffer_image = FlatSamples {
            samples: self.temperature_buffer.clone(),
            layout,
            color_hint: None,
        };
        let image = buffer_image
            .try_into_buffer()
            // try_into_buffer uses a 2-tuple as the error type, with the actual Error being the
            // first item in the tuple.
            .map_err(|e| e.0)
            .context("Unable to convert MLX90640 scratch buffer into an ImageBuffer")?;
        Ok(Measurement {
            image,
            ambient: Temperature::Celsius(ambient),
            // The driver doesn't expose the supply voltage it computes internally.
            vdd: None,
        })
    }

    fn frame_period(&self) -> Duration {
        self.frame_period
    }
}
