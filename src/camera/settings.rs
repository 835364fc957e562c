// SPDX-License-Identifier: GPL-3.0-or-later
use std::convert::TryFrom;
use std::fmt;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use linux_embedded_hal::I2cdev;
use serde::de::{Deserialize, Deserializer, Error};
use tracing::info;

use super::i2c::Bus;
use super::mock_camera::{MockCamera, RepeatMode};
use super::thermal_camera::{self, ThermalCamera};
use super::{SENSOR_HEIGHT, SENSOR_WIDTH};

fn default_mlx_address() -> u8 {
    0x33
}

fn default_reads_per_cycle() -> u8 {
    2
}

fn default_read_attempts() -> u8 {
    3
}

fn default_retry_delay() -> u64 {
    10
}

/// Settings shared by every kind of camera, controlling how frames are read.
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
pub(crate) struct CommonSettings {
    /// Keep the sensor's column order. When false (the default), each row is flipped so the
    /// image matches a display facing the opposite direction of the sensor.
    #[serde(default)]
    pub(crate) mirror: bool,

    /// How many frames to read each cycle. The cycle fails only if every read fails.
    #[serde(default = "default_reads_per_cycle")]
    pub(crate) reads_per_cycle: u8,

    /// How many times a single read is attempted before it is counted as dropped.
    #[serde(default = "default_read_attempts")]
    pub(crate) read_attempts: u8,

    /// Milliseconds to wait between attempts of a read.
    #[serde(default = "default_retry_delay")]
    retry_delay: u64,
}

impl CommonSettings {
    pub(crate) fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay)
    }
}

impl Default for CommonSettings {
    fn default() -> Self {
        Self {
            mirror: false,
            reads_per_cycle: default_reads_per_cycle(),
            read_attempts: default_read_attempts(),
            retry_delay: default_retry_delay(),
        }
    }
}

struct TryFromNum<U>(PhantomData<U>);

impl<U> TryFromNum<U> {
    pub(super) fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<U>,
        <T as TryFrom<U>>::Error: fmt::Display,
        U: Deserialize<'de>,
    {
        let value: U = U::deserialize(deserializer)?;
        T::try_from(value).map_err(|err| D::Error::custom(err))
    }
}

type TryFromF32 = TryFromNum<f32>;

#[derive(Clone, Debug, serde::Deserialize, PartialEq)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub(crate) enum CameraSettings {
    Mlx90640 {
        bus: Bus,

        #[serde(default = "default_mlx_address")]
        address: u8,

        #[serde(default, with = "TryFromF32")]
        frame_rate: mlx9064x::FrameRate,

        #[serde(flatten)]
        common: CommonSettings,
    },
    #[serde(rename = "mock")]
    MockCamera {
        path: PathBuf,
        frame_rate: f32,

        #[serde(default)]
        repeat_mode: RepeatMode,

        #[serde(flatten)]
        common: CommonSettings,
    },
}

impl CameraSettings {
    /// Convenience method for accessing common camera settings.
    pub(crate) fn common(&self) -> &CommonSettings {
        match self {
            Self::Mlx90640 { common, .. } => common,
            Self::MockCamera { common, .. } => common,
        }
    }

    pub(crate) fn create_camera(&self) -> anyhow::Result<Box<dyn ThermalCamera + Send>> {
        Ok(match self {
            Self::Mlx90640 {
                bus,
                address,
                frame_rate,
                ..
            } => {
                info!(?bus, address, "Connecting to MLX90640");
                let bus = I2cdev::try_from(bus).context("Unable to connect to I2C bus")?;
                let driver = mlx9064x::Mlx90640Driver::new(bus, *address)
                    .context("Unable to initialize MLX90640")?;
                Box::new(thermal_camera::Mlx90640::new(driver, *frame_rate)?)
            }
            Self::MockCamera {
                path,
                frame_rate,
                repeat_mode,
                ..
            } => {
                info!(?path, %repeat_mode, "Replaying recorded frames");
                Box::new(MockCamera::load(
                    path,
                    *repeat_mode,
                    *frame_rate,
                    (SENSOR_WIDTH, SENSOR_HEIGHT),
                )?)
            }
        })
    }
}
