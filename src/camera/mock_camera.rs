// SPDX-License-Identifier: GPL-3.0-or-later
use std::convert::TryFrom;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context as _};
use serde::de::{Deserialize, IntoDeserializer};
use tracing::{debug, trace};

use crate::image_buffer::ThermalImage;
use crate::temperature::Temperature;

use super::measurement::Measurement;
use super::thermal_camera::ThermalCamera;

/// One frame of a recording, as stored in the TOML file.
#[derive(Clone, Debug, serde::Deserialize)]
pub(crate) struct RecordedFrame {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) values: Vec<f32>,
    pub(crate) ambient: Temperature,
    #[serde(default)]
    pub(crate) vdd: Option<f32>,
}

impl TryFrom<RecordedFrame> for Measurement {
    type Error = anyhow::Error;

    fn try_from(frame: RecordedFrame) -> anyhow::Result<Self> {
        let value_count = frame.values.len();
        let (width, height) = (frame.width, frame.height);
        let image = ThermalImage::from_vec(width, height, frame.values)
            .filter(|_| value_count == (width * height) as usize)
            .ok_or_else(|| {
                anyhow!(
                    "{} values do not fill a {}x{} frame",
                    value_count,
                    width,
                    height
                )
            })?;
        Ok(Measurement {
            image,
            ambient: frame.ambient,
            vdd: frame.vdd,
        })
    }
}

#[derive(serde::Deserialize)]
struct Recording {
    measurements: Vec<RecordedFrame>,
}

/// Controls how measurements are repeated by [`MockCamera`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum RepeatMode {
    /// Don't repeat.
    ///
    /// Once the end of the measurements has been reached, an error is returned.
    None,

    /// Loop over the measurements.
    ///
    /// Once the end of the measurements has been reached, the list is restarted from the
    /// beginning. This is the default mode.
    Loop,

    /// Alternate between forward and reverse playback.
    ///
    /// Once the end of the measurements has been reached, playback continues backwards. Once the
    /// beginning has been reached, playback continues forwards. The measurements at either end of
    /// the list of data are *not* repeated.
    Bounce,
}

impl Default for RepeatMode {
    fn default() -> Self {
        Self::Loop
    }
}

impl FromStr for RepeatMode {
    type Err = serde::de::value::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RepeatMode::deserialize(s.into_deserializer())
    }
}

impl fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RepeatMode::None => "none",
            RepeatMode::Loop => "loop",
            RepeatMode::Bounce => "bounce",
        };
        write!(f, "{}", s)
    }
}

/// A camera replaying frames from a recording, for running without the sensor attached.
pub(crate) struct MockCamera {
    frame_period: Duration,
    measurements: Vec<Measurement>,
    index: Box<dyn Iterator<Item = usize> + Send + Sync>,
}

impl MockCamera {
    pub(crate) fn new(measurements: Vec<Measurement>, repeat: RepeatMode, frame_rate: f32) -> Self {
        let num_measurements = measurements.len();
        let index: Box<dyn Iterator<Item = usize> + Send + Sync> = match repeat {
            RepeatMode::None => Box::new(0..num_measurements),
            RepeatMode::Loop => Box::new((0..num_measurements).cycle()),
            RepeatMode::Bounce => {
                let forwards = 0..num_measurements;
                let backwards = (1..num_measurements.saturating_sub(1)).rev();
                Box::new(forwards.chain(backwards).cycle())
            }
        };
        Self {
            frame_period: Duration::from_secs_f32(1.0 / frame_rate.max(f32::EPSILON)),
            measurements,
            index,
        }
    }

    /// Load a TOML recording, checking that every frame has the expected dimensions.
    pub(crate) fn load(
        path: &Path,
        repeat: RepeatMode,
        frame_rate: f32,
        dimensions: (u32, u32),
    ) -> anyhow::Result<Self> {
        let data_string = std::fs::read_to_string(path)
            .with_context(|| format!("Unable to read mock camera recording {}", path.display()))?;
        let recording: Recording = toml::from_str(&data_string)
            .with_context(|| format!("Invalid mock camera recording {}", path.display()))?;
        let measurements = recording
            .measurements
            .into_iter()
            .enumerate()
            .map(|(index, frame)| {
                let measurement = Measurement::try_from(frame)
                    .with_context(|| format!("Invalid frame {} in recording", index))?;
                if measurement.image.dimensions() != dimensions {
                    return Err(anyhow!(
                        "Frame {} is {:?}, expected {:?}",
                        index,
                        measurement.image.dimensions(),
                        dimensions
                    ));
                }
                Ok(measurement)
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        debug!(
            count = measurements.len(),
            %repeat,
            "Loaded mock camera recording"
        );
        Ok(Self::new(measurements, repeat, frame_rate))
    }
}

impl ThermalCamera for MockCamera {
    fn measure(&mut self) -> anyhow::Result<Measurement> {
        let index = self
            .index
            .next()
            .ok_or_else(|| anyhow!("No more measurements in record"))?;
        trace!(index, "Replaying recorded frame");
        Ok(self.measurements[index].clone())
    }

    fn frame_period(&self) -> Duration {
        self.frame_period
    }
}

#[cfg(test)]
mod test {
    use std::convert::TryFrom;
    use std::io::Write;
    use std::time::Duration;

    use image::Pixel;

    use crate::camera::Measurement;
    use crate::image_buffer::ThermalImage;
    use crate::temperature::Temperature;

    use super::super::thermal_camera::ThermalCamera;
    use super::{MockCamera, RecordedFrame, RepeatMode};

    const START_IMAGE_TEMP: f32 = 20.0;

    const START_AMBIENT_TEMP: f32 = 30.0;

    const NUM_TINY_MEASUREMENTS: usize = 10;

    fn tiny_measurements() -> Vec<Measurement> {
        (0..NUM_TINY_MEASUREMENTS)
            .map(|offset| {
                let offset = offset as f32;
                Measurement {
                    image: ThermalImage::from_pixel(1, 1, [START_IMAGE_TEMP + offset].into()),
                    ambient: Temperature::Celsius(START_AMBIENT_TEMP + offset),
                    vdd: None,
                }
            })
            .collect()
    }

    fn assert_measurements(repeat_mode: RepeatMode, image_temps: &[f32], ambient_temps: &[f32]) {
        assert_eq!(
            image_temps.len(),
            ambient_temps.len(),
            "image_temps and ambient_temps must be the same length"
        );
        let mut cam = MockCamera::new(tiny_measurements(), repeat_mode, 4.0);
        let measurements: Vec<Measurement> = std::iter::from_fn(move || cam.measure().ok())
            .fuse()
            .take(30)
            .collect();
        let expected_length = image_temps.len();
        assert_eq!(
            measurements.len(),
            expected_length,
            "Unexpected number of measurements"
        );
        let actual_image_temps: Vec<f32> = measurements
            .iter()
            .map(|m| m.image[(0, 0)].channels()[0])
            .collect();
        let actual_ambient_temps: Vec<f32> = measurements
            .iter()
            .map(|m| m.ambient.in_celsius())
            .collect();
        assert_eq!(
            &actual_image_temps[..],
            image_temps,
            "image temperatures do not match"
        );
        assert_eq!(
            &actual_ambient_temps[..],
            ambient_temps,
            "ambient temperatures do not match"
        );
    }

    #[test]
    fn repeat_none() {
        let expected_image = [20.0, 21.0, 22.0, 23.0, 24.0, 25.0, 26.0, 27.0, 28.0, 29.0];
        let expected_ambient = [30.0, 31.0, 32.0, 33.0, 34.0, 35.0, 36.0, 37.0, 38.0, 39.0];
        assert_measurements(RepeatMode::None, &expected_image[..], &expected_ambient[..])
    }

    #[test]
    fn repeat_loop() {
        let expected_image = [
            20.0, 21.0, 22.0, 23.0, 24.0, 25.0, 26.0, 27.0, 28.0, 29.0, 20.0, 21.0, 22.0, 23.0,
            24.0, 25.0, 26.0, 27.0, 28.0, 29.0, 20.0, 21.0, 22.0, 23.0, 24.0, 25.0, 26.0, 27.0,
            28.0, 29.0,
        ];
        let expected_ambient = [
            30.0, 31.0, 32.0, 33.0, 34.0, 35.0, 36.0, 37.0, 38.0, 39.0, 30.0, 31.0, 32.0, 33.0,
            34.0, 35.0, 36.0, 37.0, 38.0, 39.0, 30.0, 31.0, 32.0, 33.0, 34.0, 35.0, 36.0, 37.0,
            38.0, 39.0,
        ];
        assert_measurements(RepeatMode::Loop, &expected_image[..], &expected_ambient[..])
    }

    #[test]
    fn repeat_bounce() {
        // NOTE: bounce does *not* repeat each end of the loop
        let expected_image = [
            20.0, 21.0, 22.0, 23.0, 24.0, 25.0, 26.0, 27.0, 28.0, 29.0, 28.0, 27.0, 26.0, 25.0,
            24.0, 23.0, 22.0, 21.0, 20.0, 21.0, 22.0, 23.0, 24.0, 25.0, 26.0, 27.0, 28.0, 29.0,
            28.0, 27.0,
        ];
        let expected_ambient = [
            30.0, 31.0, 32.0, 33.0, 34.0, 35.0, 36.0, 37.0, 38.0, 39.0, 38.0, 37.0, 36.0, 35.0,
            34.0, 33.0, 32.0, 31.0, 30.0, 31.0, 32.0, 33.0, 34.0, 35.0, 36.0, 37.0, 38.0, 39.0,
            38.0, 37.0,
        ];
        assert_measurements(
            RepeatMode::Bounce,
            &expected_image[..],
            &expected_ambient[..],
        )
    }

    #[test]
    fn repeat_mode_from_str() {
        assert_eq!("bounce".parse::<RepeatMode>().unwrap(), RepeatMode::Bounce);
        assert_eq!(RepeatMode::default().to_string(), "loop");
        assert!("sideways".parse::<RepeatMode>().is_err());
    }

    #[test]
    fn frame_period() {
        let cam = MockCamera::new(tiny_measurements(), RepeatMode::Loop, 4.0);
        assert_eq!(cam.frame_period(), Duration::from_millis(250));
    }

    #[test]
    fn short_frame_rejected() {
        let frame = RecordedFrame {
            width: 2,
            height: 2,
            values: vec![1.0, 2.0, 3.0],
            ambient: Temperature::Celsius(20.0),
            vdd: None,
        };
        assert!(Measurement::try_from(frame).is_err());
    }

    #[test]
    fn long_frame_rejected() {
        let frame = RecordedFrame {
            width: 1,
            height: 2,
            values: vec![1.0, 2.0, 3.0],
            ambient: Temperature::Celsius(20.0),
            vdd: None,
        };
        assert!(Measurement::try_from(frame).is_err());
    }

    #[test]
    fn exact_frame_accepted() {
        let frame = RecordedFrame {
            width: 3,
            height: 2,
            values: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            ambient: Temperature::Celsius(20.0),
            vdd: Some(3.3),
        };
        let measurement = Measurement::try_from(frame).unwrap();
        assert_eq!(measurement.image.dimensions(), (3, 2));
        assert_eq!(measurement.image.get_pixel(2, 1).channels()[0], 6.0);
        assert_eq!(measurement.vdd, Some(3.3));
    }

    #[test]
    fn load_recording() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [[measurements]]
            width = 2
            height = 1
            values = [21.5, 22.5]
            ambient = 30.0
            vdd = 3.3

            [[measurements]]
            width = 2
            height = 1
            values = [23.5, 24.5]
            ambient = {{ fahrenheit = 86.0 }}
            "#
        )
        .unwrap();
        let mut cam = MockCamera::load(file.path(), RepeatMode::None, 2.0, (2, 1)).unwrap();
        let first = cam.measure().unwrap();
        assert_eq!(first.image.as_raw(), &vec![21.5, 22.5]);
        assert_eq!(first.vdd, Some(3.3));
        let second = cam.measure().unwrap();
        assert_eq!(second.vdd, None);
        assert_eq!(second.ambient, Temperature::Celsius(30.0));
        assert!(cam.measure().is_err());
        assert!(MockCamera::load(file.path(), RepeatMode::None, 2.0, (32, 24)).is_err());
    }
}
