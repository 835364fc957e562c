// SPDX-License-Identifier: GPL-3.0-or-later
use serde::Serialize;

use crate::temperature::TemperatureRange;

use super::statistics::FrameStatistics;

/// Where the temperature probe is, and what it reads.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub(crate) struct Probe {
    pub(crate) x: u32,
    pub(crate) y: u32,
    pub(crate) temperature: f32,
}

/// A snapshot of the frame loop, published after every cycle.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct Status {
    pub(crate) boot_count: u16,
    pub(crate) loop_number: u64,
    pub(crate) fps: f32,

    /// Cycles where no frame could be read from the camera.
    pub(crate) errors: u64,

    pub(crate) corrupted_frames: u64,
    pub(crate) range: TemperatureRange,
    pub(crate) statistics: FrameStatistics,
    pub(crate) probe: Probe,
    pub(crate) ambient: Option<f32>,
    pub(crate) vdd: Option<f32>,
    pub(crate) interpolation: bool,
    pub(crate) smoothing: bool,

    /// Whether the last save request succeeded. `None` until something has been saved.
    pub(crate) last_save: Option<bool>,
}

#[cfg(test)]
mod test {
    use super::{Probe, Status};
    use crate::frame_loop::FrameStatistics;
    use crate::temperature::TemperatureRange;

    #[test]
    fn serialize() {
        let range = TemperatureRange::default();
        let status = Status {
            boot_count: 3,
            loop_number: 12,
            fps: 8.0,
            errors: 1,
            corrupted_frames: 0,
            range,
            statistics: FrameStatistics::new(&range),
            probe: Probe {
                x: 160,
                y: 120,
                temperature: 30.5,
            },
            ambient: Some(24.0),
            vdd: None,
            interpolation: true,
            smoothing: false,
            last_save: None,
        };
        let json: serde_json::Value = serde_json::to_value(&status).unwrap();
        assert_eq!(json["boot_count"], 3);
        assert_eq!(json["loop_number"], 12);
        assert_eq!(json["range"]["min"], 25);
        assert_eq!(json["range"]["max"], 37);
        assert_eq!(json["statistics"]["all_time_max"], 37.0);
        assert_eq!(json["probe"]["temperature"], 30.5);
        assert_eq!(json["vdd"], serde_json::Value::Null);
        assert_eq!(json["smoothing"], false);
    }
}
