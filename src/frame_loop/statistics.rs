// SPDX-License-Identifier: GPL-3.0-or-later
use serde::Serialize;

use crate::image_buffer::ThermalImage;
use crate::temperature::TemperatureRange;

/// Extremes of the filtered grid, for the current frame and since the last reset.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub(crate) struct FrameStatistics {
    pub(crate) min: f32,
    pub(crate) max: f32,
    pub(crate) all_time_min: f32,
    pub(crate) all_time_max: f32,
}

impl FrameStatistics {
    /// Statistics before any frame has been seen, seeded from the color range.
    pub(crate) fn new(range: &TemperatureRange) -> Self {
        let min = range.min() as f32;
        let max = range.max() as f32;
        Self {
            min,
            max,
            all_time_min: min,
            all_time_max: max,
        }
    }

    /// Recompute the current extremes from `grid` and widen the all-time extremes to cover them.
    pub(crate) fn update(&mut self, grid: &ThermalImage) {
        let mut samples = grid.iter().copied();
        let first = match samples.next() {
            Some(first) => first,
            None => return,
        };
        let (min, max) = samples.fold((first, first), |(min, max), t| (min.min(t), max.max(t)));
        self.min = min;
        self.max = max;
        self.all_time_min = self.all_time_min.min(min);
        self.all_time_max = self.all_time_max.max(max);
    }

    pub(crate) fn reset(&mut self, range: &TemperatureRange) {
        *self = Self::new(range);
    }
}
