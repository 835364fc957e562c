// SPDX-License-Identifier: GPL-3.0-or-later
use tracing::trace;

use crate::image_buffer::ThermalImage;

/// Combines each new sensor frame into a running, optionally mirrored, grid of temperatures.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct TemporalFilter {
    /// When set, cells keep their sensor position. When clear, each row is flipped horizontally.
    pub(crate) mirror: bool,

    /// When set, each cell becomes the mean of its previous value and the new sample.
    pub(crate) smooth: bool,
}

impl TemporalFilter {
    pub(crate) fn new(mirror: bool, smooth: bool) -> Self {
        Self { mirror, smooth }
    }

    /// Fold `raw` into `filtered`.
    ///
    /// Both grids must have the same dimensions.
    pub(crate) fn apply(&self, raw: &ThermalImage, filtered: &mut ThermalImage) {
        assert_eq!(
            raw.dimensions(),
            filtered.dimensions(),
            "The filtered grid must match the sensor grid"
        );
        let columns = raw.width() as usize;
        let smooth = self.smooth;
        let combine = move |previous: &mut f32, sample: f32| {
            *previous = if smooth {
                (*previous + sample) / 2.0
            } else {
                sample
            };
        };
        let rows = raw.chunks_exact(columns).zip(filtered.chunks_exact_mut(columns));
        for (raw_row, filtered_row) in rows {
            if self.mirror {
                filtered_row
                    .iter_mut()
                    .zip(raw_row.iter())
                    .for_each(|(previous, sample)| combine(previous, *sample));
            } else {
                filtered_row
                    .iter_mut()
                    .rev()
                    .zip(raw_row.iter())
                    .for_each(|(previous, sample)| combine(previous, *sample));
            }
        }
        trace!(mirror = self.mirror, smooth, "filtered frame");
    }
}

#[cfg(test)]
mod test {
    use super::TemporalFilter;
    use crate::image_buffer::ThermalImage;

    fn grid(values: &[f32]) -> ThermalImage {
        ThermalImage::from_raw(3, 2, values.to_vec()).unwrap()
    }

    const RAW: [f32; 6] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];

    #[test]
    fn mirrored_replace() {
        let mut filtered = grid(&[0.0; 6]);
        TemporalFilter::new(true, false).apply(&grid(&RAW), &mut filtered);
        assert_eq!(filtered.as_raw(), &RAW.to_vec());
    }

    #[test]
    fn flipped_replace() {
        let mut filtered = grid(&[0.0; 6]);
        TemporalFilter::new(false, false).apply(&grid(&RAW), &mut filtered);
        assert_eq!(filtered.as_raw(), &vec![3.0, 2.0, 1.0, 6.0, 5.0, 4.0]);
    }

    #[test]
    fn mirrored_smoothing() {
        let mut filtered = grid(&[3.0; 6]);
        TemporalFilter::new(true, true).apply(&grid(&RAW), &mut filtered);
        assert_eq!(filtered.as_raw(), &vec![2.0, 2.5, 3.0, 3.5, 4.0, 4.5]);
    }

    #[test]
    fn flipped_smoothing() {
        let mut filtered = grid(&[1.0, 1.0, 1.0, 2.0, 2.0, 2.0]);
        TemporalFilter::new(false, true).apply(&grid(&RAW), &mut filtered);
        assert_eq!(filtered.as_raw(), &vec![2.0, 1.5, 1.0, 4.0, 3.5, 3.0]);
    }

    #[test]
    fn smoothing_converges() {
        let mut filtered = grid(&[25.0; 6]);
        let hot = grid(&[41.0; 6]);
        let filter = TemporalFilter::new(true, true);
        for _ in 0..20 {
            filter.apply(&hot, &mut filtered);
        }
        assert!(filtered.iter().all(|t| (41.0 - t).abs() < 0.001));
    }

    #[test]
    fn replace_ignores_previous() {
        let previous = [f32::NAN, -17.25, 280.0, f32::INFINITY, 0.5, -40.0];
        for mirror in [true, false].iter() {
            let mut filtered = grid(&previous);
            TemporalFilter::new(*mirror, false).apply(&grid(&RAW), &mut filtered);
            let mut expected = grid(&RAW);
            if !*mirror {
                expected = image::imageops::flip_horizontal(&expected);
            }
            assert_eq!(filtered, expected, "mirror = {}", mirror);
        }
    }

    #[test]
    fn repeated_sample_halves_change() {
        let previous = [10.0, -5.0, 30.0, 100.0, 0.0, 42.0];
        for mirror in [true, false].iter() {
            let filter = TemporalFilter::new(*mirror, true);
            let raw = grid(&RAW);
            let mut filtered = grid(&previous);
            filter.apply(&raw, &mut filtered);
            let first = filtered.clone();
            filter.apply(&raw, &mut filtered);
            let cells = previous.iter().zip(first.iter()).zip(filtered.iter());
            for ((before, once), twice) in cells {
                let first_change = (once - before).abs();
                let second_change = (twice - once).abs();
                assert!(
                    second_change <= first_change / 2.0,
                    "{} -> {} -> {} with mirror = {}",
                    before,
                    once,
                    twice,
                    mirror
                );
            }
        }
    }

    #[test]
    #[should_panic]
    fn mismatched_grids() {
        let mut filtered = ThermalImage::new(2, 2);
        TemporalFilter::new(true, true).apply(&grid(&RAW), &mut filtered);
    }
}
