// SPDX-License-Identifier: GPL-3.0-or-later
use std::error::Error as StdError;
use std::fmt;

use num_traits::Float;
use serde::{Deserialize, Serialize};

/// The coldest temperature the sensor can measure, in degrees Celsius.
pub(crate) const MIN_MEASURABLE: i16 = -40;

/// The hottest temperature the sensor can measure, in degrees Celsius.
pub(crate) const MAX_MEASURABLE: i16 = 300;

/// Whether a single sample could have come from a working sensor.
pub(crate) fn is_measurable(value: f32) -> bool {
    // NaN fails both comparisons, so it is never measurable.
    value >= MIN_MEASURABLE as f32 && value <= MAX_MEASURABLE as f32
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(from = "DeserializedTemperature<T>")]
pub(crate) enum Temperature<T = f32>
where
    T: Float,
{
    Celsius(T),
    Fahrenheit(T),
}

impl<T> Temperature<T>
where
    T: Float,
{
    /// Get the temperature in Celsius.
    pub(crate) fn in_celsius(&self) -> T {
        match self {
            Self::Celsius(c) => *c,
            Self::Fahrenheit(f) => {
                (*f - T::from(32).expect("32 to be able to be represented by a float"))
                    * T::from(5).expect("5 to be able to be represented by a float")
                    / T::from(9).expect("9 to be able to be represented by a float")
            }
        }
    }
}

impl<T> PartialEq for Temperature<T>
where
    T: Float,
{
    fn eq(&self, other: &Self) -> bool {
        // Always compare in celsius.
        self.in_celsius().eq(&other.in_celsius())
    }
}

impl<T> From<T> for Temperature<T>
where
    T: Float,
{
    fn from(value: T) -> Self {
        Self::Celsius(value)
    }
}

// Accept either a bare number (Celsius) or a map of a unit to a number.
#[derive(Copy, Clone, Debug, Deserialize)]
#[serde(untagged)]
enum DeserializedTemperature<T>
where
    T: Float,
{
    Number(T),
    Wrapped(TaggedTemperature<T>),
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TaggedTemperature<T>
where
    T: Float,
{
    #[serde(alias = "c", alias = "C")]
    Celsius(T),

    #[serde(alias = "f", alias = "F")]
    Fahrenheit(T),
}

impl<T> From<DeserializedTemperature<T>> for Temperature<T>
where
    T: Float,
{
    fn from(maybe_wrapped: DeserializedTemperature<T>) -> Self {
        match maybe_wrapped {
            DeserializedTemperature::Number(temperature) => temperature.into(),
            DeserializedTemperature::Wrapped(TaggedTemperature::Celsius(c)) => Self::Celsius(c),
            DeserializedTemperature::Wrapped(TaggedTemperature::Fahrenheit(f)) => {
                Self::Fahrenheit(f)
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RangeError {
    /// The lower bound is not below the upper bound.
    Inverted { min: i16, max: i16 },

    /// A bound is not strictly inside the measurable temperatures.
    OutOfBounds(i16),
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeError::Inverted { min, max } => write!(
                f,
                "Temperature range minimum ({}) must be below the maximum ({})",
                min, max
            ),
            RangeError::OutOfBounds(bound) => write!(
                f,
                "Temperature range bound {} is outside of {}..{}",
                bound, MIN_MEASURABLE, MAX_MEASURABLE
            ),
        }
    }
}

impl StdError for RangeError {}

/// The temperatures mapped to the two ends of the color map.
///
/// Construction guarantees `min < max`, with both bounds strictly inside the measurable
/// temperatures, so mapping a value onto the range never divides by zero.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(try_from = "RawRange", into = "RawRange")]
pub(crate) struct TemperatureRange {
    min: i16,
    max: i16,
}

/// A one degree nudge of either bound of a [`TemperatureRange`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RangeAdjustment {
    MinDown,
    MinUp,
    MaxDown,
    MaxUp,
}

impl TemperatureRange {
    pub(crate) fn new(min: i16, max: i16) -> Result<Self, RangeError> {
        for bound in [min, max].iter() {
            if *bound <= MIN_MEASURABLE || *bound >= MAX_MEASURABLE {
                return Err(RangeError::OutOfBounds(*bound));
            }
        }
        if min >= max {
            return Err(RangeError::Inverted { min, max });
        }
        Ok(Self { min, max })
    }

    pub(crate) fn min(&self) -> i16 {
        self.min
    }

    pub(crate) fn max(&self) -> i16 {
        self.max
    }

    /// The range after moving one bound by a degree, or `None` if that would leave the valid
    /// ranges.
    pub(crate) fn adjusted(&self, adjustment: RangeAdjustment) -> Option<Self> {
        let (min, max) = match adjustment {
            RangeAdjustment::MinDown => (self.min - 1, self.max),
            RangeAdjustment::MinUp => (self.min + 1, self.max),
            RangeAdjustment::MaxDown => (self.min, self.max - 1),
            RangeAdjustment::MaxUp => (self.min, self.max + 1),
        };
        Self::new(min, max).ok()
    }
}

impl Default for TemperatureRange {
    fn default() -> Self {
        Self { min: 25, max: 37 }
    }
}

impl fmt::Display for TemperatureRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.min, self.max)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
struct RawRange {
    min: i16,
    max: i16,
}

impl std::convert::TryFrom<RawRange> for TemperatureRange {
    type Error = RangeError;

    fn try_from(raw: RawRange) -> Result<Self, Self::Error> {
        Self::new(raw.min, raw.max)
    }
}

impl From<TemperatureRange> for RawRange {
    fn from(range: TemperatureRange) -> Self {
        Self {
            min: range.min,
            max: range.max,
        }
    }
}

#[cfg(test)]
mod test {
    use float_cmp::{approx_eq, F32Margin};
    use serde::Deserialize;

    use super::{is_measurable, RangeAdjustment, RangeError, Temperature, TemperatureRange};

    #[test]
    fn fahrenheit_in_celsius() {
        assert!(approx_eq!(
            f32,
            Temperature::Fahrenheit(-40.0).in_celsius(),
            -40.0,
            F32Margin::default()
        ));
        assert!(approx_eq!(
            f32,
            Temperature::Fahrenheit(212.0).in_celsius(),
            100.0,
            F32Margin::default()
        ));
    }

    #[derive(Debug, Deserialize)]
    struct Wrapper {
        temp: Temperature,
    }

    #[test]
    fn deserialize_number() {
        let wrapper: Wrapper = toml::from_str("temp = 1.5").unwrap();
        assert!(matches!(wrapper.temp, Temperature::Celsius(t) if t == 1.5));
    }

    #[test]
    fn deserialize_fahrenheit() {
        let wrapper: Wrapper = toml::from_str(r#"temp = { "fahrenheit" = -40.0 }"#).unwrap();
        assert!(matches!(wrapper.temp, Temperature::Fahrenheit(_)));
        assert_eq!(wrapper.temp, Temperature::Celsius(-40.0));
    }

    #[test]
    fn measurable() {
        assert!(is_measurable(-40.0));
        assert!(is_measurable(300.0));
        assert!(is_measurable(22.5));
        assert!(!is_measurable(-40.5));
        assert!(!is_measurable(300.1));
        assert!(!is_measurable(f32::NAN));
    }

    #[test]
    fn range_validation() {
        assert!(TemperatureRange::new(25, 37).is_ok());
        assert_eq!(
            TemperatureRange::new(30, 30),
            Err(RangeError::Inverted { min: 30, max: 30 })
        );
        assert_eq!(
            TemperatureRange::new(40, 30),
            Err(RangeError::Inverted { min: 40, max: 30 })
        );
        assert_eq!(
            TemperatureRange::new(-40, 30),
            Err(RangeError::OutOfBounds(-40))
        );
        assert_eq!(
            TemperatureRange::new(0, 300),
            Err(RangeError::OutOfBounds(300))
        );
    }

    #[test]
    fn range_adjustments() {
        let range = TemperatureRange::new(25, 37).unwrap();
        assert_eq!(
            range.adjusted(RangeAdjustment::MinDown),
            TemperatureRange::new(24, 37).ok()
        );
        assert_eq!(
            range.adjusted(RangeAdjustment::MaxUp),
            TemperatureRange::new(25, 38).ok()
        );
        let narrow = TemperatureRange::new(30, 31).unwrap();
        assert_eq!(narrow.adjusted(RangeAdjustment::MinUp), None);
        assert_eq!(narrow.adjusted(RangeAdjustment::MaxDown), None);
        let low = TemperatureRange::new(-39, 0).unwrap();
        assert_eq!(low.adjusted(RangeAdjustment::MinDown), None);
    }

    #[derive(Debug, Deserialize)]
    struct RangeWrapper {
        range: TemperatureRange,
    }

    #[test]
    fn deserialize_range() {
        let parsed: RangeWrapper = toml::from_str("range = { min = 20, max = 40 }").unwrap();
        assert_eq!(parsed.range, TemperatureRange::new(20, 40).unwrap());
        let inverted: Result<RangeWrapper, _> = toml::from_str("range = { min = 40, max = 20 }");
        assert!(inverted.is_err());
    }
}
