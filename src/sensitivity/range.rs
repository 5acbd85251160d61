//! The values tried for a parameter in a sensitivity analysis.
use crate::finance::round_to;
use crate::parameters::Parameter;
use anyhow::{Context, Result, ensure};
use std::str::FromStr;

/// Tolerance used when deciding whether a stepped sequence has reached its upper bound
const STEP_TOLERANCE: f64 = 1e-4;

/// The most values a user-supplied stepped range may produce
pub const MAX_RANGE_POINTS: usize = 1000;

/// Multipliers applied to the base value for parameters without a default range
const FALLBACK_MULTIPLIERS: [f64; 7] = [0.7, 0.8, 0.9, 1.0, 1.1, 1.2, 1.3];

/// How a default range is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeKind {
    /// Bounds are fractions of the base value
    Multiplier,
    /// Bounds are the values themselves
    Absolute,
}

/// The built-in range of values to try for a parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefaultRange {
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
    /// Increment
    pub step: f64,
    /// Interpretation of the bounds
    pub kind: RangeKind,
}

impl DefaultRange {
    const fn multiplier(min: f64, max: f64, step: f64) -> Self {
        Self {
            min,
            max,
            step,
            kind: RangeKind::Multiplier,
        }
    }

    const fn absolute(min: f64, max: f64, step: f64) -> Self {
        Self {
            min,
            max,
            step,
            kind: RangeKind::Absolute,
        }
    }

    /// The values to try, given the parameter's base value
    pub fn values(&self, base_value: f64) -> Vec<f64> {
        match self.kind {
            // Three points either side of the base value
            RangeKind::Multiplier => [
                self.min,
                self.min + self.step,
                self.min + 2.0 * self.step,
                1.0,
                self.max - 2.0 * self.step,
                self.max - self.step,
                self.max,
            ]
            .into_iter()
            .map(|multiplier| round_to(base_value * multiplier, 2))
            .collect(),
            RangeKind::Absolute => stepped_values(self.min, self.max, self.step),
        }
    }
}

/// Default ranges for each parameter which has one
const DEFAULT_RANGES: [(Parameter, DefaultRange); 9] = [
    (Parameter::CapexUsd, DefaultRange::multiplier(0.7, 1.3, 0.1)),
    (Parameter::AnnualOpexUsd, DefaultRange::multiplier(0.7, 1.3, 0.1)),
    (Parameter::AnnualFuelCostUsd, DefaultRange::multiplier(0.7, 1.3, 0.1)),
    (Parameter::AnnualGenerationMwh, DefaultRange::multiplier(0.8, 1.2, 0.05)),
    (Parameter::ProjectLifetimeYears, DefaultRange::absolute(15.0, 35.0, 5.0)),
    (Parameter::DiscountRate, DefaultRange::absolute(0.04, 0.14, 0.02)),
    (Parameter::DegradationRate, DefaultRange::absolute(0.0, 0.02, 0.005)),
    (Parameter::OpexEscalationRate, DefaultRange::absolute(0.0, 0.05, 0.01)),
    (Parameter::FuelEscalationRate, DefaultRange::absolute(0.0, 0.05, 0.01)),
];

/// Get the default range for a parameter, if it has one
pub fn default_range(parameter: Parameter) -> Option<&'static DefaultRange> {
    DEFAULT_RANGES
        .iter()
        .find(|(p, _)| *p == parameter)
        .map(|(_, range)| range)
}

/// The number of values from `min` to `max` (inclusive, within a small tolerance) in increments
/// of `step`.
///
/// This is infinite if the sequence never reaches `max`.
fn stepped_count(min: f64, max: f64, step: f64) -> f64 {
    let steps = ((max - min + STEP_TOLERANCE) / step).floor();
    if steps < 0.0 { 0.0 } else { steps + 1.0 }
}

/// Values from `min` to `max` (inclusive, within a small tolerance) in increments of `step`.
///
/// Each value is rounded to 6 dp. `step` must be positive and the count must be finite.
fn stepped_values(min: f64, max: f64, step: f64) -> Vec<f64> {
    let count = stepped_count(min, max, step) as usize;
    (0..count)
        .map(|i| round_to(min + i as f64 * step, 6))
        .collect()
}

/// A user-supplied range of values
#[derive(Debug, Clone, PartialEq)]
pub enum RangeSpec {
    /// From `min` to `max` in increments of `step` (written `"min,max,step"`)
    Stepped {
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
        /// Increment (always positive)
        step: f64,
    },
    /// An explicit list of values (any number of comma-separated values other than three)
    Values(Vec<f64>),
}

impl RangeSpec {
    /// The values described by this range
    pub fn values(&self) -> Vec<f64> {
        match self {
            Self::Stepped { min, max, step } => stepped_values(*min, *max, *step),
            Self::Values(values) => values.clone(),
        }
    }
}

impl FromStr for RangeSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let values = s
            .split(',')
            .map(|part| {
                let part = part.trim();
                part.parse::<f64>()
                    .with_context(|| format!("Invalid number in range: '{part}'"))
            })
            .collect::<Result<Vec<_>>>()?;

        if let [min, max, step] = values[..] {
            for value in [min, max, step] {
                ensure!(value.is_finite(), "Range values must be finite, got {value}");
            }
            ensure!(step > 0.0, "Range step must be positive, got {step}");
            ensure!(
                min + step != min,
                "Range step {step} is too small for values starting at {min}"
            );
            let count = stepped_count(min, max, step);
            ensure!(
                count <= MAX_RANGE_POINTS as f64,
                "Range must give at most {MAX_RANGE_POINTS} values, got {count}"
            );
            Ok(Self::Stepped { min, max, step })
        } else {
            Ok(Self::Values(values))
        }
    }
}

/// Generate the values to try for `parameter`.
///
/// A custom range takes precedence. Otherwise the parameter's default range is used, falling
/// back to ±30% of the base value in 10% steps.
pub fn generate_range(
    base_value: f64,
    parameter: Parameter,
    custom_range: Option<&RangeSpec>,
) -> Vec<f64> {
    if let Some(range) = custom_range {
        return range.values();
    }

    match default_range(parameter) {
        Some(range) => range.values(base_value),
        None => FALLBACK_MULTIPLIERS
            .iter()
            .map(|multiplier| base_value * multiplier)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use float_cmp::approx_eq;
    use rstest::rstest;
    use strum::IntoEnumIterator;

    #[test]
    fn custom_stepped_range() {
        let range: RangeSpec = "0.04,0.14,0.02".parse().unwrap();
        assert_eq!(
            range,
            RangeSpec::Stepped {
                min: 0.04,
                max: 0.14,
                step: 0.02
            }
        );
        assert_eq!(range.values(), [0.04, 0.06, 0.08, 0.1, 0.12, 0.14]);
    }

    #[rstest]
    #[case("1,2", vec![1.0, 2.0])]
    #[case("0.05", vec![0.05])]
    #[case(" 10, 20 ,30,40", vec![10.0, 20.0, 30.0, 40.0])]
    fn custom_value_list(#[case] s: &str, #[case] expected: Vec<f64>) {
        let range: RangeSpec = s.parse().unwrap();
        assert_eq!(range, RangeSpec::Values(expected.clone()));
        assert_eq!(range.values(), expected);
    }

    #[test]
    fn custom_range_at_point_limit() {
        let range: RangeSpec = "1,1000,1".parse().unwrap();
        let values = range.values();
        assert_eq!(values.len(), MAX_RANGE_POINTS);
        assert_eq!(values.last(), Some(&1000.0));
    }

    #[test]
    fn custom_range_descending_is_empty() {
        let range: RangeSpec = "10,5,1".parse().unwrap();
        assert!(range.values().is_empty());
    }

    #[rstest]
    #[case("0.1,abc", "Invalid number in range: 'abc'")]
    #[case("", "Invalid number in range: ''")]
    #[case("1,2,0", "Range step must be positive, got 0")]
    #[case("1,2,-0.5", "Range step must be positive, got -0.5")]
    #[case("0,inf,1", "Range values must be finite, got inf")]
    #[case("nan,1,0.1", "Range values must be finite, got NaN")]
    #[case("0,1,inf", "Range values must be finite, got inf")]
    #[case("1e20,1e20,1", "Range step 1 is too small for values starting at 100000000000000000000")]
    #[case("0,1e9,1", "Range must give at most 1000 values, got 1000000001")]
    fn invalid_range(#[case] s: &str, #[case] msg: &str) {
        assert_error!(s.parse::<RangeSpec>(), msg);
    }

    #[rstest]
    #[case(Parameter::CapexUsd, 1_000_000.0, vec![700_000.0, 800_000.0, 900_000.0, 1_000_000.0, 1_100_000.0, 1_200_000.0, 1_300_000.0])]
    #[case(Parameter::AnnualGenerationMwh, 200_000.0, vec![160_000.0, 170_000.0, 180_000.0, 200_000.0, 220_000.0, 230_000.0, 240_000.0])]
    #[case(Parameter::ProjectLifetimeYears, 25.0, vec![15.0, 20.0, 25.0, 30.0, 35.0])]
    #[case(Parameter::DiscountRate, 0.08, vec![0.04, 0.06, 0.08, 0.1, 0.12, 0.14])]
    #[case(Parameter::DegradationRate, 0.005, vec![0.0, 0.005, 0.01, 0.015, 0.02])]
    #[case(Parameter::OpexEscalationRate, 0.02, vec![0.0, 0.01, 0.02, 0.03, 0.04, 0.05])]
    fn default_ranges(
        #[case] parameter: Parameter,
        #[case] base_value: f64,
        #[case] expected: Vec<f64>,
    ) {
        assert_eq!(generate_range(base_value, parameter, None), expected);
    }

    #[test]
    fn fallback_range_is_unrounded() {
        let values = generate_range(100.0, Parameter::CapacityMw, None);
        assert_eq!(values.len(), 7);
        assert!(approx_eq!(f64, values[4], 110.0, ulps = 4));
        assert_eq!(values[3], 100.0);
    }

    #[test]
    fn custom_range_overrides_default() {
        let range = RangeSpec::Values(vec![0.1]);
        assert_eq!(
            generate_range(0.08, Parameter::DiscountRate, Some(&range)),
            [0.1]
        );
    }

    #[test]
    fn only_capacity_lacks_default_range() {
        let without_default: Vec<_> = Parameter::iter()
            .filter(|p| default_range(*p).is_none())
            .collect();
        assert_eq!(without_default, [Parameter::CapacityMw]);
    }
}
