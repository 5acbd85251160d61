//! Sensitivity of LCOE to individual project parameters.
//!
//! A parameter is varied over a range of values while all other parameters are held at their base
//! values. The average elasticity (percentage change in LCOE per percentage change in the
//! parameter) summarises how strongly LCOE depends on that parameter.
use crate::finance::{calculate_lcoe, round_to};
use crate::parameters::{Parameter, ProjectParameters, validate_parameters};
use ::log::debug;
use indexmap::IndexMap;
use serde::Serialize;

pub mod range;
pub use range::{RangeSpec, generate_range};

/// Values within this distance of the base value are treated as the base case
const BASE_TOLERANCE: f64 = 1e-4;

/// How strongly LCOE responds to a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SensitivityImpact {
    /// |elasticity| < 0.1
    Negligible,
    /// 0.1 ≤ |elasticity| < 0.5
    Low,
    /// 0.5 ≤ |elasticity| < 1.0
    Moderate,
    /// |elasticity| ≥ 1.0
    High,
}

impl SensitivityImpact {
    /// Classify an elasticity by its magnitude
    pub fn from_elasticity(elasticity: f64) -> Self {
        match elasticity.abs() {
            e if e < 0.1 => Self::Negligible,
            e if e < 0.5 => Self::Low,
            e if e < 1.0 => Self::Moderate,
            _ => Self::High,
        }
    }

    /// A human-readable explanation
    pub fn interpretation(self) -> &'static str {
        match self {
            Self::Negligible => "Negligible impact - LCOE is insensitive to this parameter",
            Self::Low => "Low impact - modest changes in LCOE",
            Self::Moderate => "Moderate impact - significant influence on LCOE",
            Self::High => "High impact - critical parameter that strongly affects LCOE",
        }
    }
}

/// LCOE for a single value of the varied parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivityPoint {
    /// The parameter value
    pub value: f64,
    /// Change relative to the base value (%)
    pub value_pct_change: f64,
    /// LCOE at this value (USD/MWh)
    pub lcoe_usd_per_mwh: f64,
    /// Change relative to the base LCOE (%)
    pub lcoe_pct_change: f64,
    /// Whether this is (approximately) the base value
    pub is_base: bool,
}

/// The result of varying a single parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivityAnalysis {
    /// The parameter which was varied
    pub parameter: Parameter,
    /// The parameter's value in the base case
    pub base_value: f64,
    /// LCOE in the base case (USD/MWh)
    pub base_lcoe_usd_per_mwh: f64,
    /// Mean elasticity over the non-base points
    pub elasticity: f64,
    /// Explanation of the elasticity
    pub elasticity_interpretation: &'static str,
    /// Classification of the elasticity
    pub impact: SensitivityImpact,
    /// Number of values which produced a result
    pub values_tested: usize,
    /// Lowest LCOE seen (USD/MWh)
    pub min_lcoe: f64,
    /// Highest LCOE seen (USD/MWh)
    pub max_lcoe: f64,
    /// Difference between highest and lowest LCOE (USD/MWh)
    pub lcoe_range: f64,
    /// One entry per valid value, in the order tried
    pub results: Vec<SensitivityPoint>,
}

/// A parameter's place in the sensitivity ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterRank {
    /// The parameter
    pub parameter: Parameter,
    /// Magnitude of the elasticity
    pub elasticity: f64,
    /// LCOE range over the values tried (USD/MWh)
    pub lcoe_range: f64,
}

/// Headline figures for a full sensitivity analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivitySummary {
    /// Number of parameters analysed
    pub parameters_analyzed: usize,
    /// The parameter with the largest elasticity magnitude
    pub most_sensitive_parameter: Option<Parameter>,
    /// Parameters by descending elasticity magnitude
    pub parameter_ranking: Vec<ParameterRank>,
}

/// The result of varying each of the key parameters in turn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullSensitivityAnalysis {
    /// Headline figures
    pub summary: SensitivitySummary,
    /// The individual analyses, in the order they were run
    pub by_parameter: IndexMap<Parameter, SensitivityAnalysis>,
}

/// The result of a sensitivity analysis, tagged with its type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "analysis_type", content = "data", rename_all = "snake_case")]
pub enum SensitivityReport {
    /// A single parameter was varied
    SingleParameter(SensitivityAnalysis),
    /// Each key parameter was varied in turn
    Full(FullSensitivityAnalysis),
}

/// `(value - base) / base` as a percentage, or zero if `base` is not positive
fn pct_change(value: f64, base: f64) -> f64 {
    if base > 0.0 {
        (value - base) / base * 100.0
    } else {
        0.0
    }
}

/// Vary `parameter` over `values`, holding the other parameters at their base values.
///
/// Values which make the project invalid are skipped.
pub fn run_sensitivity(
    base: &ProjectParameters,
    parameter: Parameter,
    values: &[f64],
) -> SensitivityAnalysis {
    let base_lcoe = calculate_lcoe(base).lcoe_usd_per_mwh;
    let base_value = parameter.value_in(base);

    let mut results = Vec::with_capacity(values.len());
    for &value in values {
        let Some(params) = base
            .with_value(parameter, value)
            .and_then(|raw| validate_parameters(&raw).ok())
        else {
            debug!("Skipping invalid value {value} for {parameter}");
            continue;
        };

        let lcoe = calculate_lcoe(&params).lcoe_usd_per_mwh;
        results.push(SensitivityPoint {
            value,
            value_pct_change: round_to(pct_change(value, base_value), 2),
            lcoe_usd_per_mwh: lcoe,
            lcoe_pct_change: round_to(pct_change(lcoe, base_lcoe), 2),
            is_base: (value - base_value).abs() < BASE_TOLERANCE,
        });
    }

    let elasticities: Vec<f64> = results
        .iter()
        .filter(|point| !point.is_base && point.value_pct_change != 0.0)
        .map(|point| point.lcoe_pct_change / point.value_pct_change)
        .collect();
    let elasticity = if elasticities.is_empty() {
        0.0
    } else {
        elasticities.iter().sum::<f64>() / elasticities.len() as f64
    };
    let impact = SensitivityImpact::from_elasticity(elasticity);

    let (min_lcoe, max_lcoe) = if results.is_empty() {
        (0.0, 0.0)
    } else {
        results
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), point| {
                (
                    min.min(point.lcoe_usd_per_mwh),
                    max.max(point.lcoe_usd_per_mwh),
                )
            })
    };

    SensitivityAnalysis {
        parameter,
        base_value,
        base_lcoe_usd_per_mwh: base_lcoe,
        elasticity: round_to(elasticity, 3),
        elasticity_interpretation: impact.interpretation(),
        impact,
        values_tested: results.len(),
        min_lcoe,
        max_lcoe,
        lcoe_range: round_to(max_lcoe - min_lcoe, 2),
        results,
    }
}

/// The parameters included in a full sensitivity analysis of `base`.
///
/// Fuel parameters are only included for projects with fuel costs, and opex escalation only for
/// projects with operating costs.
pub fn key_parameters(base: &ProjectParameters) -> Vec<Parameter> {
    let mut parameters = vec![
        Parameter::CapexUsd,
        Parameter::AnnualOpexUsd,
        Parameter::AnnualGenerationMwh,
        Parameter::ProjectLifetimeYears,
        Parameter::DiscountRate,
        Parameter::DegradationRate,
    ];
    if base.annual_fuel_cost_usd > 0.0 {
        parameters.extend([Parameter::AnnualFuelCostUsd, Parameter::FuelEscalationRate]);
    }
    if base.annual_opex_usd > 0.0 {
        parameters.push(Parameter::OpexEscalationRate);
    }

    parameters
}

/// Run a sensitivity analysis over each key parameter using its default range
pub fn run_full_sensitivity(base: &ProjectParameters) -> FullSensitivityAnalysis {
    let by_parameter: IndexMap<_, _> = key_parameters(base)
        .into_iter()
        .map(|parameter| {
            let values = generate_range(parameter.value_in(base), parameter, None);
            (parameter, run_sensitivity(base, parameter, &values))
        })
        .collect();

    let mut parameter_ranking: Vec<_> = by_parameter
        .values()
        .map(|analysis| ParameterRank {
            parameter: analysis.parameter,
            elasticity: analysis.elasticity.abs(),
            lcoe_range: analysis.lcoe_range,
        })
        .collect();
    parameter_ranking.sort_by(|a, b| b.elasticity.total_cmp(&a.elasticity));

    FullSensitivityAnalysis {
        summary: SensitivitySummary {
            parameters_analyzed: by_parameter.len(),
            most_sensitive_parameter: parameter_ranking.first().map(|rank| rank.parameter),
            parameter_ranking,
        },
        by_parameter,
    }
}
