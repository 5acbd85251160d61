//! The LCOE engine: a year-by-year discounted cash-flow calculation.
//!
//! ```text
//! LCOE = NPV(costs) / NPV(generation)
//!
//! NPV(costs)      = capex + Σ (opex_t + fuel_t) / (1 + r)^t
//! NPV(generation) = Σ E_t / (1 + r)^t
//! ```
//!
//! Capital expenditure is incurred at year 0 and is not discounted.
use crate::parameters::ProjectParameters;
use serde::Serialize;

/// Hours in a (non-leap) year, used for capacity factors
pub const HOURS_PER_YEAR: f64 = 8760.0;

/// Round `value` to the given number of decimal places.
///
/// Values too large to scale are returned unchanged.
pub fn round_to(value: f64, decimal_places: i32) -> f64 {
    let factor = 10f64.powi(decimal_places);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }

    scaled.round() / factor
}

/// The divisor used to bring a value in `year` back to present terms
pub fn discount_factor(discount_rate: f64, year: u32) -> f64 {
    (1.0 + discount_rate).powi(year as i32)
}

/// A quantity compounded at `rate` per year, where year 1 takes the base value.
///
/// A negative rate gives decay (i.e. degradation).
fn compound(base: f64, rate: f64, year: u32) -> f64 {
    base * (1.0 + rate).powi(year as i32 - 1)
}

/// Capacity factor as a percentage, rounded to one decimal place.
///
/// Returns `None` if the capacity is absent or non-positive. A capacity factor that works out as
/// exactly zero is also reported as `None`.
pub fn capacity_factor(annual_generation_mwh: f64, capacity_mw: Option<f64>) -> Option<f64> {
    let capacity = capacity_mw.filter(|capacity| *capacity > 0.0)?;
    let factor = annual_generation_mwh / (capacity * HOURS_PER_YEAR) * 100.0;
    (factor != 0.0).then(|| round_to(factor, 1))
}

/// Costs and generation for a single project year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnualRecord {
    /// Project year, starting from 1
    pub year: u32,
    /// Generation after degradation (MWh)
    pub generation_mwh: f64,
    /// Operating cost after escalation (USD)
    pub opex_usd: f64,
    /// Fuel cost after escalation (USD)
    pub fuel_usd: f64,
    /// Operating plus fuel cost (USD)
    pub total_cost_usd: f64,
    /// Total cost in present terms (USD)
    pub discounted_cost_usd: f64,
    /// Generation in present terms (MWh)
    pub discounted_generation_mwh: f64,
    /// Running total of discounted costs, including capex (USD)
    pub cumulative_discounted_cost_usd: f64,
    /// Running total of discounted generation (MWh)
    pub cumulative_discounted_generation_mwh: f64,
}

/// The outcome of an LCOE calculation for one project
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LcoeResult {
    /// LCOE in USD/MWh
    pub lcoe_usd_per_mwh: f64,
    /// LCOE in USD/kWh
    pub lcoe_usd_per_kwh: f64,
    /// LCOE in US cents/kWh
    pub lcoe_cents_per_kwh: f64,
    /// Undiscounted capex plus all running costs (USD)
    pub total_lifecycle_cost_usd: f64,
    /// Undiscounted generation over the lifetime (MWh)
    pub total_lifetime_generation_mwh: f64,
    /// Present value of all costs (USD)
    pub npv_costs_usd: f64,
    /// Present value of all generation (MWh)
    pub npv_generation_mwh: f64,
    /// Capacity factor (%), if a capacity was given
    pub capacity_factor: Option<f64>,
    /// Year-by-year breakdown, ordered by year
    pub annual_breakdown: Vec<AnnualRecord>,
    /// The parameters used for the calculation
    pub inputs_summary: ProjectParameters,
}

/// Calculate the levelised cost of energy for a validated project.
///
/// This cannot fail. If the present value of generation is zero, the LCOE is reported as zero.
pub fn calculate_lcoe(params: &ProjectParameters) -> LcoeResult {
    let capex = params.capex_usd;
    let rate = params.discount_rate;

    let mut total_lifecycle_cost = capex;
    let mut total_generation = 0.0;
    let mut npv_costs = capex;
    let mut npv_generation = 0.0;

    let mut annual_breakdown = Vec::with_capacity(params.project_lifetime_years as usize);
    for year in 1..=params.project_lifetime_years {
        let generation = compound(
            params.annual_generation_mwh,
            -params.degradation_rate,
            year,
        );
        let opex = compound(params.annual_opex_usd, params.opex_escalation_rate, year);
        let fuel = compound(
            params.annual_fuel_cost_usd,
            params.fuel_escalation_rate,
            year,
        );
        let total_cost = opex + fuel;

        let factor = discount_factor(rate, year);
        let discounted_cost = total_cost / factor;
        let discounted_generation = generation / factor;

        total_lifecycle_cost += total_cost;
        total_generation += generation;
        npv_costs += discounted_cost;
        npv_generation += discounted_generation;

        annual_breakdown.push(AnnualRecord {
            year,
            generation_mwh: round_to(generation, 2),
            opex_usd: round_to(opex, 2),
            fuel_usd: round_to(fuel, 2),
            total_cost_usd: round_to(total_cost, 2),
            discounted_cost_usd: round_to(discounted_cost, 2),
            discounted_generation_mwh: round_to(discounted_generation, 2),
            // The running totals are the NPV accumulators at this point in time
            cumulative_discounted_cost_usd: round_to(npv_costs, 2),
            cumulative_discounted_generation_mwh: round_to(npv_generation, 2),
        });
    }

    let lcoe_per_mwh = if npv_generation > 0.0 {
        npv_costs / npv_generation
    } else {
        0.0
    };
    let lcoe_per_kwh = lcoe_per_mwh / 1000.0;

    LcoeResult {
        lcoe_usd_per_mwh: round_to(lcoe_per_mwh, 2),
        lcoe_usd_per_kwh: round_to(lcoe_per_kwh, 5),
        lcoe_cents_per_kwh: round_to(lcoe_per_kwh * 100.0, 2),
        total_lifecycle_cost_usd: round_to(total_lifecycle_cost, 2),
        total_lifetime_generation_mwh: round_to(total_generation, 2),
        npv_costs_usd: round_to(npv_costs, 2),
        npv_generation_mwh: round_to(npv_generation, 2),
        capacity_factor: capacity_factor(params.annual_generation_mwh, params.capacity_mw),
        annual_breakdown,
        inputs_summary: params.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{simple_parameters, solar_parameters};
    use float_cmp::approx_eq;
    use rstest::rstest;

    #[rstest]
    #[case(1.234_56, 2, 1.23)]
    #[case(1.235_01, 2, 1.24)]
    #[case(-2.5, 0, -3.0)]
    #[case(22.831, 1, 22.8)]
    #[case(0.000_123_456, 5, 0.000_12)]
    #[case(1e307, 2, 1e307)]
    #[case(f64::MAX, 6, f64::MAX)]
    fn round_to_works(#[case] value: f64, #[case] places: i32, #[case] expected: f64) {
        assert!(approx_eq!(f64, round_to(value, places), expected));
    }

    #[rstest]
    fn simple_lcoe(simple_parameters: ProjectParameters) {
        let result = calculate_lcoe(&simple_parameters);
        assert_eq!(result.lcoe_usd_per_mwh, 50.0);
        assert_eq!(result.lcoe_usd_per_kwh, 0.05);
        assert_eq!(result.lcoe_cents_per_kwh, 5.0);
        assert_eq!(result.total_lifecycle_cost_usd, 1_000_000.0);
        assert_eq!(result.total_lifetime_generation_mwh, 20_000.0);
        assert_eq!(result.npv_costs_usd, 1_000_000.0);
        assert_eq!(result.npv_generation_mwh, 20_000.0);
        assert_eq!(result.capacity_factor, None);
    }

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(0.08, 0.0)]
    #[case(0.08, 0.005)]
    #[case(0.3, 0.1)]
    fn unit_conversions_consistent(
        solar_parameters: ProjectParameters,
        #[case] discount_rate: f64,
        #[case] degradation_rate: f64,
    ) {
        let params = ProjectParameters {
            discount_rate,
            degradation_rate,
            ..solar_parameters
        };
        let result = calculate_lcoe(&params);
        assert!((result.lcoe_usd_per_kwh - result.lcoe_usd_per_mwh / 1000.0).abs() < 1e-5);
        assert!((result.lcoe_cents_per_kwh - result.lcoe_usd_per_kwh * 100.0).abs() < 1e-2);
    }

    #[rstest]
    fn huge_capex_stays_finite(mut simple_parameters: ProjectParameters) {
        simple_parameters.capex_usd = 1e307;
        let result = calculate_lcoe(&simple_parameters);
        assert_eq!(result.npv_costs_usd, 1e307);
        assert_eq!(result.total_lifecycle_cost_usd, 1e307);
        assert!(result.lcoe_usd_per_mwh.is_finite());
        assert!(
            serde_json::to_value(&result).unwrap()["npv_costs_usd"].is_number(),
            "Should not serialise as null"
        );
    }

    #[rstest]
    fn running_costs_increase_npv(simple_parameters: ProjectParameters) {
        let params = ProjectParameters {
            discount_rate: 0.08,
            annual_opex_usd: 20_000.0,
            opex_escalation_rate: 0.02,
            ..simple_parameters.clone()
        };
        let with_opex = calculate_lcoe(&params);
        let without_opex = calculate_lcoe(&ProjectParameters {
            annual_opex_usd: 0.0,
            ..params
        });
        assert!(with_opex.npv_costs_usd > 1_000_000.0);
        assert!(with_opex.lcoe_usd_per_mwh > without_opex.lcoe_usd_per_mwh);
    }

    #[rstest]
    fn higher_discount_rate_increases_lcoe(simple_parameters: ProjectParameters) {
        let low = ProjectParameters {
            discount_rate: 0.05,
            project_lifetime_years: 25,
            ..simple_parameters
        };
        let high = ProjectParameters {
            discount_rate: 0.15,
            ..low.clone()
        };
        assert!(calculate_lcoe(&high).lcoe_usd_per_mwh > calculate_lcoe(&low).lcoe_usd_per_mwh);
    }

    #[rstest]
    fn degradation_increases_lcoe(simple_parameters: ProjectParameters) {
        let base = ProjectParameters {
            discount_rate: 0.08,
            project_lifetime_years: 25,
            ..simple_parameters
        };
        let degraded = ProjectParameters {
            degradation_rate: 0.01,
            ..base.clone()
        };
        assert!(
            calculate_lcoe(&degraded).lcoe_usd_per_mwh > calculate_lcoe(&base).lcoe_usd_per_mwh
        );
    }

    #[rstest]
    fn annual_breakdown_covers_lifetime(solar_parameters: ProjectParameters) {
        let result = calculate_lcoe(&solar_parameters);
        let breakdown = &result.annual_breakdown;
        assert_eq!(breakdown.len(), 25);
        assert_eq!(breakdown.first().unwrap().year, 1);
        assert_eq!(breakdown.last().unwrap().year, 25);

        // Year 1 is neither degraded nor escalated
        assert_eq!(breakdown[0].generation_mwh, 200_000.0);
        assert_eq!(breakdown[0].opex_usd, 800_000.0);

        // Year 2 is degraded and escalated once
        assert_eq!(breakdown[1].generation_mwh, 199_000.0);
        assert_eq!(breakdown[1].opex_usd, 816_000.0);

        // Cumulative costs start from capex
        assert_eq!(
            breakdown[0].cumulative_discounted_cost_usd,
            round_to(80_000_000.0 + 800_000.0 / 1.08, 2)
        );
        assert_eq!(
            breakdown.last().unwrap().cumulative_discounted_cost_usd,
            result.npv_costs_usd
        );
    }

    #[rstest]
    fn capacity_factor_reported(solar_parameters: ProjectParameters) {
        let result = calculate_lcoe(&solar_parameters);

        // 200,000 MWh / (100 MW × 8760 h) ≈ 22.8%
        assert_eq!(result.capacity_factor, Some(22.8));
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some(0.0), None)]
    #[case(Some(-5.0), None)]
    #[case(Some(100.0), Some(22.8))]
    fn capacity_factor_works(#[case] capacity: Option<f64>, #[case] expected: Option<f64>) {
        assert_eq!(capacity_factor(200_000.0, capacity), expected);
    }

    #[rstest]
    fn calculation_is_deterministic(solar_parameters: ProjectParameters) {
        assert_eq!(
            calculate_lcoe(&solar_parameters),
            calculate_lcoe(&solar_parameters)
        );
    }

    #[test]
    fn discount_factor_works() {
        assert_eq!(discount_factor(0.0, 10), 1.0);
        assert!(approx_eq!(f64, discount_factor(0.1, 2), 1.21, ulps = 2));
    }
}
