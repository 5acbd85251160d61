//! Fixtures for tests

use crate::parameters::{ProjectParameters, RawParameters};
use rstest::fixture;
use serde_json::{Value, json};

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// Convert a JSON object literal into raw parameters.
///
/// Panics if `value` is not an object.
pub fn raw_from_json(value: Value) -> RawParameters {
    match value {
        Value::Object(map) => map,
        _ => panic!("Expected a JSON object"),
    }
}

/// A raw mapping containing only the required fields
#[fixture]
pub fn raw_parameters() -> RawParameters {
    raw_from_json(json!({
        "capex_usd": 1_000_000,
        "annual_generation_mwh": 2000,
        "project_lifetime_years": 25,
        "discount_rate": 0.08
    }))
}

/// A project with no discounting, degradation or running costs.
///
/// LCOE is simply capex / (generation × lifetime) = 50 USD/MWh.
#[fixture]
pub fn simple_parameters() -> ProjectParameters {
    ProjectParameters {
        capex_usd: 1_000_000.0,
        annual_generation_mwh: 2000.0,
        project_lifetime_years: 10,
        discount_rate: 0.0,
        annual_opex_usd: 0.0,
        annual_fuel_cost_usd: 0.0,
        opex_escalation_rate: 0.0,
        fuel_escalation_rate: 0.0,
        degradation_rate: 0.0,
        capacity_mw: None,
        technology: "test".into(),
    }
}

/// A 100 MW utility-scale solar PV project
#[fixture]
pub fn solar_parameters() -> ProjectParameters {
    ProjectParameters {
        capex_usd: 80_000_000.0,
        annual_generation_mwh: 200_000.0,
        project_lifetime_years: 25,
        discount_rate: 0.08,
        annual_opex_usd: 800_000.0,
        annual_fuel_cost_usd: 0.0,
        opex_escalation_rate: 0.02,
        fuel_escalation_rate: 0.02,
        degradation_rate: 0.005,
        capacity_mw: Some(100.0),
        technology: "solar_pv".into(),
    }
}

/// A raw project whose LCOE is exactly `lcoe` USD/MWh.
///
/// Generation is 1000 MWh/year for 10 years with no discounting, so capex = lcoe × 10,000.
pub fn raw_project_with_lcoe(source: &str, technology: &str, lcoe: f64) -> RawParameters {
    raw_from_json(json!({
        "_source": source,
        "capex_usd": lcoe * 10_000.0,
        "annual_generation_mwh": 1000,
        "project_lifetime_years": 10,
        "discount_rate": 0.0,
        "degradation_rate": 0.0,
        "technology": technology
    }))
}
