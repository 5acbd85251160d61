//! Validation of raw project parameters.
//!
//! Project parameters arrive as a string-keyed JSON object. [`validate_parameters`] checks the
//! object against a fixed sequence of constraints and returns either a fully-defaulted
//! [`ProjectParameters`] or the first [`ValidationError`] encountered. Errors are not accumulated:
//! callers get exactly one problem at a time.
use serde::Serialize;
use serde_json::{Map, Number, Value, json};
use std::error::Error;
use std::fmt;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// A raw, unvalidated mapping of parameter names to values
pub type RawParameters = Map<String, Value>;

/// The maximum permitted discount rate
pub const MAX_DISCOUNT_RATE: f64 = 0.30;
/// The maximum permitted escalation rate for operating and fuel costs
pub const MAX_ESCALATION_RATE: f64 = 0.20;
/// The maximum permitted annual degradation rate
pub const MAX_DEGRADATION_RATE: f64 = 0.10;
/// The shortest permitted project lifetime in years
pub const MIN_LIFETIME_YEARS: i64 = 1;
/// The longest permitted project lifetime in years
pub const MAX_LIFETIME_YEARS: i64 = 50;

/// Default annual escalation of operating costs
pub const DEFAULT_OPEX_ESCALATION_RATE: f64 = 0.02;
/// Default annual escalation of fuel costs
pub const DEFAULT_FUEL_ESCALATION_RATE: f64 = 0.02;
/// Default annual degradation of generation
pub const DEFAULT_DEGRADATION_RATE: f64 = 0.005;
/// Technology label used when none is given
pub const DEFAULT_TECHNOLOGY: &str = "generic";

/// The numeric project parameters, named as they appear in input files
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Parameter {
    /// Capital expenditure (USD)
    CapexUsd,
    /// Generation in the first year of operation (MWh)
    AnnualGenerationMwh,
    /// Project lifetime (years)
    ProjectLifetimeYears,
    /// Discount rate (fraction)
    DiscountRate,
    /// Annual operating cost in the first year (USD)
    AnnualOpexUsd,
    /// Annual fuel cost in the first year (USD)
    AnnualFuelCostUsd,
    /// Annual escalation of operating costs (fraction)
    OpexEscalationRate,
    /// Annual escalation of fuel costs (fraction)
    FuelEscalationRate,
    /// Annual degradation of generation (fraction)
    DegradationRate,
    /// Installed capacity (MW)
    CapacityMw,
}

impl Parameter {
    /// The key used for this parameter in raw parameter mappings
    pub fn key(self) -> &'static str {
        self.into()
    }

    /// The value of this parameter in a validated parameter set.
    ///
    /// An absent capacity is reported as zero.
    pub fn value_in(self, params: &ProjectParameters) -> f64 {
        match self {
            Self::CapexUsd => params.capex_usd,
            Self::AnnualGenerationMwh => params.annual_generation_mwh,
            Self::ProjectLifetimeYears => f64::from(params.project_lifetime_years),
            Self::DiscountRate => params.discount_rate,
            Self::AnnualOpexUsd => params.annual_opex_usd,
            Self::AnnualFuelCostUsd => params.annual_fuel_cost_usd,
            Self::OpexEscalationRate => params.opex_escalation_rate,
            Self::FuelEscalationRate => params.fuel_escalation_rate,
            Self::DegradationRate => params.degradation_rate,
            Self::CapacityMw => params.capacity_mw.unwrap_or(0.0),
        }
    }
}

/// A validated set of project parameters with all optional values defaulted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectParameters {
    /// Capital expenditure, incurred at year 0 (USD)
    pub capex_usd: f64,
    /// Generation in the first year of operation (MWh)
    pub annual_generation_mwh: f64,
    /// Project lifetime (years)
    pub project_lifetime_years: u32,
    /// Discount rate applied to costs and generation
    pub discount_rate: f64,
    /// Operating cost in the first year (USD)
    pub annual_opex_usd: f64,
    /// Fuel cost in the first year (USD)
    pub annual_fuel_cost_usd: f64,
    /// Annual escalation of operating costs
    pub opex_escalation_rate: f64,
    /// Annual escalation of fuel costs
    pub fuel_escalation_rate: f64,
    /// Annual degradation of generation
    pub degradation_rate: f64,
    /// Installed capacity (MW), if known
    pub capacity_mw: Option<f64>,
    /// Free-form technology label
    pub technology: String,
}

impl ProjectParameters {
    /// Convert back into a raw mapping which validates to an identical parameter set
    pub fn to_raw(&self) -> RawParameters {
        let mut raw = RawParameters::new();
        let mut insert = |parameter: Parameter, value: Value| {
            raw.insert(parameter.key().to_string(), value);
        };
        insert(Parameter::CapexUsd, json!(self.capex_usd));
        insert(Parameter::AnnualGenerationMwh, json!(self.annual_generation_mwh));
        insert(Parameter::ProjectLifetimeYears, json!(self.project_lifetime_years));
        insert(Parameter::DiscountRate, json!(self.discount_rate));
        insert(Parameter::AnnualOpexUsd, json!(self.annual_opex_usd));
        insert(Parameter::AnnualFuelCostUsd, json!(self.annual_fuel_cost_usd));
        insert(Parameter::OpexEscalationRate, json!(self.opex_escalation_rate));
        insert(Parameter::FuelEscalationRate, json!(self.fuel_escalation_rate));
        insert(Parameter::DegradationRate, json!(self.degradation_rate));
        insert(Parameter::CapacityMw, json!(self.capacity_mw));
        raw.insert(TECHNOLOGY_KEY.to_string(), json!(self.technology));

        raw
    }

    /// A raw copy of these parameters with one parameter replaced by `value`.
    ///
    /// The lifetime is truncated to a whole number of years. Returns `None` if `value` cannot be
    /// represented in a raw mapping (i.e. it is NaN or infinite).
    pub fn with_value(&self, parameter: Parameter, value: f64) -> Option<RawParameters> {
        let value = match parameter {
            Parameter::ProjectLifetimeYears if value.is_finite() => json!(value.trunc() as i64),
            _ => Value::Number(Number::from_f64(value)?),
        };

        let mut raw = self.to_raw();
        raw.insert(parameter.key().to_string(), value);
        Some(raw)
    }
}

/// The key for the technology label in raw mappings
const TECHNOLOGY_KEY: &str = "technology";

/// The reason a raw parameter mapping was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationErrorCode {
    /// One of the four required fields is absent
    MissingRequiredField,
    /// Capital expenditure is not a positive number
    InvalidCapex,
    /// Annual generation is not a positive number
    InvalidGeneration,
    /// Lifetime is not an integer in range
    InvalidLifetime,
    /// Discount rate is out of range
    InvalidDiscountRate,
    /// Operating cost is negative or not a number
    InvalidOpex,
    /// Fuel cost is negative or not a number
    InvalidFuelCost,
    /// Operating cost escalation is out of range
    InvalidOpexEscalation,
    /// Fuel cost escalation is out of range
    InvalidFuelEscalation,
    /// Degradation rate is out of range
    InvalidDegradation,
    /// Capacity is present but not a number
    InvalidCapacity,
    /// Technology label is present but not a string
    InvalidTechnology,
}

/// A structured description of why validation failed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    /// Machine-readable failure code
    pub code: ValidationErrorCode,
    /// Human-readable explanation
    pub message: String,
    /// The offending field
    pub field: &'static str,
    /// The value which was received (`null` if absent)
    pub received: Value,
    /// Description of the expected constraint
    pub expected: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} (field `{}`: received {}, expected {})",
            self.code, self.message, self.field, self.received, self.expected
        )
    }
}

impl Error for ValidationError {}

/// A range constraint on a numeric field
struct Constraint {
    parameter: Parameter,
    code: ValidationErrorCode,
    message: &'static str,
    expected: &'static str,
    /// Value to use if the field is absent (`None` for required fields)
    default: Option<f64>,
    is_valid: fn(f64) -> bool,
}

impl Constraint {
    /// Check the field in `raw`, returning its value or the default if absent
    fn check(&self, raw: &RawParameters) -> Result<f64, ValidationError> {
        let key = self.parameter.key();
        let Some(value) = raw.get(key) else {
            return self.default.ok_or_else(|| missing_field_error(self.parameter));
        };

        match value.as_f64() {
            Some(number) if (self.is_valid)(number) => Ok(number),
            _ => Err(ValidationError {
                code: self.code,
                message: self.message.to_string(),
                field: key,
                received: value.clone(),
                expected: self.expected.to_string(),
            }),
        }
    }
}

/// The required fields, in the order in which their presence is checked
const REQUIRED_FIELDS: [(Parameter, &str); 4] = [
    (Parameter::CapexUsd, "Capital expenditure in USD"),
    (Parameter::AnnualGenerationMwh, "Annual generation in MWh"),
    (Parameter::ProjectLifetimeYears, "Project lifetime in years"),
    (Parameter::DiscountRate, "Discount rate (decimal)"),
];

const CAPEX: Constraint = Constraint {
    parameter: Parameter::CapexUsd,
    code: ValidationErrorCode::InvalidCapex,
    message: "Capital expenditure must be a positive number",
    expected: "> 0",
    default: None,
    is_valid: |x| x > 0.0,
};

const GENERATION: Constraint = Constraint {
    parameter: Parameter::AnnualGenerationMwh,
    code: ValidationErrorCode::InvalidGeneration,
    message: "Annual generation must be a positive number",
    expected: "> 0",
    default: None,
    is_valid: |x| x > 0.0,
};

const DISCOUNT_RATE: Constraint = Constraint {
    parameter: Parameter::DiscountRate,
    code: ValidationErrorCode::InvalidDiscountRate,
    message: "Discount rate must be between 0 and 0.30 (0-30%)",
    expected: "0-0.30",
    default: None,
    is_valid: |x| (0.0..=MAX_DISCOUNT_RATE).contains(&x),
};

const OPEX: Constraint = Constraint {
    parameter: Parameter::AnnualOpexUsd,
    code: ValidationErrorCode::InvalidOpex,
    message: "Annual OPEX must be non-negative",
    expected: ">= 0",
    default: Some(0.0),
    is_valid: |x| x >= 0.0,
};

const FUEL_COST: Constraint = Constraint {
    parameter: Parameter::AnnualFuelCostUsd,
    code: ValidationErrorCode::InvalidFuelCost,
    message: "Annual fuel cost must be non-negative",
    expected: ">= 0",
    default: Some(0.0),
    is_valid: |x| x >= 0.0,
};

const OPEX_ESCALATION: Constraint = Constraint {
    parameter: Parameter::OpexEscalationRate,
    code: ValidationErrorCode::InvalidOpexEscalation,
    message: "OPEX escalation rate must be between 0 and 0.20",
    expected: "0-0.20",
    default: Some(DEFAULT_OPEX_ESCALATION_RATE),
    is_valid: |x| (0.0..=MAX_ESCALATION_RATE).contains(&x),
};

const FUEL_ESCALATION: Constraint = Constraint {
    parameter: Parameter::FuelEscalationRate,
    code: ValidationErrorCode::InvalidFuelEscalation,
    message: "Fuel escalation rate must be between 0 and 0.20",
    expected: "0-0.20",
    default: Some(DEFAULT_FUEL_ESCALATION_RATE),
    is_valid: |x| (0.0..=MAX_ESCALATION_RATE).contains(&x),
};

const DEGRADATION: Constraint = Constraint {
    parameter: Parameter::DegradationRate,
    code: ValidationErrorCode::InvalidDegradation,
    message: "Degradation rate must be between 0 and 0.10",
    expected: "0-0.10",
    default: Some(DEFAULT_DEGRADATION_RATE),
    is_valid: |x| (0.0..=MAX_DEGRADATION_RATE).contains(&x),
};

fn missing_field_error(parameter: Parameter) -> ValidationError {
    let description = REQUIRED_FIELDS
        .iter()
        .find(|(p, _)| *p == parameter)
        .map_or(parameter.key(), |(_, desc)| *desc);

    ValidationError {
        code: ValidationErrorCode::MissingRequiredField,
        message: format!("Missing required field: {description}"),
        field: parameter.key(),
        received: Value::Null,
        expected: format!("{} is required", parameter.key()),
    }
}

/// The lifetime must be a JSON integer (not merely a whole-valued float) within range
fn check_lifetime(raw: &RawParameters) -> Result<u32, ValidationError> {
    let key = Parameter::ProjectLifetimeYears.key();
    let value = raw.get(key).unwrap_or(&Value::Null);

    value
        .as_i64()
        .filter(|years| (MIN_LIFETIME_YEARS..=MAX_LIFETIME_YEARS).contains(years))
        .and_then(|years| u32::try_from(years).ok())
        .ok_or_else(|| ValidationError {
            code: ValidationErrorCode::InvalidLifetime,
            message: "Project lifetime must be between 1 and 50 years".to_string(),
            field: key,
            received: value.clone(),
            expected: "1-50".to_string(),
        })
}

/// Capacity is optional; `null` is treated the same as absent
fn check_capacity(raw: &RawParameters) -> Result<Option<f64>, ValidationError> {
    let key = Parameter::CapacityMw.key();
    match raw.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_f64().map(Some).ok_or_else(|| ValidationError {
            code: ValidationErrorCode::InvalidCapacity,
            message: "Capacity must be a number".to_string(),
            field: key,
            received: value.clone(),
            expected: "number or null".to_string(),
        }),
    }
}

fn check_technology(raw: &RawParameters) -> Result<String, ValidationError> {
    match raw.get(TECHNOLOGY_KEY) {
        None | Some(Value::Null) => Ok(DEFAULT_TECHNOLOGY.to_string()),
        Some(Value::String(technology)) => Ok(technology.clone()),
        Some(value) => Err(ValidationError {
            code: ValidationErrorCode::InvalidTechnology,
            message: "Technology must be a string".to_string(),
            field: TECHNOLOGY_KEY,
            received: value.clone(),
            expected: "string".to_string(),
        }),
    }
}

/// Validate a raw parameter mapping.
///
/// Required fields are checked for presence first, then each field is checked in declaration
/// order. Unknown keys are ignored.
///
/// # Returns
///
/// The validated parameters with defaults filled in, or the first violation encountered.
pub fn validate_parameters(raw: &RawParameters) -> Result<ProjectParameters, ValidationError> {
    for (parameter, _) in REQUIRED_FIELDS {
        if !raw.contains_key(parameter.key()) {
            return Err(missing_field_error(parameter));
        }
    }

    let capex_usd = CAPEX.check(raw)?;
    let annual_generation_mwh = GENERATION.check(raw)?;
    let project_lifetime_years = check_lifetime(raw)?;
    let discount_rate = DISCOUNT_RATE.check(raw)?;
    let annual_opex_usd = OPEX.check(raw)?;
    let annual_fuel_cost_usd = FUEL_COST.check(raw)?;
    let opex_escalation_rate = OPEX_ESCALATION.check(raw)?;
    let fuel_escalation_rate = FUEL_ESCALATION.check(raw)?;
    let degradation_rate = DEGRADATION.check(raw)?;
    let capacity_mw = check_capacity(raw)?;
    let technology = check_technology(raw)?;

    Ok(ProjectParameters {
        capex_usd,
        annual_generation_mwh,
        project_lifetime_years,
        discount_rate,
        annual_opex_usd,
        annual_fuel_cost_usd,
        opex_escalation_rate,
        fuel_escalation_rate,
        degradation_rate,
        capacity_mw,
        technology,
    })
}
