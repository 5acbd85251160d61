//! Comparison and ranking of several projects by LCOE.
//!
//! Each project is validated and calculated independently. Projects which fail validation are
//! retained in the output rather than aborting the comparison, so long as at least one project
//! succeeds.
use crate::finance::{calculate_lcoe, round_to};
use crate::output::ErrorDetail;
use crate::parameters::{RawParameters, ValidationError, validate_parameters};
use ::log::{debug, warn};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt;

pub mod recommendations;
use recommendations::{Recommendation, generate_recommendations};

/// The key under which a project's source label is carried in its raw mapping
pub const SOURCE_KEY: &str = "_source";

/// The label used for projects with no source or technology information
const UNKNOWN: &str = "unknown";

/// The key-metrics of a successfully calculated project
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectSummary {
    /// Where the project came from (e.g. a file path)
    pub source: String,
    /// Technology label
    pub technology: String,
    /// Installed capacity (MW)
    pub capacity_mw: Option<f64>,
    /// LCOE in USD/MWh
    pub lcoe_usd_per_mwh: f64,
    /// LCOE in USD/kWh
    pub lcoe_usd_per_kwh: f64,
    /// LCOE in US cents/kWh
    pub lcoe_cents_per_kwh: f64,
    /// Capital expenditure (USD)
    pub capex_usd: f64,
    /// Capital expenditure per MW of capacity (USD/MW)
    pub capex_per_mw: Option<f64>,
    /// Project lifetime (years)
    pub project_lifetime_years: u32,
    /// Undiscounted lifecycle cost (USD)
    pub total_lifecycle_cost_usd: f64,
    /// Undiscounted lifetime generation (MWh)
    pub total_lifetime_generation_mwh: f64,
    /// Present value of costs (USD)
    pub npv_costs_usd: f64,
    /// Capacity factor (%)
    pub capacity_factor: Option<f64>,
    /// Discount rate
    pub discount_rate: f64,
}

/// A project which could not be analysed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedProject {
    /// Where the project came from
    pub source: String,
    /// Always `false`
    pub success: bool,
    /// Why validation failed
    pub error: ValidationError,
    /// Technology label from the raw input, if there was one
    pub technology: String,
}

/// A successful project with its position in the ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedProject {
    /// Position in the ranking, where 1 is the cheapest
    pub rank: usize,
    /// The project's metrics
    #[serde(flatten)]
    pub project: ProjectSummary,
    /// Percentage by which LCOE exceeds the best project's
    pub lcoe_vs_best_pct: f64,
    /// Percentage by which LCOE differs from the average
    pub lcoe_vs_avg_pct: f64,
}

/// LCOE statistics for all projects sharing a technology
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnologySummary {
    /// Number of projects with this technology
    pub count: usize,
    /// Mean LCOE (USD/MWh)
    pub avg_lcoe_usd_per_mwh: f64,
    /// Lowest LCOE (USD/MWh)
    pub min_lcoe_usd_per_mwh: f64,
    /// Highest LCOE (USD/MWh)
    pub max_lcoe_usd_per_mwh: f64,
    /// Source of the cheapest project
    pub best_project: String,
}

/// The cheapest project overall
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestProject {
    /// Where the project came from
    pub source: String,
    /// Technology label
    pub technology: String,
    /// LCOE in USD/MWh
    pub lcoe_usd_per_mwh: f64,
}

/// LCOE statistics across all successful projects
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LcoeStatistics {
    /// Mean LCOE (USD/MWh)
    pub avg_lcoe_usd_per_mwh: f64,
    /// Lowest LCOE (USD/MWh)
    pub min_lcoe_usd_per_mwh: f64,
    /// Highest LCOE (USD/MWh)
    pub max_lcoe_usd_per_mwh: f64,
    /// Difference between highest and lowest LCOE (USD/MWh)
    pub lcoe_spread_usd_per_mwh: f64,
    /// Spread as a percentage of the lowest LCOE
    pub lcoe_spread_pct: f64,
}

/// Headline figures for a comparison
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonSummary {
    /// Number of projects supplied
    pub total_projects: usize,
    /// Number of projects which passed validation
    pub analyzed_successfully: usize,
    /// Number of projects which failed validation
    pub failed_to_analyze: usize,
    /// The cheapest project
    pub best_project: BestProject,
    /// LCOE statistics
    pub statistics: LcoeStatistics,
}

/// The result of comparing a set of projects
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    /// Headline figures
    pub summary: ComparisonSummary,
    /// Statistics per technology, in order of first appearance
    pub by_technology: IndexMap<String, TechnologySummary>,
    /// Successful projects, cheapest first
    pub rankings: Vec<RankedProject>,
    /// Suggested actions
    pub recommendations: Vec<Recommendation>,
    /// Projects which failed validation (`None` if there were none)
    pub failed_projects: Option<Vec<FailedProject>>,
}

/// Returned when none of the projects could be analysed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonFailure {
    /// What went wrong
    pub error: ErrorDetail,
    /// Every project, with the reason it failed
    pub failed_projects: Vec<FailedProject>,
}

impl ComparisonFailure {
    fn new(failed_projects: Vec<FailedProject>) -> Self {
        Self {
            error: ErrorDetail::new(
                "NO_VALID_PROJECTS",
                "No projects could be analyzed successfully",
            ),
            failed_projects,
        }
    }
}

impl fmt::Display for ComparisonFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl Error for ComparisonFailure {}

/// Validate and calculate a single labelled project
fn analyse_project(mut raw: RawParameters) -> Result<ProjectSummary, FailedProject> {
    let source = match raw.remove(SOURCE_KEY) {
        Some(Value::String(source)) => source,
        Some(other) => other.to_string(),
        None => UNKNOWN.to_string(),
    };

    let params = match validate_parameters(&raw) {
        Ok(params) => params,
        Err(error) => {
            let technology = raw
                .get("technology")
                .and_then(Value::as_str)
                .unwrap_or(UNKNOWN)
                .to_string();
            return Err(FailedProject {
                source,
                success: false,
                error,
                technology,
            });
        }
    };

    let result = calculate_lcoe(&params);
    debug!(
        "Project '{source}' has LCOE {} USD/MWh",
        result.lcoe_usd_per_mwh
    );

    Ok(ProjectSummary {
        source,
        capacity_mw: params.capacity_mw,
        lcoe_usd_per_mwh: result.lcoe_usd_per_mwh,
        lcoe_usd_per_kwh: result.lcoe_usd_per_kwh,
        lcoe_cents_per_kwh: result.lcoe_cents_per_kwh,
        capex_usd: params.capex_usd,
        capex_per_mw: params
            .capacity_mw
            .filter(|capacity| *capacity != 0.0)
            .map(|capacity| params.capex_usd / capacity),
        project_lifetime_years: params.project_lifetime_years,
        total_lifecycle_cost_usd: result.total_lifecycle_cost_usd,
        total_lifetime_generation_mwh: result.total_lifetime_generation_mwh,
        npv_costs_usd: result.npv_costs_usd,
        capacity_factor: result.capacity_factor,
        discount_rate: params.discount_rate,
        technology: params.technology,
    })
}

/// `(value - reference) / reference` as a percentage to 1 dp, or zero if `reference` is not
/// positive
fn pct_difference(value: f64, reference: f64) -> f64 {
    if reference > 0.0 {
        round_to((value - reference) / reference * 100.0, 1)
    } else {
        0.0
    }
}

/// Group projects by technology, preserving the order in which technologies first appear
fn summarise_by_technology(projects: &[ProjectSummary]) -> IndexMap<String, TechnologySummary> {
    let mut groups: IndexMap<&str, Vec<&ProjectSummary>> = IndexMap::new();
    for project in projects {
        groups
            .entry(project.technology.as_str())
            .or_default()
            .push(project);
    }

    groups
        .into_iter()
        .map(|(technology, members)| {
            let lcoes: Vec<f64> = members.iter().map(|p| p.lcoe_usd_per_mwh).collect();
            let (min_lcoe, max_lcoe) = bounds(&lcoes);
            let best = members
                .iter()
                .min_by(|a, b| a.lcoe_usd_per_mwh.total_cmp(&b.lcoe_usd_per_mwh))
                .expect("Groups are never empty");
            let summary = TechnologySummary {
                count: members.len(),
                avg_lcoe_usd_per_mwh: round_to(mean(&lcoes), 2),
                min_lcoe_usd_per_mwh: round_to(min_lcoe, 2),
                max_lcoe_usd_per_mwh: round_to(max_lcoe, 2),
                best_project: best.source.clone(),
            };
            (technology.to_string(), summary)
        })
        .collect()
}

/// The arithmetic mean of a non-empty slice
fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// The smallest and largest values in a non-empty slice
fn bounds(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &value| {
            (min.min(value), max.max(value))
        })
}

/// Compare a set of raw projects.
///
/// Each project may carry a source label under [`SOURCE_KEY`]. Projects are ranked by ascending
/// LCOE, with ties kept in input order.
///
/// # Returns
///
/// The comparison, or a [`ComparisonFailure`] listing every project if none could be analysed.
pub fn compare_projects(projects: &[RawParameters]) -> Result<Comparison, ComparisonFailure> {
    let mut successful = Vec::new();
    let mut failed = Vec::new();
    for raw in projects {
        match analyse_project(raw.clone()) {
            Ok(summary) => successful.push(summary),
            Err(failure) => {
                warn!(
                    "Could not analyse project '{}': {}",
                    failure.source, failure.error
                );
                failed.push(failure);
            }
        }
    }

    if successful.is_empty() {
        return Err(ComparisonFailure::new(failed));
    }

    let lcoes: Vec<f64> = successful.iter().map(|p| p.lcoe_usd_per_mwh).collect();
    let avg_lcoe = mean(&lcoes);
    let (min_lcoe, max_lcoe) = bounds(&lcoes);

    let by_technology = summarise_by_technology(&successful);

    let mut sorted = successful.clone();
    sorted.sort_by(|a, b| a.lcoe_usd_per_mwh.total_cmp(&b.lcoe_usd_per_mwh));
    let best_lcoe = sorted[0].lcoe_usd_per_mwh;
    let rankings: Vec<_> = sorted
        .into_iter()
        .enumerate()
        .map(|(i, project)| RankedProject {
            rank: i + 1,
            lcoe_vs_best_pct: pct_difference(project.lcoe_usd_per_mwh, best_lcoe),
            lcoe_vs_avg_pct: pct_difference(project.lcoe_usd_per_mwh, avg_lcoe),
            project,
        })
        .collect();

    let recommendations = generate_recommendations(&rankings, &by_technology);

    let best = &rankings[0].project;
    let spread = max_lcoe - min_lcoe;
    let summary = ComparisonSummary {
        total_projects: projects.len(),
        analyzed_successfully: successful.len(),
        failed_to_analyze: failed.len(),
        best_project: BestProject {
            source: best.source.clone(),
            technology: best.technology.clone(),
            lcoe_usd_per_mwh: best.lcoe_usd_per_mwh,
        },
        statistics: LcoeStatistics {
            avg_lcoe_usd_per_mwh: round_to(avg_lcoe, 2),
            min_lcoe_usd_per_mwh: round_to(min_lcoe, 2),
            max_lcoe_usd_per_mwh: round_to(max_lcoe, 2),
            lcoe_spread_usd_per_mwh: round_to(spread, 2),
            lcoe_spread_pct: if min_lcoe > 0.0 {
                round_to(spread / min_lcoe * 100.0, 1)
            } else {
                0.0
            },
        },
    };

    Ok(Comparison {
        summary,
        by_technology,
        rankings,
        recommendations,
        failed_projects: (!failed.is_empty()).then_some(failed),
    })
}
