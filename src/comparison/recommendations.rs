//! Investment recommendations derived from a ranked comparison.
use super::{RankedProject, TechnologySummary};
use crate::finance::round_to;
use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;

/// A technology group is flagged if its mean LCOE exceeds the cheapest group's by this factor
const PORTFOLIO_GAP_THRESHOLD: f64 = 1.2;

/// A project is an outlier if its LCOE exceeds the mean by this factor
const OUTLIER_THRESHOLD: f64 = 1.3;

/// How urgently a recommendation should be acted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    /// Act first
    High,
    /// Worth considering
    Medium,
}

/// The kind of action a recommendation suggests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationType {
    /// Invest in the cheapest project
    Investment,
    /// Rebalance the technology mix
    Portfolio,
    /// Look again at expensive projects
    Review,
}

/// The quantified effect of following a recommendation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Impact {
    /// Advantage of the best project over the worst
    Investment {
        /// e.g. "$30.0/MWh"
        lcoe_advantage_vs_worst: String,
        /// e.g. "42.9%"
        percentage_better: String,
    },
    /// Savings from shifting away from the most expensive technology
    Portfolio {
        /// e.g. "Up to $30.0/MWh by shifting allocation"
        potential_savings: String,
    },
}

/// A suggested action
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    /// How urgent the recommendation is
    pub priority: Priority,
    /// What kind of action is suggested
    #[serde(rename = "type")]
    pub kind: RecommendationType,
    /// Short summary
    pub title: String,
    /// Full explanation
    pub description: String,
    /// Quantified effect, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<Impact>,
    /// Sources of the projects concerned, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<String>>,
}

/// Format a number for display, always including a decimal point (e.g. "30.0", "12.35")
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// Recommend the cheapest project, quantifying its advantage over the most expensive
fn investment_recommendation(best: &RankedProject, worst: &RankedProject) -> Recommendation {
    let best_lcoe = best.project.lcoe_usd_per_mwh;
    let worst_lcoe = worst.project.lcoe_usd_per_mwh;
    let advantage = worst_lcoe - best_lcoe;
    let percentage_better = if worst_lcoe > 0.0 {
        round_to(advantage / worst_lcoe * 100.0, 1)
    } else {
        0.0
    };

    Recommendation {
        priority: Priority::High,
        kind: RecommendationType::Investment,
        title: format!("Prioritize {} project", best.project.technology),
        description: format!(
            "'{}' has the lowest LCOE at ${}/MWh. This represents the most cost-effective option \
             among analyzed projects.",
            best.project.source,
            format_number(best_lcoe)
        ),
        impact: Some(Impact::Investment {
            lcoe_advantage_vs_worst: format!("${}/MWh", format_number(round_to(advantage, 2))),
            percentage_better: format!("{}%", format_number(percentage_better)),
        }),
        projects: None,
    }
}

/// Flag the most expensive technology if it is much dearer than the cheapest
fn portfolio_recommendation(
    by_technology: &IndexMap<String, TechnologySummary>,
) -> Option<Recommendation> {
    if by_technology.len() < 2 {
        return None;
    }

    let sorted = by_technology
        .iter()
        .map(|(technology, summary)| (technology, summary.avg_lcoe_usd_per_mwh))
        .sorted_by(|a, b| a.1.total_cmp(&b.1))
        .collect_vec();
    let (best_technology, best_lcoe) = *sorted.first()?;
    let (worst_technology, worst_lcoe) = *sorted.last()?;
    if worst_lcoe <= best_lcoe * PORTFOLIO_GAP_THRESHOLD {
        return None;
    }

    let gap = worst_lcoe - best_lcoe;
    let gap_pct = if best_lcoe > 0.0 {
        round_to(gap / best_lcoe * 100.0, 1)
    } else {
        0.0
    };

    Some(Recommendation {
        priority: Priority::Medium,
        kind: RecommendationType::Portfolio,
        title: format!("Review {worst_technology} allocation"),
        description: format!(
            "{worst_technology} projects average ${}/MWh, which is {}% higher than \
             {best_technology}. Consider rebalancing portfolio mix.",
            format_number(round_to(worst_lcoe, 2)),
            format_number(gap_pct)
        ),
        impact: Some(Impact::Portfolio {
            potential_savings: format!(
                "Up to ${}/MWh by shifting allocation",
                format_number(round_to(gap, 2))
            ),
        }),
        projects: None,
    })
}

/// List projects whose LCOE is far above the mean
fn outlier_recommendation(ranked: &[RankedProject]) -> Option<Recommendation> {
    let avg_lcoe = ranked
        .iter()
        .map(|p| p.project.lcoe_usd_per_mwh)
        .sum::<f64>()
        / ranked.len() as f64;
    let outliers = ranked
        .iter()
        .filter(|p| p.project.lcoe_usd_per_mwh > avg_lcoe * OUTLIER_THRESHOLD)
        .map(|p| p.project.source.clone())
        .collect_vec();
    if outliers.is_empty() {
        return None;
    }

    Some(Recommendation {
        priority: Priority::Medium,
        kind: RecommendationType::Review,
        title: format!("Investigate high-cost outliers ({} projects)", outliers.len()),
        description: format!(
            "The following projects are >30% above average LCOE and may warrant renegotiation \
             or divestiture: {}",
            outliers.join(", ")
        ),
        impact: None,
        projects: Some(outliers),
    })
}

/// Generate recommendations for projects ranked cheapest first.
///
/// An investment recommendation is always given (unless `ranked` is empty). Portfolio and
/// outlier recommendations are only given where relevant.
pub fn generate_recommendations(
    ranked: &[RankedProject],
    by_technology: &IndexMap<String, TechnologySummary>,
) -> Vec<Recommendation> {
    let (Some(best), Some(worst)) = (ranked.first(), ranked.last()) else {
        return Vec::new();
    };

    let mut recommendations = vec![investment_recommendation(best, worst)];
    recommendations.extend(portfolio_recommendation(by_technology));
    recommendations.extend(outlier_recommendation(ranked));

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::compare_projects;
    use crate::fixture::raw_project_with_lcoe;
    use rstest::rstest;
    use serde_json::json;

    fn recommendations_for(projects: &[(&str, &str, f64)]) -> Vec<Recommendation> {
        let raw = projects
            .iter()
            .map(|(source, technology, lcoe)| raw_project_with_lcoe(source, technology, *lcoe))
            .collect_vec();
        compare_projects(&raw).unwrap().recommendations
    }

    #[rstest]
    #[case(30.0, "30.0")]
    #[case(12.35, "12.35")]
    #[case(-4.0, "-4.0")]
    #[case(42.9, "42.9")]
    fn format_number_works(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(format_number(value), expected);
    }

    #[test]
    fn investment_always_recommended() {
        let recommendations = recommendations_for(&[
            ("solar.json", "solar", 40.0),
            ("wind.json", "wind", 55.0),
            ("gas.json", "gas", 70.0),
        ]);
        let investment = &recommendations[0];
        assert_eq!(investment.priority, Priority::High);
        assert_eq!(investment.kind, RecommendationType::Investment);
        assert_eq!(investment.title, "Prioritize solar project");
        assert_eq!(
            investment.description,
            "'solar.json' has the lowest LCOE at $40.0/MWh. This represents the most \
             cost-effective option among analyzed projects."
        );
        assert_eq!(
            investment.impact,
            Some(Impact::Investment {
                lcoe_advantage_vs_worst: "$30.0/MWh".into(),
                percentage_better: "42.9%".into(),
            })
        );
    }

    #[test]
    fn portfolio_recommended_for_large_technology_gap() {
        let recommendations = recommendations_for(&[
            ("solar.json", "solar", 40.0),
            ("wind.json", "wind", 55.0),
            ("gas.json", "gas", 70.0),
        ]);

        // 70 is less than 130% of the mean (71.5), so there are no outliers
        assert_eq!(recommendations.len(), 2);
        let portfolio = &recommendations[1];
        assert_eq!(portfolio.kind, RecommendationType::Portfolio);
        assert_eq!(portfolio.priority, Priority::Medium);
        assert_eq!(portfolio.title, "Review gas allocation");
        assert_eq!(
            portfolio.description,
            "gas projects average $70.0/MWh, which is 75.0% higher than solar. Consider \
             rebalancing portfolio mix."
        );
        assert_eq!(
            portfolio.impact,
            Some(Impact::Portfolio {
                potential_savings: "Up to $30.0/MWh by shifting allocation".into()
            })
        );
    }

    #[rstest]
    #[case(&[("a", "solar", 40.0), ("b", "wind", 47.0)])]
    #[case(&[("a", "solar", 40.0), ("b", "solar", 90.0)])]
    fn portfolio_not_recommended(#[case] projects: &[(&str, &str, f64)]) {
        assert!(
            recommendations_for(projects)
                .iter()
                .all(|r| r.kind != RecommendationType::Portfolio)
        );
    }

    #[test]
    fn outliers_recommended_for_review() {
        let recommendations = recommendations_for(&[
            ("a", "wind", 40.0),
            ("b", "wind", 40.0),
            ("c", "wind", 40.0),
            ("d", "wind", 100.0),
        ]);

        // Mean is 55, so the threshold is 71.5
        let review = recommendations.last().unwrap();
        assert_eq!(review.kind, RecommendationType::Review);
        assert_eq!(review.title, "Investigate high-cost outliers (1 projects)");
        assert_eq!(review.projects, Some(vec!["d".to_string()]));
        assert!(review.description.ends_with("divestiture: d"));
    }

    #[test]
    fn recommendation_serialisation() {
        let recommendations = recommendations_for(&[("a", "wind", 40.0)]);
        let value = serde_json::to_value(&recommendations[0]).unwrap();
        assert_eq!(value["type"], json!("INVESTMENT"));
        assert_eq!(value["priority"], json!("HIGH"));
        assert_eq!(value["impact"]["lcoe_advantage_vs_worst"], json!("$0.0/MWh"));
        assert!(value.get("projects").is_none());
    }

    #[test]
    fn no_recommendations_without_projects() {
        assert!(generate_recommendations(&[], &IndexMap::new()).is_empty());
    }
}
