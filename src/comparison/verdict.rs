// Aggregate verdict and derived insights
//
// The verdict counts which group is better on each metric (using the metric's
// direction) and recommends the group that wins strictly more metrics. It is
// descriptive aggregation only: no combined test is run, and the caveat always
// says how many of the winning metrics were individually significant.

use crate::comparison::report::MetricResult;
use crate::metric::MetricSpec;
use crate::sample::{Group, GroupLabels};
use serde::{Deserialize, Serialize};

/// Win margin (in metrics) for a recommendation to count as consistent
pub const CONSISTENT_MARGIN: usize = 2;

/// Per-group metric win counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinTally {
    pub wins_a: usize,
    pub wins_b: usize,
    /// Metrics with equal means/rates
    pub ties: usize,
    pub significant_wins_a: usize,
    pub significant_wins_b: usize,
}

impl WinTally {
    pub fn from_results(results: &[MetricResult]) -> Self {
        let mut tally = WinTally::default();
        for result in results {
            match (result.better_group, result.significant) {
                (Some(Group::A), significant) => {
                    tally.wins_a += 1;
                    tally.significant_wins_a += usize::from(significant);
                }
                (Some(Group::B), significant) => {
                    tally.wins_b += 1;
                    tally.significant_wins_b += usize::from(significant);
                }
                (None, _) => tally.ties += 1,
            }
        }
        tally
    }

    pub fn total(&self) -> usize {
        self.wins_a + self.wins_b + self.ties
    }

    pub fn wins(&self, group: Group) -> usize {
        match group {
            Group::A => self.wins_a,
            Group::B => self.wins_b,
        }
    }

    pub fn significant_wins(&self, group: Group) -> usize {
        match group {
            Group::A => self.significant_wins_a,
            Group::B => self.significant_wins_b,
        }
    }

    pub fn margin(&self) -> usize {
        self.wins_a.abs_diff(self.wins_b)
    }

    /// Group with strictly more wins
    pub fn leader(&self) -> Option<Group> {
        match self.wins_a.cmp(&self.wins_b) {
            std::cmp::Ordering::Greater => Some(Group::A),
            std::cmp::Ordering::Less => Some(Group::B),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// Which group, if any, the report recommends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AggregateVerdict {
    Recommended {
        group: Group,
        label: String,
        tally: WinTally,
        caveat: String,
    },
    NoConsistentWinner {
        tally: WinTally,
        caveat: String,
    },
}

impl AggregateVerdict {
    pub fn recommended_group(&self) -> Option<Group> {
        match self {
            AggregateVerdict::Recommended { group, .. } => Some(*group),
            AggregateVerdict::NoConsistentWinner { .. } => None,
        }
    }

    pub fn tally(&self) -> &WinTally {
        match self {
            AggregateVerdict::Recommended { tally, .. } => tally,
            AggregateVerdict::NoConsistentWinner { tally, .. } => tally,
        }
    }

    pub fn caveat(&self) -> &str {
        match self {
            AggregateVerdict::Recommended { caveat, .. } => caveat,
            AggregateVerdict::NoConsistentWinner { caveat, .. } => caveat,
        }
    }

    /// One-line description ("Group A recommended: better on 2 of 3 metrics")
    pub fn summary(&self) -> String {
        match self {
            AggregateVerdict::Recommended {
                group,
                label,
                tally,
                ..
            } => format!(
                "Group {} recommended: better on {} of {} metrics",
                label,
                tally.wins(*group),
                tally.total()
            ),
            AggregateVerdict::NoConsistentWinner { .. } => "No consistent winner".to_string(),
        }
    }
}

/// Count metric wins and phrase the aggregate verdict
pub fn aggregate_verdict(results: &[MetricResult], labels: &GroupLabels) -> AggregateVerdict {
    let tally = WinTally::from_results(results);

    let Some(group) = tally.leader() else {
        return AggregateVerdict::NoConsistentWinner {
            caveat: format!(
                "No consistent winner: Group {} was better on {} and Group {} on {} of {} metrics",
                labels.a,
                tally.wins_a,
                labels.b,
                tally.wins_b,
                tally.total()
            ),
            tally,
        };
    };

    let label = labels.label(group).to_string();
    let wins = tally.wins(group);
    let significant = tally.significant_wins(group);
    let caveat = if significant == 0 {
        format!(
            "Descriptive count only: none of the {} metrics favoring Group {} shows a \
             statistically significant difference (p < 0.05), and the count is not a \
             combined significance test",
            wins, label
        )
    } else {
        format!(
            "Descriptive count only: {} of the {} metrics favoring Group {} are individually \
             statistically significant (p < 0.05); the count is not a combined significance test",
            significant, wins, label
        )
    };

    AggregateVerdict::Recommended {
        group,
        label,
        tally,
        caveat,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationStrength {
    /// One group leads by at least `CONSISTENT_MARGIN` metrics
    Consistent,
    Mixed,
}

/// Better group for a single metric
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricLeader {
    pub metric: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<Group>,
    pub significant: bool,
}

/// Natural-language-ready findings derived from the metric results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insights {
    pub significant_findings: Vec<String>,
    pub strength: RecommendationStrength,
    pub leaders: Vec<MetricLeader>,
    pub recommendations: Vec<String>,
    pub caveats: Vec<String>,
}

const STANDARD_CAVEATS: [&str; 5] = [
    "The analysis assumes random assignment of patients to groups",
    "Results may be influenced by department-specific factors not captured in the analysis",
    "Correlation does not imply causation; further investigation is needed to confirm causal relationships",
    "The absence of statistical significance does not necessarily mean there is no effect, especially with smaller sample sizes",
    "The overall recommendation counts metrics and is not itself a statistical test",
];

/// Derive findings, per-metric leaders and recommendations
pub fn derive_insights(
    specs: &[MetricSpec],
    results: &[MetricResult],
    verdict: &AggregateVerdict,
    labels: &GroupLabels,
) -> Insights {
    let mut significant_findings = Vec::new();
    let mut recommendations = Vec::new();
    let mut leaders = Vec::with_capacity(results.len());

    for (spec, result) in specs.iter().zip(results) {
        let metric_label = spec.label();
        leaders.push(MetricLeader {
            metric: result.metric.clone(),
            group: result.better_group,
            significant: result.significant,
        });

        match (result.better_group, result.significant) {
            (Some(group), true) => {
                let label = labels.label(group);
                significant_findings.push(format!(
                    "Group {} showed significantly {} {}",
                    label,
                    spec.direction.comparative(),
                    metric_label
                ));
                recommendations.push(format!(
                    "Adopt Group {}'s approach for {} (statistically significant improvement)",
                    label, metric_label
                ));
            }
            (Some(group), false) => {
                recommendations.push(format!(
                    "Consider piloting Group {}'s approach for {}; the observed difference is not statistically significant",
                    labels.label(group),
                    metric_label
                ));
            }
            (None, true) => {
                significant_findings.push(format!(
                    "The distribution of {} differs significantly between groups with equal means",
                    metric_label
                ));
            }
            (None, false) => {}
        }
    }

    let strength = match verdict.recommended_group() {
        Some(_) if verdict.tally().margin() >= CONSISTENT_MARGIN => {
            RecommendationStrength::Consistent
        }
        _ => RecommendationStrength::Mixed,
    };

    match (strength, verdict.recommended_group()) {
        (RecommendationStrength::Consistent, Some(group)) => {
            recommendations.push(format!(
                "Prioritize Group {}'s approach across all areas; it was better on {} of {} metrics",
                labels.label(group),
                verdict.tally().wins(group),
                verdict.tally().total()
            ));
        }
        _ => {
            let parts: Vec<String> = specs
                .iter()
                .zip(results)
                .filter_map(|(spec, result)| {
                    result
                        .better_group
                        .map(|g| format!("Group {} for {}", labels.label(g), spec.label()))
                })
                .collect();
            if !parts.is_empty() {
                recommendations.push(format!(
                    "Combine the best practices of both groups: {}",
                    parts.join(", ")
                ));
            }
        }
    }

    Insights {
        significant_findings,
        strength,
        leaders,
        recommendations,
        caveats: STANDARD_CAVEATS.iter().map(|c| c.to_string()).collect(),
    }
}
