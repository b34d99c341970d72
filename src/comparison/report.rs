// Per-metric results and the comparison report
//
// Values keep full f64 precision. The only rounding happens in
// `to_report_string`, which is a plain-text view for terminals and logs.

use crate::comparison::descriptive::GroupStats;
use crate::comparison::effect::EffectSizeKind;
use crate::comparison::hypothesis::TestKind;
use crate::comparison::verdict::{AggregateVerdict, Insights};
use crate::metric::{Direction, ValueType};
use crate::sample::{Group, GroupLabels};
use serde::{Deserialize, Serialize};

/// Numeric edge case detected while comparing one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degeneracy {
    /// Every observation in the group is identical
    ZeroVariance { group: Group },
    /// The test statistic is undefined; p-value reported as 1
    UndefinedStatistic,
    /// A proportion group is all successes or all failures
    UniformOutcome { group: Group, rate: f64 },
    /// Pooled standard deviation is 0; effect size reported as 0
    ZeroPooledStdDev,
    /// The group's spread exceeds the f64 range; standard deviation reported
    /// as `f64::MAX` and effect size as 0
    StdDevOverflow { group: Group },
    /// mean_a - mean_b exceeds the f64 range; difference saturated at
    /// ±`f64::MAX` and effect size reported as 0
    DifferenceOverflow,
}

/// Result of comparing one metric between the two groups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    pub metric: String,
    pub value_type: ValueType,
    pub direction: Direction,
    pub group_a: GroupStats,
    pub group_b: GroupStats,
    /// mean_a - mean_b (rate_a - rate_b for proportions)
    pub difference: f64,
    /// difference / mean_a; absent when not finite (mean_a of 0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_difference: Option<f64>,
    pub test: TestKind,
    pub test_name: String,
    pub statistic: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degrees_of_freedom: Option<f64>,
    pub p_value: f64,
    /// Always `p_value < SIGNIFICANCE_LEVEL`
    pub significant: bool,
    pub effect_size: f64,
    pub effect_size_kind: EffectSizeKind,
    /// Group with the better mean/rate under `direction`; `None` on equal means
    pub better_group: Option<Group>,
    pub degenerate: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degeneracies: Vec<Degeneracy>,
}

impl MetricResult {
    /// Stats for the requested group
    pub fn group(&self, group: Group) -> &GroupStats {
        match group {
            Group::A => &self.group_a,
            Group::B => &self.group_b,
        }
    }
}

/// Everything produced by one `compare` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub groups: GroupLabels,
    /// One entry per metric spec, in spec order
    pub metrics: Vec<MetricResult>,
    pub verdict: AggregateVerdict,
    pub insights: Insights,
}

impl ComparisonReport {
    pub fn metric(&self, name: &str) -> Option<&MetricResult> {
        self.metrics.iter().find(|m| m.metric == name)
    }

    pub fn significant_metrics(&self) -> impl Iterator<Item = &MetricResult> {
        self.metrics.iter().filter(|m| m.significant)
    }

    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        let mut report = String::new();

        report.push_str(&format!(
            "A/B COMPARISON: {} vs {} ({} metrics, {} significant)\n\n",
            self.groups.a,
            self.groups.b,
            self.metrics.len(),
            self.significant_metrics().count()
        ));

        for result in &self.metrics {
            let marker = if result.significant { "✅" } else { "➖" };
            report.push_str(&format!(
                "{} {} [{}]\n",
                marker, result.metric, result.test_name
            ));
            for group in [Group::A, Group::B] {
                let stats = result.group(group);
                report.push_str(&format!(
                    "  {}: n={} mean={:.4} median={:.4} sd={:.4}\n",
                    stats.label, stats.n, stats.mean, stats.median, stats.std_dev
                ));
                if let Some(distribution) = &stats.distribution {
                    let shares: Vec<String> = distribution
                        .iter()
                        .map(|s| format!("{}={:.1}%", s.value, s.share * 100.0))
                        .collect();
                    report.push_str(&format!("    distribution: {}\n", shares.join(" ")));
                }
            }
            report.push_str(&format!(
                "  difference={:.4} p={:.4} significant={} effect={:.4}\n",
                result.difference, result.p_value, result.significant, result.effect_size
            ));
            if result.degenerate {
                report.push_str(&format!(
                    "  ⚠️  degenerate: {} annotation(s)\n",
                    result.degeneracies.len()
                ));
            }
        }

        report.push_str(&format!("\n📊 Verdict: {}\n", self.verdict.summary()));
        report.push_str(&format!("   {}\n", self.verdict.caveat()));

        if !self.insights.significant_findings.is_empty() {
            report.push_str("\nSignificant findings:\n");
            for finding in &self.insights.significant_findings {
                report.push_str(&format!("  - {}\n", finding));
            }
        }

        if !self.insights.recommendations.is_empty() {
            report.push_str("\nRecommendations:\n");
            for (i, rec) in self.insights.recommendations.iter().enumerate() {
                report.push_str(&format!("  {}. {}\n", i + 1, rec));
            }
        }

        report
    }
}
