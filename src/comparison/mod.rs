// Statistical comparison of two experiment groups
//
// Compares groups A and B on a set of metrics. Each metric gets descriptive
// statistics, a hypothesis test picked from its value type, an effect size
// and a better group. The per-metric results are then rolled up into a
// descriptive aggregate verdict plus insights and recommendations.
//
// Test selection:
// - continuous metrics: Welch's t-test (unequal variances)
// - continuous metrics flagged non-normal: Mann-Whitney U
// - proportions: chi-square with Yates' correction, Fisher's exact test for
//   sparse tables (any expected cell count below 5)
//
// Significance is p < 0.05 and never depends on the metric direction.
//
// Implementation:
// - Special functions (log-gamma, incomplete beta/gamma) evaluated in f64
// - Every input is validated before any metric is compared
// - Degenerate inputs (zero variance, uniform outcomes, f64 overflow) are
//   annotated, never NaN
// - Non-normal metrics on a small discrete scale report each group's value
//   distribution

mod descriptive;
mod effect;
mod engine;
mod hypothesis;
mod report;
mod selection;
mod special;
mod verdict;

/// Two-sided significance threshold: a result is significant iff p < 0.05
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

pub use descriptive::{
    mean, median, sample_variance, std_dev, value_distribution, GroupStats, ValueShare,
};
pub use effect::{cohens_d, pooled_std_dev, EffectSizeKind};
pub use engine::{
    compare, compare_segments, compare_with_labels, MAX_DISTRIBUTION_LEVELS,
    MIN_OBSERVATIONS_PER_GROUP,
};
pub use hypothesis::{
    chi_square_independence, fisher_exact, mann_whitney_u, welch_t_test, ContingencyTable,
    TestKind, TestOutcome, EXACT_MANN_WHITNEY_MAX_N,
};
pub use report::{ComparisonReport, Degeneracy, MetricResult};
pub use selection::{run_selected_test, MIN_EXPECTED_CELL_COUNT};
pub use special::{chi_square_sf, normal_sf, students_t_two_tailed_p};
pub use verdict::{
    aggregate_verdict, derive_insights, AggregateVerdict, Insights, MetricLeader,
    RecommendationStrength, WinTally, CONSISTENT_MARGIN,
};

#[cfg(test)]
mod tests;
