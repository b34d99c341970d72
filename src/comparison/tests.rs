// Scenario tests for the comparison engine
//
// Each test mirrors a situation a clinic A/B study actually produces:
// clear wins, noise-level differences, sparse outcome tables and
// constant samples.

use super::*;
use crate::error::CompareError;
use crate::metric::{Direction, MetricSpec};
use crate::sample::{Group, GroupLabels, SampleTable};

fn indicators(successes: usize, n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| if i < successes { 1.0 } else { 0.0 })
        .collect()
}

fn clinic_specs() -> Vec<MetricSpec> {
    vec![
        MetricSpec::continuous("wait_time_minutes", Direction::LowerIsBetter),
        MetricSpec::proportion("no_show", Direction::LowerIsBetter),
        MetricSpec::continuous("satisfaction_score", Direction::HigherIsBetter)
            .with_non_normal(true),
    ]
}

fn clinic_samples() -> SampleTable {
    SampleTable::new()
        .with_metric(
            "wait_time_minutes",
            vec![30.0, 35.0, 28.0, 40.0, 33.0],
            vec![32.0, 36.0, 30.0, 41.0, 34.0],
        )
        .with_metric("no_show", indicators(58, 1000), indicators(62, 1000))
        .with_metric(
            "satisfaction_score",
            vec![3.0, 4.0, 4.0, 5.0, 3.0],
            vec![4.0, 4.0, 5.0, 3.0, 4.0],
        )
}

/// Scenario: new check-in flow clearly shortens waits
/// Expected: Welch's t-test, p well below 0.05, strongly negative d
#[test]
fn test_continuous_clear_difference() {
    let specs = vec![MetricSpec::continuous("wait_time_minutes", Direction::LowerIsBetter)];
    let samples = SampleTable::new().with_metric(
        "wait_time_minutes",
        vec![10.0, 12.0, 11.0, 9.0, 13.0],
        vec![20.0, 22.0, 19.0, 21.0, 23.0],
    );

    let report = compare(&specs, &samples).unwrap();
    let result = report.metric("wait_time_minutes").unwrap();

    assert_eq!(result.test, TestKind::WelchT);
    assert_eq!(result.group_a.mean, 11.0);
    assert_eq!(result.group_b.mean, 21.0);
    assert_eq!(result.difference, -10.0);
    assert!((result.statistic + 10.0).abs() < 1e-12);
    assert!((result.degrees_of_freedom.unwrap() - 8.0).abs() < 1e-12);
    assert!(result.p_value < 0.001, "p = {}", result.p_value);
    assert!(result.significant);
    assert!(result.effect_size < -0.8);
    assert_eq!(result.better_group, Some(Group::A));
    assert!(!result.degenerate);
}

/// Scenario: SMS reminder barely moves the no-show rate
/// Expected: chi-square, p > 0.4, not significant
#[test]
fn test_proportion_no_real_difference() {
    let specs = vec![MetricSpec::proportion("no_show", Direction::LowerIsBetter)];
    let samples =
        SampleTable::new().with_metric("no_show", indicators(58, 1000), indicators(62, 1000));

    let report = compare(&specs, &samples).unwrap();
    let result = &report.metrics[0];

    assert_eq!(result.test, TestKind::ChiSquare);
    assert!((result.group_a.rate() - 0.058).abs() < 1e-12);
    assert!((result.group_b.rate() - 0.062).abs() < 1e-12);
    assert_eq!(result.group_a.successes, Some(58));
    assert!(result.p_value > 0.4, "p = {}", result.p_value);
    assert!(!result.significant);
    assert_eq!(result.effect_size_kind, EffectSizeKind::RateDifference);
    assert!((result.effect_size + 0.004).abs() < 1e-12);
}

/// Scenario: A wins wait time and no-show, B wins satisfaction, nothing significant
/// Expected: A recommended on 2 of 3 with an explicit non-significance caveat
#[test]
fn test_aggregate_verdict_two_of_three() {
    let report = compare(&clinic_specs(), &clinic_samples()).unwrap();

    assert!(report.metrics.iter().all(|m| !m.significant));
    assert_eq!(report.metric("wait_time_minutes").unwrap().better_group, Some(Group::A));
    assert_eq!(report.metric("no_show").unwrap().better_group, Some(Group::A));
    assert_eq!(
        report.metric("satisfaction_score").unwrap().better_group,
        Some(Group::B)
    );
    assert_eq!(
        report.metric("satisfaction_score").unwrap().test,
        TestKind::MannWhitneyU
    );

    match &report.verdict {
        AggregateVerdict::Recommended {
            group,
            tally,
            caveat,
            ..
        } => {
            assert_eq!(*group, Group::A);
            assert_eq!(tally.wins_a, 2);
            assert_eq!(tally.total(), 3);
            assert!(caveat.contains("not a combined significance test"));
            assert!(caveat.contains("none of the 2 metrics"));
        }
        other => panic!("Expected Recommended verdict, got {:?}", other),
    }

    assert_eq!(report.insights.strength, RecommendationStrength::Mixed);
    assert!(report.insights.significant_findings.is_empty());
}

/// Scenario: metrics come back in the order they were specified
#[test]
fn test_results_follow_spec_order() {
    let report = compare(&clinic_specs(), &clinic_samples()).unwrap();
    let names: Vec<&str> = report.metrics.iter().map(|m| m.metric.as_str()).collect();
    assert_eq!(names, vec!["wait_time_minutes", "no_show", "satisfaction_score"]);
}

/// Scenario: a metric is specified but the data layer returned nothing for it
#[test]
fn test_missing_samples_fail_whole_call() {
    let mut specs = clinic_specs();
    specs.push(MetricSpec::proportion("readmitted", Direction::LowerIsBetter));

    let err = compare(&specs, &clinic_samples()).unwrap_err();
    assert_eq!(err, CompareError::MismatchedMetric("readmitted".to_string()));
}

/// Scenario: boundary sample sizes
/// Expected: n=1 rejected, n=2 accepted
#[test]
fn test_sample_size_boundary() {
    let specs = vec![MetricSpec::continuous("wait", Direction::LowerIsBetter)];

    let one = SampleTable::new().with_metric("wait", vec![5.0], vec![6.0, 7.0]);
    assert!(matches!(
        compare(&specs, &one),
        Err(CompareError::InsufficientData { actual: 1, .. })
    ));

    let two = SampleTable::new().with_metric("wait", vec![5.0, 6.0], vec![6.0, 8.0]);
    let report = compare(&specs, &two).unwrap();
    let p = report.metrics[0].p_value;
    assert!((0.0..=1.0).contains(&p));
}

/// Scenario: every patient in both groups waited exactly the same time
/// Expected: annotated as degenerate, p = 1, no NaN anywhere
#[test]
fn test_constant_samples_are_degenerate() {
    let specs = vec![MetricSpec::continuous("wait", Direction::LowerIsBetter)];
    let samples = SampleTable::new().with_metric("wait", vec![5.0; 4], vec![5.0; 6]);

    let report = compare(&specs, &samples).unwrap();
    let result = &report.metrics[0];

    assert!(result.degenerate);
    assert_eq!(result.p_value, 1.0);
    assert!(!result.significant);
    assert_eq!(result.effect_size, 0.0);
    assert_eq!(result.better_group, None);
    assert!(result
        .degeneracies
        .contains(&Degeneracy::ZeroVariance { group: Group::A }));
    assert!(result.degeneracies.contains(&Degeneracy::UndefinedStatistic));
    assert!(result.degeneracies.contains(&Degeneracy::ZeroPooledStdDev));
    assert_eq!(report.verdict.recommended_group(), None);

    for value in [result.statistic, result.p_value, result.effect_size, result.difference] {
        assert!(value.is_finite());
    }
}

/// Scenario: measurements recorded in a unit that makes every value tiny
/// Expected: same test outcome as any other scale, nothing annotated
#[test]
fn test_tiny_scale_values_compare_normally() {
    let specs = vec![MetricSpec::continuous("dose", Direction::LowerIsBetter)];
    let samples =
        SampleTable::new().with_metric("dose", vec![0.0, 1e-100, 2e-100], vec![0.0, 1e-100, 3e-100]);

    let report = compare(&specs, &samples).unwrap();
    let result = &report.metrics[0];

    assert!(!result.degenerate, "{:?}", result.degeneracies);
    let df = result.degrees_of_freedom.unwrap();
    assert!(df.is_finite() && df >= 2.0, "df = {}", df);
    assert!(result.p_value > 0.0 && result.p_value < 1.0);
    assert!(result.effect_size.is_finite() && result.effect_size < 0.0);
}

/// Scenario: one group's values are so spread out that squared deviations overflow
/// Expected: finite SD and effect size, no zero-SD annotation
#[test]
fn test_huge_spread_keeps_finite_statistics() {
    let specs = vec![MetricSpec::continuous("charges", Direction::LowerIsBetter)];
    let samples =
        SampleTable::new().with_metric("charges", vec![1e160, 2e160, 3e160], vec![1.0, 2.0, 3.0]);

    let report = compare(&specs, &samples).unwrap();
    let result = &report.metrics[0];

    assert!((result.group_a.std_dev / 1e160 - 1.0).abs() < 1e-12);
    assert!(!result.degeneracies.contains(&Degeneracy::ZeroPooledStdDev));
    assert!(!result.degenerate, "{:?}", result.degeneracies);
    assert!(result.effect_size > 2.0);
    assert_eq!(result.test, TestKind::WelchT);
    assert!(result.statistic.is_finite());
}

/// Scenario: values near f64::MAX whose plain sum overflows
/// Expected: finite mean and difference, no annotations
#[test]
fn test_near_max_values_keep_finite_mean() {
    let specs = vec![MetricSpec::continuous("charges", Direction::LowerIsBetter)];
    let samples = SampleTable::new().with_metric(
        "charges",
        vec![1e308, 1.5e308, 1.7e308],
        vec![1.0, 2.0, 3.0],
    );

    let report = compare(&specs, &samples).unwrap();
    let result = &report.metrics[0];

    assert!(result.group_a.mean.is_finite());
    assert!((result.group_a.mean / 1.4e308 - 1.0).abs() < 1e-12);
    assert!(result.difference.is_finite());
    assert!(result.group_a.std_dev.is_finite());
    assert!(!result.degenerate, "{:?}", result.degeneracies);
    assert_eq!(result.better_group, Some(Group::B));
}

/// Scenario: groups at opposite ends of the f64 range
/// Expected: difference saturates, overflow annotated, every value still finite
#[test]
fn test_overflowing_difference_is_annotated() {
    let specs = vec![MetricSpec::continuous("balance", Direction::HigherIsBetter)];
    let samples = SampleTable::new().with_metric(
        "balance",
        vec![1.7e308, 1.6e308],
        vec![-1.7e308, -1.6e308],
    );

    let report = compare(&specs, &samples).unwrap();
    let result = &report.metrics[0];

    assert!(result.degeneracies.contains(&Degeneracy::DifferenceOverflow));
    assert!(result.degeneracies.contains(&Degeneracy::UndefinedStatistic));
    assert!(!result.degeneracies.contains(&Degeneracy::ZeroPooledStdDev));
    assert_eq!(result.difference, f64::MAX);
    assert_eq!(result.effect_size, 0.0);
    assert_eq!(result.p_value, 1.0);
    assert_eq!(result.better_group, Some(Group::A));
    for value in [result.statistic, result.effect_size, result.difference] {
        assert!(value.is_finite());
    }
}

/// Scenario: a group's spread itself exceeds the f64 range
/// Expected: SD overflow annotated for that group only, reported SD saturated
#[test]
fn test_overflowing_std_dev_is_annotated() {
    let specs = vec![MetricSpec::continuous("balance", Direction::HigherIsBetter)];
    let samples = SampleTable::new().with_metric(
        "balance",
        vec![-1.7e308, 0.0, 1.7e308],
        vec![1.0, 2.0, 3.0],
    );

    let report = compare(&specs, &samples).unwrap();
    let result = &report.metrics[0];

    assert_eq!(
        result
            .degeneracies
            .iter()
            .filter(|d| matches!(d, Degeneracy::StdDevOverflow { .. }))
            .collect::<Vec<_>>(),
        vec![&Degeneracy::StdDevOverflow { group: Group::A }]
    );
    assert_eq!(result.group_a.std_dev, f64::MAX);
    assert!(!result.degeneracies.contains(&Degeneracy::ZeroPooledStdDev));
    assert_eq!(result.effect_size, 0.0);
    assert!(!result.significant);
    assert!(serde_json::to_string(&report).unwrap().contains("std_dev_overflow"));
}

/// Scenario: 1-5 satisfaction scores compared with Mann-Whitney
/// Expected: each group carries the share of every score
#[test]
fn test_satisfaction_scores_report_distribution() {
    let report = compare(&clinic_specs(), &clinic_samples()).unwrap();
    let result = report.metric("satisfaction_score").unwrap();

    let shares: Vec<(f64, usize)> = result
        .group_a
        .distribution
        .as_ref()
        .unwrap()
        .iter()
        .map(|s| (s.value, s.count))
        .collect();
    assert_eq!(shares, vec![(3.0, 2), (4.0, 2), (5.0, 1)]);

    let group_b = result.group_b.distribution.as_ref().unwrap();
    assert_eq!(group_b[1].value, 4.0);
    assert!((group_b[1].share - 0.6).abs() < 1e-12);

    assert_eq!(report.metric("wait_time_minutes").unwrap().group_a.distribution, None);
    assert_eq!(report.metric("no_show").unwrap().group_a.distribution, None);
}

/// Scenario: rare readmissions make the 2×2 table sparse
/// Expected: Fisher's exact test with p ≈ 0.0108
#[test]
fn test_sparse_table_uses_fisher() {
    let specs = vec![MetricSpec::proportion("readmitted", Direction::LowerIsBetter)];
    let samples =
        SampleTable::new().with_metric("readmitted", indicators(0, 10), indicators(6, 10));

    let report = compare(&specs, &samples).unwrap();
    let result = &report.metrics[0];

    assert_eq!(result.test, TestKind::FisherExact);
    // Two equally extreme tables, each 210 / 38760
    assert!((result.p_value - 420.0 / 38760.0).abs() < 1e-9);
    assert!(result.significant);
    assert_eq!(result.better_group, Some(Group::A));
    assert!(result.degeneracies.contains(&Degeneracy::UniformOutcome {
        group: Group::A,
        rate: 0.0
    }));
}

/// Scenario: relabeling the groups must not change the science
#[test]
fn test_swapping_groups_preserves_p_values() {
    let specs = clinic_specs();
    let samples = clinic_samples().with_metric(
        "wait_time_minutes",
        vec![10.0, 12.0, 11.0, 9.0, 13.0],
        vec![20.0, 22.0, 19.0, 21.0, 23.0],
    );
    let labels = GroupLabels::new("control", "reminder");

    let forward = compare_with_labels(&specs, &samples, &labels).unwrap();
    let backward = compare_with_labels(&specs, &samples.swapped(), &labels.swapped()).unwrap();

    for (f, b) in forward.metrics.iter().zip(&backward.metrics) {
        assert!((f.p_value - b.p_value).abs() < 1e-12, "{}", f.metric);
        assert_eq!(f.significant, b.significant);
        assert_eq!(f.difference, -b.difference);
        assert_eq!(f.better_group.map(|g| g.other()), b.better_group);
    }
    assert_eq!(
        forward.metrics[0].effect_size,
        -backward.metrics[0].effect_size
    );
}

/// Scenario: one comparison per department, one department with too little data
/// Expected: healthy segments report, the thin one fails alone
#[test]
fn test_segments_fail_independently() {
    let specs = vec![MetricSpec::continuous("wait", Direction::LowerIsBetter)];
    let mut segments = std::collections::BTreeMap::new();
    segments.insert(
        "Cardiology".to_string(),
        SampleTable::new().with_metric("wait", vec![10.0, 12.0, 11.0], vec![20.0, 21.0, 22.0]),
    );
    segments.insert(
        "Pediatrics".to_string(),
        SampleTable::new().with_metric("wait", vec![10.0], vec![20.0, 21.0]),
    );

    let results = compare_segments(&specs, &segments, &GroupLabels::default());

    assert_eq!(results.len(), 2);
    assert!(results["Cardiology"].is_ok());
    assert!(matches!(
        results["Pediatrics"],
        Err(CompareError::InsufficientData { .. })
    ));
}

/// Scenario: the same inputs compared twice
#[test]
fn test_compare_is_deterministic() {
    let first = compare(&clinic_specs(), &clinic_samples()).unwrap();
    let second = compare(&clinic_specs(), &clinic_samples()).unwrap();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_report_string_mentions_verdict_and_caveat() {
    let report = compare(&clinic_specs(), &clinic_samples()).unwrap();
    let text = report.to_report_string();
    assert!(text.contains("Group A recommended: better on 2 of 3 metrics"));
    assert!(text.contains("Descriptive count only"));
    assert!(text.contains("Mann-Whitney U test"));
    assert!(text.contains("(3 metrics, 0 significant)"));
    assert!(text.contains("    distribution: 3=40.0% 4=40.0% 5=20.0%"));
    assert!(text.contains("  B: n=5 mean=4.0000"));
}
