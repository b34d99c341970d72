// Comparison engine
//
// Validates every metric up front, then compares each metric independently
// and assembles the report. A validation failure aborts the whole call; no
// partial report is ever returned.

use crate::comparison::descriptive::{distinct_levels, GroupStats};
use crate::comparison::effect::{cohens_d, rate_difference, EffectSizeKind};
use crate::comparison::report::{ComparisonReport, Degeneracy, MetricResult};
use crate::comparison::selection::run_selected_test;
use crate::comparison::verdict::{aggregate_verdict, derive_insights};
use crate::comparison::SIGNIFICANCE_LEVEL;
use crate::error::CompareError;
use crate::metric::{MetricSpec, ValueType};
use crate::sample::{Group, GroupLabels, MetricSamples, SampleTable};
use std::collections::{BTreeMap, HashSet};

/// Fewest observations per group for which a comparison is attempted
pub const MIN_OBSERVATIONS_PER_GROUP: usize = 2;

/// Most distinct values (both groups pooled) for which a non-normal metric
/// reports its value distribution
pub const MAX_DISTRIBUTION_LEVELS: usize = 10;

/// Compare two groups labeled "A" and "B" on every metric in `specs`
///
/// # Example
/// ```
/// use clinistat::comparison::compare;
/// use clinistat::metric::{Direction, MetricSpec};
/// use clinistat::sample::SampleTable;
///
/// let specs = vec![MetricSpec::continuous("wait_time", Direction::LowerIsBetter)];
/// let samples = SampleTable::new().with_metric(
///     "wait_time",
///     vec![10.0, 12.0, 11.0, 9.0, 13.0],
///     vec![20.0, 22.0, 19.0, 21.0, 23.0],
/// );
///
/// let report = compare(&specs, &samples).unwrap();
/// assert!(report.metrics[0].significant);
/// assert_eq!(report.verdict.recommended_group(), Some(clinistat::sample::Group::A));
/// ```
pub fn compare(
    specs: &[MetricSpec],
    samples: &SampleTable,
) -> Result<ComparisonReport, CompareError> {
    compare_with_labels(specs, samples, &GroupLabels::default())
}

/// Same as [`compare`], with caller-supplied group labels
pub fn compare_with_labels(
    specs: &[MetricSpec],
    samples: &SampleTable,
    labels: &GroupLabels,
) -> Result<ComparisonReport, CompareError> {
    let inputs = validate(specs, samples, labels)?;

    let unused: Vec<&str> = samples
        .metric_names()
        .filter(|name| !specs.iter().any(|s| s.name == *name))
        .collect();
    if !unused.is_empty() {
        tracing::debug!("Ignoring samples without a metric spec: {}", unused.join(", "));
    }

    let metrics: Vec<MetricResult> = specs
        .iter()
        .zip(inputs)
        .map(|(spec, metric_samples)| compare_metric(spec, metric_samples, labels))
        .collect();

    let verdict = aggregate_verdict(&metrics, labels);
    let insights = derive_insights(specs, &metrics, &verdict, labels);
    tracing::info!(
        "Compared {} metrics ({} significant): {}",
        metrics.len(),
        metrics.iter().filter(|m| m.significant).count(),
        verdict.summary()
    );

    Ok(ComparisonReport {
        groups: labels.clone(),
        metrics,
        verdict,
        insights,
    })
}

/// Run one comparison per segment on scoped worker threads
///
/// Segments fail independently: an invalid segment yields its own error and
/// does not affect the others.
pub fn compare_segments(
    specs: &[MetricSpec],
    segments: &BTreeMap<String, SampleTable>,
    labels: &GroupLabels,
) -> BTreeMap<String, Result<ComparisonReport, CompareError>> {
    let results = crossbeam::thread::scope(|scope| {
        let handles: Vec<_> = segments
            .iter()
            .map(|(name, table)| {
                let handle = scope.spawn(move |_| {
                    tracing::debug!("Comparing segment {}", name);
                    compare_with_labels(specs, table, labels)
                });
                (name.clone(), handle)
            })
            .collect();

        handles
            .into_iter()
            .map(|(name, handle)| {
                let result = handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
                if let Err(e) = &result {
                    tracing::warn!("Segment {} skipped: {}", name, e);
                }
                (name, result)
            })
            .collect::<BTreeMap<_, _>>()
    });

    results.unwrap_or_else(|panic| std::panic::resume_unwind(panic))
}

/// Check every spec against the table; returns samples in spec order
fn validate<'a>(
    specs: &[MetricSpec],
    samples: &'a SampleTable,
    labels: &GroupLabels,
) -> Result<Vec<&'a MetricSamples>, CompareError> {
    if specs.is_empty() {
        return Err(CompareError::EmptyMetricSpecs);
    }

    let mut seen = HashSet::new();
    let mut inputs = Vec::with_capacity(specs.len());

    for spec in specs {
        if !seen.insert(spec.name.as_str()) {
            return Err(CompareError::DuplicateMetric(spec.name.clone()));
        }

        let metric_samples = samples
            .get(&spec.name)
            .ok_or_else(|| CompareError::MismatchedMetric(spec.name.clone()))?;

        for group in [Group::A, Group::B] {
            validate_sample(spec, labels.label(group), metric_samples.get(group))?;
        }
        inputs.push(metric_samples);
    }

    Ok(inputs)
}

fn validate_sample(spec: &MetricSpec, group: &str, values: &[f64]) -> Result<(), CompareError> {
    if values.len() < MIN_OBSERVATIONS_PER_GROUP {
        return Err(CompareError::InsufficientData {
            metric: spec.name.clone(),
            group: group.to_string(),
            required: MIN_OBSERVATIONS_PER_GROUP,
            actual: values.len(),
        });
    }

    let invalid = |reason: String| CompareError::InvalidObservation {
        metric: spec.name.clone(),
        group: group.to_string(),
        reason,
    };

    if let Some(v) = values.iter().find(|v| !v.is_finite()) {
        return Err(invalid(format!("non-finite value {}", v)));
    }

    if spec.value_type == ValueType::Proportion {
        if let Some(v) = values.iter().find(|&&v| v != 0.0 && v != 1.0) {
            return Err(invalid(format!(
                "proportion metrics take 0/1 indicators, got {}",
                v
            )));
        }
    }

    Ok(())
}

fn compare_metric(spec: &MetricSpec, samples: &MetricSamples, labels: &GroupLabels) -> MetricResult {
    let a = samples.get(Group::A);
    let b = samples.get(Group::B);
    let outcome = run_selected_test(spec, a, b);
    let mut degeneracies = Vec::new();

    let (group_a, group_b, difference, effect_size, effect_size_kind) = match spec.value_type {
        ValueType::Continuous => {
            let ordinal = spec.non_normal && distinct_levels(a, b) <= MAX_DISTRIBUTION_LEVELS;
            let summarize: fn(&str, &[f64]) -> GroupStats = if ordinal {
                GroupStats::ordinal
            } else {
                GroupStats::continuous
            };
            let mut group_a = summarize(labels.label(Group::A), a);
            let mut group_b = summarize(labels.label(Group::B), b);

            let mut overflow = false;
            for (group, stats) in [(Group::A, &mut group_a), (Group::B, &mut group_b)] {
                if stats.has_zero_variance() {
                    degeneracies.push(Degeneracy::ZeroVariance { group });
                }
                if !stats.std_dev.is_finite() {
                    degeneracies.push(Degeneracy::StdDevOverflow { group });
                    stats.std_dev = f64::MAX;
                    overflow = true;
                }
            }

            let mut difference = group_a.mean - group_b.mean;
            if !difference.is_finite() {
                degeneracies.push(Degeneracy::DifferenceOverflow);
                difference = f64::MAX.copysign(difference);
                overflow = true;
            }

            let effect = if overflow {
                0.0
            } else {
                cohens_d(a, b).unwrap_or_else(|| {
                    degeneracies.push(Degeneracy::ZeroPooledStdDev);
                    0.0
                })
            };
            (group_a, group_b, difference, effect, EffectSizeKind::CohensD)
        }
        ValueType::Proportion => {
            let group_a = GroupStats::proportion(labels.label(Group::A), a);
            let group_b = GroupStats::proportion(labels.label(Group::B), b);
            for (group, stats) in [(Group::A, &group_a), (Group::B, &group_b)] {
                let rate = stats.rate();
                if rate == 0.0 || rate == 1.0 {
                    degeneracies.push(Degeneracy::UniformOutcome { group, rate });
                }
            }
            let difference = rate_difference(group_a.rate(), group_b.rate());
            (
                group_a,
                group_b,
                difference,
                difference,
                EffectSizeKind::RateDifference,
            )
        }
    };

    if outcome.undefined {
        degeneracies.push(Degeneracy::UndefinedStatistic);
    }
    if !degeneracies.is_empty() {
        tracing::warn!(
            "Degenerate input for {}: {} annotation(s)",
            spec.name,
            degeneracies.len()
        );
    }

    let better_group = if spec.direction.is_better(group_a.mean, group_b.mean) {
        Some(Group::A)
    } else if spec.direction.is_better(group_b.mean, group_a.mean) {
        Some(Group::B)
    } else {
        None
    };

    let relative_difference = Some(difference / group_a.mean).filter(|r| r.is_finite());
    let significant = outcome.p_value < SIGNIFICANCE_LEVEL;

    tracing::debug!(
        "{}: {} statistic={:.4} p={:.4} significant={}",
        spec.name,
        outcome.kind.name(),
        outcome.statistic,
        outcome.p_value,
        significant
    );

    MetricResult {
        metric: spec.name.clone(),
        value_type: spec.value_type,
        direction: spec.direction,
        group_a,
        group_b,
        difference,
        relative_difference,
        test: outcome.kind,
        test_name: outcome.kind.name().to_string(),
        statistic: outcome.statistic,
        degrees_of_freedom: outcome.df,
        p_value: outcome.p_value,
        significant,
        effect_size,
        effect_size_kind,
        better_group,
        degenerate: !degeneracies.is_empty(),
        degeneracies,
    }
}
