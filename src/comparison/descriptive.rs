// Descriptive statistics for one group's sample
//
// Sums that overflow f64 are recomputed on values scaled by the largest
// magnitude, so means of finite samples are always finite.

use serde::{Deserialize, Serialize};

/// Summary of one group's observations for one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    /// Group label as supplied by the caller
    pub label: String,
    /// Number of observations (always the full input size)
    pub n: usize,
    /// Mean; for proportions this is the success rate
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (n - 1 denominator)
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    /// Number of 1-valued observations (proportion metrics only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub successes: Option<usize>,
    /// Share of each distinct value, ascending (ordinal-scale metrics only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution: Option<Vec<ValueShare>>,
}

/// How often one distinct value occurs in a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueShare {
    pub value: f64,
    pub count: usize,
    /// count / n, in [0, 1]
    pub share: f64,
}

impl GroupStats {
    /// Summarize a continuous sample. Caller guarantees `values.len() >= 1`.
    pub fn continuous(label: &str, values: &[f64]) -> Self {
        Self {
            label: label.to_string(),
            n: values.len(),
            mean: mean(values),
            median: median(values),
            std_dev: std_dev(values),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            successes: None,
            distribution: None,
        }
    }

    /// Summarize a sample on a small discrete scale, keeping its value distribution
    pub fn ordinal(label: &str, values: &[f64]) -> Self {
        let mut stats = Self::continuous(label, values);
        stats.distribution = Some(value_distribution(values));
        stats
    }

    /// Summarize a 0/1 indicator sample
    pub fn proportion(label: &str, indicators: &[f64]) -> Self {
        let mut stats = Self::continuous(label, indicators);
        stats.successes = Some(count_successes(indicators));
        stats
    }

    /// Success rate (identical to `mean` for proportion samples)
    pub fn rate(&self) -> f64 {
        self.mean
    }

    pub fn has_zero_variance(&self) -> bool {
        self.std_dev == 0.0
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let direct = values.iter().sum::<f64>() / n;
    if direct.is_finite() {
        return direct;
    }
    let scale = max_magnitude(values);
    scale * (values.iter().map(|x| x / scale).sum::<f64>() / n)
}

fn max_magnitude(values: &[f64]) -> f64 {
    values.iter().fold(0.0, |acc: f64, x| acc.max(x.abs()))
}

/// Sample variance with Bessel's correction; 0 for fewer than 2 values
pub fn sample_variance(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n - 1) as f64
}

/// Sample standard deviation; infinite only when the spread itself exceeds f64
pub fn std_dev(values: &[f64]) -> f64 {
    let direct = sample_variance(values).sqrt();
    if direct.is_finite() {
        return direct;
    }
    let scale = max_magnitude(values);
    let scaled: Vec<f64> = values.iter().map(|x| x / scale).collect();
    scale * sample_variance(&scaled).sqrt()
}

/// Median (average of the two middle values for even lengths)
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

pub fn count_successes(indicators: &[f64]) -> usize {
    indicators.iter().filter(|&&v| v == 1.0).count()
}

/// Count and share of every distinct value, in ascending value order
pub fn value_distribution(values: &[f64]) -> Vec<ValueShare> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = values.len() as f64;
    let mut shares: Vec<ValueShare> = Vec::new();
    for v in sorted {
        match shares.last_mut() {
            Some(last) if last.value == v => last.count += 1,
            _ => shares.push(ValueShare {
                value: v,
                count: 1,
                share: 0.0,
            }),
        }
    }
    for entry in &mut shares {
        entry.share = entry.count as f64 / n;
    }
    shares
}

/// Number of distinct values across both groups
pub fn distinct_levels(a: &[f64], b: &[f64]) -> usize {
    let mut pooled: Vec<f64> = a.iter().chain(b).copied().collect();
    pooled.sort_by(f64::total_cmp);
    pooled.dedup();
    pooled.len()
}
