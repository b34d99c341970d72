// Effect sizes
//
// Continuous metrics report Cohen's d with a pooled standard deviation.
// Proportions report the raw rate difference: a standardized effect for
// binary rates needs assumptions this engine does not make.

use crate::comparison::descriptive::{mean, std_dev};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectSizeKind {
    CohensD,
    RateDifference,
}

/// Pooled standard deviation with (n - 1) weighting
pub fn pooled_std_dev(a: &[f64], b: &[f64]) -> f64 {
    let n_a = a.len() as f64;
    let n_b = b.len() as f64;
    let dof = n_a + n_b - 2.0;
    if dof <= 0.0 {
        return 0.0;
    }
    let sd_a = std_dev(a);
    let sd_b = std_dev(b);
    let scale = sd_a.max(sd_b);
    if scale == 0.0 || !scale.is_finite() {
        return scale;
    }
    let weighted = (n_a - 1.0) * (sd_a / scale).powi(2) + (n_b - 1.0) * (sd_b / scale).powi(2);
    scale * (weighted / dof).sqrt()
}

/// Cohen's d = (mean_a - mean_b) / pooled SD; `None` when the pooled SD is 0
pub fn cohens_d(a: &[f64], b: &[f64]) -> Option<f64> {
    let pooled = pooled_std_dev(a, b);
    if pooled == 0.0 || !pooled.is_finite() {
        return None;
    }
    Some((mean(a) - mean(b)) / pooled)
}

pub fn rate_difference(rate_a: f64, rate_b: f64) -> f64 {
    rate_a - rate_b
}
