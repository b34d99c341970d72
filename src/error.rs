//! Error taxonomy for the comparison engine
//!
//! Every variant is a caller-input error: nothing here is transient or
//! retryable, and `compare` never produces a partial report.

use thiserror::Error;

/// Errors raised while validating comparison inputs
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompareError {
    #[error("Insufficient data for metric '{metric}' in group '{group}': need at least {required} observations, got {actual}")]
    InsufficientData {
        metric: String,
        group: String,
        required: usize,
        actual: usize,
    },

    #[error("Unknown metric value type '{0}' (expected 'continuous' or 'proportion')")]
    UnknownMetricType(String),

    #[error("No samples supplied for metric '{0}'")]
    MismatchedMetric(String),

    #[error("At least one metric specification is required")]
    EmptyMetricSpecs,

    #[error("Metric '{0}' is specified more than once")]
    DuplicateMetric(String),

    #[error("Invalid observation for metric '{metric}' in group '{group}': {reason}")]
    InvalidObservation {
        metric: String,
        group: String,
        reason: String,
    },

    #[error("Observation for metric '{metric}' has unknown group label '{group}'")]
    UnknownGroup { metric: String, group: String },
}
