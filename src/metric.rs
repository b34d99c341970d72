//! Metric specifications
//!
//! A `MetricSpec` tells the engine which hypothesis test applies to a metric
//! (via its `ValueType`) and how to phrase the aggregate verdict (via its
//! `Direction`). Direction never influences the computed statistics.

use crate::error::CompareError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of observation a metric collects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum ValueType {
    /// Real-valued measurements (wait time, satisfaction score, ...)
    Continuous,
    /// 0/1 indicators (no-show, readmission, ...)
    Proportion,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Continuous => "continuous",
            ValueType::Proportion => "proportion",
        }
    }
}

impl FromStr for ValueType {
    type Err = CompareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continuous" => Ok(ValueType::Continuous),
            "proportion" => Ok(ValueType::Proportion),
            _ => Err(CompareError::UnknownMetricType(s.to_string())),
        }
    }
}

impl TryFrom<String> for ValueType {
    type Error = CompareError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which direction of change counts as an improvement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    LowerIsBetter,
    HigherIsBetter,
}

impl Direction {
    /// Word used when describing the better group ("lower wait time")
    pub fn comparative(&self) -> &'static str {
        match self {
            Direction::LowerIsBetter => "lower",
            Direction::HigherIsBetter => "higher",
        }
    }

    /// Whether `candidate` is strictly better than `other` under this direction
    pub fn is_better(&self, candidate: f64, other: f64) -> bool {
        match self {
            Direction::LowerIsBetter => candidate < other,
            Direction::HigherIsBetter => candidate > other,
        }
    }
}

/// Specification of one metric to compare between the two groups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSpec {
    /// Unique metric name, matching the keys of the sample table
    pub name: String,

    /// Continuous measurement or 0/1 proportion
    pub value_type: ValueType,

    /// Used only for phrasing the aggregate verdict
    pub direction: Direction,

    /// Caller hint that a continuous metric is not normally distributed
    /// (ordinal scores, heavy tails). Selects Mann-Whitney U instead of Welch.
    #[serde(default)]
    pub non_normal: bool,
}

impl MetricSpec {
    pub fn continuous(name: impl Into<String>, direction: Direction) -> Self {
        Self {
            name: name.into(),
            value_type: ValueType::Continuous,
            direction,
            non_normal: false,
        }
    }

    pub fn proportion(name: impl Into<String>, direction: Direction) -> Self {
        Self {
            name: name.into(),
            value_type: ValueType::Proportion,
            direction,
            non_normal: false,
        }
    }

    /// Mark a continuous metric as non-normal
    pub fn with_non_normal(mut self, non_normal: bool) -> Self {
        self.non_normal = non_normal;
        self
    }

    /// Human-readable metric label ("wait_time_minutes" -> "wait time minutes")
    pub fn label(&self) -> String {
        self.name.replace(['_', '-'], " ")
    }
}
