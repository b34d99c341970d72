//! Study configuration loaded from TOML
//!
//! ```toml
//! [groups]
//! a = "control"
//! b = "sms_reminder"
//!
//! [[metric]]
//! name = "wait_time_minutes"
//! value_type = "continuous"
//! direction = "lower_is_better"
//! ```

use crate::error::CompareError;
use crate::metric::{Direction, MetricSpec};
use crate::sample::GroupLabels;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid study configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Metric(#[from] CompareError),
}

/// Group labels plus the metrics to compare
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudyConfig {
    #[serde(default)]
    pub groups: GroupLabels,

    #[serde(default, rename = "metric")]
    pub metrics: Vec<MetricSpec>,
}

/// `[[metric]]` table as written; `value_type` is parsed once the TOML is read
#[derive(Debug, Deserialize)]
struct RawMetricSpec {
    name: String,
    value_type: String,
    direction: Direction,
    #[serde(default)]
    non_normal: bool,
}

#[derive(Debug, Deserialize)]
struct RawStudyConfig {
    #[serde(default)]
    groups: GroupLabels,

    #[serde(default, rename = "metric")]
    metrics: Vec<RawMetricSpec>,
}

impl TryFrom<RawMetricSpec> for MetricSpec {
    type Error = CompareError;

    fn try_from(raw: RawMetricSpec) -> Result<Self, Self::Error> {
        Ok(MetricSpec {
            name: raw.name,
            value_type: raw.value_type.parse()?,
            direction: raw.direction,
            non_normal: raw.non_normal,
        })
    }
}

impl StudyConfig {
    /// Load and validate a study configuration from a TOML file
    ///
    /// # Example
    ///
    /// ```no_run
    /// use clinistat::config::StudyConfig;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = StudyConfig::from_file("clinistat.toml")?;
    /// println!("Comparing {} metrics", config.metrics.len());
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&content)
    }

    /// Parse and validate a study configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawStudyConfig = toml::from_str(content)?;
        let metrics = raw
            .metrics
            .into_iter()
            .map(MetricSpec::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let config = StudyConfig {
            groups: raw.groups,
            metrics,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.groups.a.trim().is_empty() || self.groups.b.trim().is_empty() {
            return Err(ConfigError::Invalid("group labels must not be empty".to_string()));
        }

        if self.groups.a == self.groups.b {
            return Err(ConfigError::Invalid(format!(
                "group labels must differ (both are '{}')",
                self.groups.a
            )));
        }

        if self.metrics.is_empty() {
            return Err(CompareError::EmptyMetricSpecs.into());
        }

        let mut seen = HashSet::new();
        for metric in &self.metrics {
            if metric.name.trim().is_empty() {
                return Err(ConfigError::Invalid("metric name must not be empty".to_string()));
            }
            if !seen.insert(metric.name.as_str()) {
                return Err(CompareError::DuplicateMetric(metric.name.clone()).into());
            }
        }

        Ok(())
    }
}
