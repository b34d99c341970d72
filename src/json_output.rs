//! JSON output format for comparison reports
//!
//! Every numeric field is a plain `f64`; formatting is left to the consumer.

use crate::comparison::ComparisonReport;
use crate::error::CompareError;
use crate::sample::GroupLabels;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-segment entry: a report, or the validation error that stopped it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonSegmentResult {
    Report(Box<ComparisonReport>),
    Error { error: String },
}

impl From<Result<ComparisonReport, CompareError>> for JsonSegmentResult {
    fn from(result: Result<ComparisonReport, CompareError>) -> Self {
        match result {
            Ok(report) => JsonSegmentResult::Report(Box::new(report)),
            Err(e) => JsonSegmentResult::Error {
                error: e.to_string(),
            },
        }
    }
}

/// Root JSON output structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonOutput {
    /// Format version identifier
    pub version: String,
    /// Format name
    pub format: String,
    pub groups: GroupLabels,
    /// Whole-study report (absent with --by-segment)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ComparisonReport>,
    /// One entry per segment (only with --by-segment)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments: Option<BTreeMap<String, JsonSegmentResult>>,
}

impl JsonOutput {
    pub fn new(groups: GroupLabels) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "clinistat-json-v1".to_string(),
            groups,
            report: None,
            segments: None,
        }
    }

    pub fn set_report(&mut self, report: ComparisonReport) {
        self.report = Some(report);
    }

    pub fn set_segments(
        &mut self,
        segments: BTreeMap<String, Result<ComparisonReport, CompareError>>,
    ) {
        self.segments = Some(
            segments
                .into_iter()
                .map(|(name, result)| (name, result.into()))
                .collect(),
        );
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
