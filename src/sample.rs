//! Labeled samples and the observation records they are built from
//!
//! The engine consumes a `SampleTable`: for every metric name, one sample per
//! experiment group. Samples arrive pre-labeled; this module only groups
//! long-format records (`{segment?, group, metric, value}`) by label.

use crate::error::CompareError;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Segment name used for records that carry no segment
pub const UNSEGMENTED: &str = "(unsegmented)";

/// One of the two compared experiment groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Group {
    A,
    B,
}

impl Group {
    pub fn other(&self) -> Group {
        match self {
            Group::A => Group::B,
            Group::B => Group::A,
        }
    }
}

/// Display labels for the two groups (e.g. "A"/"B", "control"/"reminder_sms")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupLabels {
    pub a: String,
    pub b: String,
}

impl Default for GroupLabels {
    fn default() -> Self {
        Self {
            a: "A".to_string(),
            b: "B".to_string(),
        }
    }
}

impl GroupLabels {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
        }
    }

    pub fn label(&self, group: Group) -> &str {
        match group {
            Group::A => &self.a,
            Group::B => &self.b,
        }
    }

    /// Resolve a record's group label
    pub fn resolve(&self, label: &str) -> Option<Group> {
        if label == self.a {
            Some(Group::A)
        } else if label == self.b {
            Some(Group::B)
        } else {
            None
        }
    }

    /// Same labels with A and B exchanged
    pub fn swapped(&self) -> Self {
        Self {
            a: self.b.clone(),
            b: self.a.clone(),
        }
    }
}

/// Observations of one metric for both groups
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSamples {
    pub group_a: Vec<f64>,
    pub group_b: Vec<f64>,
}

impl MetricSamples {
    pub fn new(group_a: Vec<f64>, group_b: Vec<f64>) -> Self {
        Self { group_a, group_b }
    }

    pub fn get(&self, group: Group) -> &[f64] {
        match group {
            Group::A => &self.group_a,
            Group::B => &self.group_b,
        }
    }

    pub fn push(&mut self, group: Group, value: f64) {
        match group {
            Group::A => self.group_a.push(value),
            Group::B => self.group_b.push(value),
        }
    }

    /// Same samples with A and B exchanged
    pub fn swapped(&self) -> Self {
        Self {
            group_a: self.group_b.clone(),
            group_b: self.group_a.clone(),
        }
    }
}

/// Per-metric samples for one comparison run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleTable {
    metrics: BTreeMap<String, MetricSamples>,
}

impl SampleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) both samples for a metric
    pub fn insert(&mut self, metric: impl Into<String>, group_a: Vec<f64>, group_b: Vec<f64>) {
        self.metrics
            .insert(metric.into(), MetricSamples::new(group_a, group_b));
    }

    /// Builder-style `insert`
    pub fn with_metric(
        mut self,
        metric: impl Into<String>,
        group_a: Vec<f64>,
        group_b: Vec<f64>,
    ) -> Self {
        self.insert(metric, group_a, group_b);
        self
    }

    pub fn push(&mut self, metric: &str, group: Group, value: f64) {
        self.metrics
            .entry(metric.to_string())
            .or_default()
            .push(group, value);
    }

    pub fn get(&self, metric: &str) -> Option<&MetricSamples> {
        self.metrics.get(metric)
    }

    pub fn metric_names(&self) -> impl Iterator<Item = &str> {
        self.metrics.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Same table with A and B exchanged for every metric
    pub fn swapped(&self) -> Self {
        Self {
            metrics: self
                .metrics
                .iter()
                .map(|(name, samples)| (name.clone(), samples.swapped()))
                .collect(),
        }
    }

    /// Group labeled records into one table, ignoring segments
    pub fn from_observations(
        observations: &[Observation],
        labels: &GroupLabels,
    ) -> Result<Self, CompareError> {
        let mut table = SampleTable::new();
        for obs in observations {
            let group = obs.resolve_group(labels)?;
            table.push(&obs.metric, group, obs.value.as_f64());
        }
        Ok(table)
    }
}

/// Group labeled records into one table per segment (e.g. per department)
pub fn tables_by_segment(
    observations: &[Observation],
    labels: &GroupLabels,
) -> Result<BTreeMap<String, SampleTable>, CompareError> {
    let mut segments: BTreeMap<String, SampleTable> = BTreeMap::new();
    for obs in observations {
        let group = obs.resolve_group(labels)?;
        let segment = obs.segment.as_deref().unwrap_or(UNSEGMENTED);
        segments
            .entry(segment.to_string())
            .or_default()
            .push(&obs.metric, group, obs.value.as_f64());
    }
    Ok(segments)
}

/// Raw observation value: a number, or a boolean outcome mapped to 1/0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObservationValue {
    Flag(bool),
    Number(f64),
}

impl ObservationValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            ObservationValue::Flag(true) => 1.0,
            ObservationValue::Flag(false) => 0.0,
            ObservationValue::Number(v) => *v,
        }
    }
}

/// One pre-labeled record from the data-access layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
    pub group: String,
    pub metric: String,
    pub value: ObservationValue,
}

impl Observation {
    fn resolve_group(&self, labels: &GroupLabels) -> Result<Group, CompareError> {
        labels
            .resolve(&self.group)
            .ok_or_else(|| CompareError::UnknownGroup {
                metric: self.metric.clone(),
                group: self.group.clone(),
            })
    }
}

/// Observations file: `{"observations": [...]}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationSet {
    pub observations: Vec<Observation>,
}

impl ObservationSet {
    /// Load and parse observations from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            bail!("Observations file not found: {}", path_ref.display());
        }

        let contents =
            fs::read_to_string(path_ref).context("Failed to read observations file")?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).context("Invalid observations JSON")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(group: &str, metric: &str, value: ObservationValue) -> Observation {
        Observation {
            segment: None,
            group: group.to_string(),
            metric: metric.to_string(),
            value,
        }
    }

    #[test]
    fn test_group_labels_resolve() {
        let labels = GroupLabels::new("control", "sms_reminder");
        assert_eq!(labels.resolve("control"), Some(Group::A));
        assert_eq!(labels.resolve("sms_reminder"), Some(Group::B));
        assert_eq!(labels.resolve("A"), None);
        assert_eq!(labels.label(Group::B), "sms_reminder");
    }

    #[test]
    fn test_from_observations_groups_by_metric_and_label() {
        let records = vec![
            obs("A", "wait", ObservationValue::Number(10.0)),
            obs("B", "wait", ObservationValue::Number(20.0)),
            obs("A", "wait", ObservationValue::Number(12.0)),
            obs("B", "no_show", ObservationValue::Flag(true)),
            obs("A", "no_show", ObservationValue::Flag(false)),
        ];

        let table = SampleTable::from_observations(&records, &GroupLabels::default()).unwrap();
        assert_eq!(table.len(), 2);

        let wait = table.get("wait").unwrap();
        assert_eq!(wait.group_a, vec![10.0, 12.0]);
        assert_eq!(wait.group_b, vec![20.0]);

        let no_show = table.get("no_show").unwrap();
        assert_eq!(no_show.group_a, vec![0.0]);
        assert_eq!(no_show.group_b, vec![1.0]);
    }

    #[test]
    fn test_from_observations_rejects_unknown_group() {
        let records = vec![obs("C", "wait", ObservationValue::Number(1.0))];
        let err = SampleTable::from_observations(&records, &GroupLabels::default()).unwrap_err();
        assert_eq!(
            err,
            CompareError::UnknownGroup {
                metric: "wait".to_string(),
                group: "C".to_string()
            }
        );
    }

    #[test]
    fn test_tables_by_segment() {
        let mut cardiology = obs("A", "wait", ObservationValue::Number(30.0));
        cardiology.segment = Some("Cardiology".to_string());
        let unsegmented = obs("B", "wait", ObservationValue::Number(25.0));

        let segments =
            tables_by_segment(&[cardiology, unsegmented], &GroupLabels::default()).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(
            segments["Cardiology"].get("wait").unwrap().group_a,
            vec![30.0]
        );
        assert_eq!(segments[UNSEGMENTED].get("wait").unwrap().group_b, vec![25.0]);
    }

    #[test]
    fn test_observation_set_parses_numbers_and_flags() {
        let json = r#"{
            "observations": [
                {"group": "A", "metric": "wait", "value": 12.5},
                {"group": "B", "metric": "no_show", "value": true, "segment": "ER"}
            ]
        }"#;
        let set = ObservationSet::from_json_str(json).unwrap();
        assert_eq!(set.observations.len(), 2);
        assert_eq!(set.observations[0].value, ObservationValue::Number(12.5));
        assert_eq!(set.observations[1].value.as_f64(), 1.0);
        assert_eq!(set.observations[1].segment.as_deref(), Some("ER"));
    }

    #[test]
    fn test_observation_set_missing_file() {
        let result = ObservationSet::from_file("/nonexistent/observations.json");
        assert!(result.is_err());
    }

    #[test]
    fn test_swapped_table() {
        let table = SampleTable::new().with_metric("wait", vec![1.0, 2.0], vec![3.0, 4.0]);
        let swapped = table.swapped();
        assert_eq!(swapped.get("wait").unwrap().group_a, vec![3.0, 4.0]);
        assert_eq!(swapped.swapped(), table);
    }
}
