//! Clinistat - statistical A/B comparison for healthcare experiments
//!
//! This library compares two pre-labeled experiment groups on a set of
//! metrics (wait times, satisfaction scores, no-show rates, ...), selecting
//! the hypothesis test from each metric's value type and rolling the results
//! up into a descriptive verdict with findings and recommendations.
//!
//! ```
//! use clinistat::{compare, Direction, MetricSpec, SampleTable};
//!
//! let specs = vec![MetricSpec::proportion("no_show", Direction::LowerIsBetter)];
//! let samples = SampleTable::new().with_metric(
//!     "no_show",
//!     vec![0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
//!     vec![1.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0],
//! );
//!
//! let report = compare(&specs, &samples).unwrap();
//! assert!((0.0..=1.0).contains(&report.metrics[0].p_value));
//! ```

pub mod cli;
pub mod comparison;
pub mod config;
pub mod error;
pub mod json_output;
pub mod metric;
pub mod sample;

pub use comparison::{compare, compare_segments, compare_with_labels, ComparisonReport};
pub use error::CompareError;
pub use metric::{Direction, MetricSpec, ValueType};
pub use sample::{Group, GroupLabels, SampleTable};
