// Test selection: one dispatch keyed by the metric's value type
//
//   continuous               -> Welch's t-test
//   continuous + non_normal  -> Mann-Whitney U
//   proportion               -> chi-square (Yates), or Fisher's exact test
//                               when any expected cell count is below 5
//
// The policy is fixed; callers influence it only through the MetricSpec.

use crate::comparison::hypothesis::{
    chi_square_independence, fisher_exact, mann_whitney_u, welch_t_test, ContingencyTable,
    TestOutcome,
};
use crate::metric::{MetricSpec, ValueType};

/// Smallest expected cell count for which the chi-square approximation is used
pub const MIN_EXPECTED_CELL_COUNT: f64 = 5.0;

/// Select and run the hypothesis test for one metric
pub fn run_selected_test(spec: &MetricSpec, a: &[f64], b: &[f64]) -> TestOutcome {
    match spec.value_type {
        ValueType::Continuous if spec.non_normal => mann_whitney_u(a, b),
        ValueType::Continuous => welch_t_test(a, b),
        ValueType::Proportion => {
            if spec.non_normal {
                tracing::debug!(
                    "Ignoring non_normal hint for proportion metric {}",
                    spec.name
                );
            }
            let table = ContingencyTable::from_indicators(a, b);
            let min_expected = table.min_expected();
            if min_expected < MIN_EXPECTED_CELL_COUNT {
                tracing::warn!(
                    "Sparse table for {} (min expected count {:.2}), using Fisher's exact test",
                    spec.name,
                    min_expected
                );
                fisher_exact(&table)
            } else {
                chi_square_independence(&table)
            }
        }
    }
}
