#![no_main]

use libfuzzer_sys::fuzz_target;
use clinistat::comparison::compare_with_labels;
use clinistat::sample::{ObservationSet, SampleTable};
use clinistat::{Direction, GroupLabels, MetricSpec};

fuzz_target!(|data: &[u8]| {
    // Parse arbitrary bytes as an observations file, then run the engine.
    // Neither step may panic; invalid input must surface as an error.
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(set) = ObservationSet::from_json_str(input) else {
        return;
    };

    let labels = GroupLabels::default();
    let Ok(samples) = SampleTable::from_observations(&set.observations, &labels) else {
        return;
    };

    let specs = [
        MetricSpec::continuous("wait", Direction::LowerIsBetter),
        MetricSpec::continuous("score", Direction::HigherIsBetter).with_non_normal(true),
        MetricSpec::proportion("no_show", Direction::LowerIsBetter),
    ];

    if let Ok(report) = compare_with_labels(&specs, &samples, &labels) {
        for result in &report.metrics {
            assert!((0.0..=1.0).contains(&result.p_value));
        }
    }
});
