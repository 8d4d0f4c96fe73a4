#![no_main]

use effrank::measurement::{ConfigKey, MeasurementTable};
use effrank::ranker::rank_by_efficiency;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary CSV must parse or fail cleanly, never panic
    let Ok(table) = MeasurementTable::from_csv_reader(data) else {
        return;
    };

    // Whatever parsed must rank or fail cleanly too
    let mut series = Vec::new();
    for row in table.rows().iter().take(16) {
        let key = ConfigKey::new(&row.method, &row.controller);
        if let Ok(s) = table.series(row.axis_param, &row.metric, &key) {
            series.push(s);
        }
    }
    let _ = rank_by_efficiency(&series, None, 8);
});
