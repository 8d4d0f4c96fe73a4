// Integration Test Utilities
//
// Synthetic work-precision fixtures. Every configuration follows
// work = cost / sqrt(error), so a smaller cost is more efficient at every
// target error and expected ranks follow directly from the cost table.

#![allow(dead_code)]

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

pub const TOLERANCES: [f64; 4] = [1e-2, 1e-4, 1e-6, 1e-8];
pub const AXIS_VALUES: [f64; 2] = [50.0, 500.0];

/// (method, order, controller, cost at axis 50, cost at axis 500)
pub type Cost = (&'static str, u32, &'static str, f64, f64);

/// Second order: ERK22a+MRIHTol-I leads under both axis values; ERK22b+MRIHTol-I
/// is runner-up at 50 only, ERK22a+MRIDec-I at 500 only.
/// Third order: HTol < Dec < PI everywhere.
pub const KPR_COSTS: [Cost; 9] = [
    ("ERK22a", 2, "MRIHTol-I", 1.0, 1.0),
    ("ERK22b", 2, "MRIHTol-I", 2.0, 3.0),
    ("ERK33a", 3, "MRIHTol-I", 1.0, 1.0),
    ("ERK22a", 2, "MRIDec-I", 3.0, 2.0),
    ("ERK22b", 2, "MRIDec-I", 4.0, 4.0),
    ("ERK33a", 3, "MRIDec-I", 2.0, 2.0),
    ("ERK22a", 2, "MRIPI", 5.0, 5.0),
    ("ERK22b", 2, "MRIPI", 6.0, 6.0),
    ("ERK33a", 3, "MRIPI", 3.0, 3.0),
];

/// Long-layout measurement CSV for a cost table
///
/// Fast work is ten times slow work.
pub fn long_csv(costs: &[Cost]) -> String {
    let mut csv = String::from("method,controller,order,axis_param,metric,error,work,return_code\n");
    for &(method, order, controller, at_50, at_500) in costs {
        for (axis, cost) in AXIS_VALUES.iter().zip([at_50, at_500]) {
            for (metric, scale) in [("slow", 1.0), ("fast", 10.0)] {
                for error in TOLERANCES {
                    let work = scale * cost / error.sqrt();
                    let _ = writeln!(
                        csv,
                        "{},{},{},{},{},{:e},{},0",
                        method, controller, order, axis, metric, error, work
                    );
                }
            }
        }
    }
    csv
}

/// Wide solver-layout CSV for a cost table, axis column `ep`
///
/// Accuracy is 1, so the attained error equals `rtol`. Runs of `failing`
/// controllers report ReturnCode 1 on their loosest tolerance.
pub fn solver_csv(costs: &[Cost], axis_values: [f64; 2], failing: &[&str]) -> String {
    let mut csv = String::from(
        "mri_method,control,ep,rtol,Accuracy,SlowSteps,SlowFails,FastSteps,FastFails,ReturnCode\n",
    );
    for &(method, _, controller, at_first, at_second) in costs {
        for (axis, cost) in axis_values.iter().zip([at_first, at_second]) {
            for (index, rtol) in TOLERANCES.iter().enumerate() {
                let slow = cost / rtol.sqrt();
                let return_code = i32::from(index == 0 && failing.contains(&controller));
                let _ = writeln!(
                    csv,
                    "{},{},{:e},{:e},1.0,{},0,{},0,{}",
                    method,
                    controller,
                    axis,
                    rtol,
                    slow,
                    10.0 * slow,
                    return_code
                );
            }
        }
    }
    csv
}

/// Study file ranking `kpr.csv` in two order groups
pub fn kpr_study(cutoff_rank: f64) -> String {
    format!(
        r#"cutoff_rank = {cutoff_rank:.1}
grid_size = 20

[[problem]]
name = "kpr"
input = "kpr.csv"
axis_values = [50.0, 500.0]

[[order_group]]
name = "2nd"
methods = ["ERK22a", "ERK22b"]

[[order_group]]
name = "3rd"
methods = ["ERK33a"]

[[analysis]]
name = "controllers"
group_by = "controller"
split_by = "metric"
members = ["MRIHTol-I", "MRIDec-I"]
exclude_controllers = ["MRIPI"]
"#
    )
}

pub fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("write fixture");
    path
}

/// Write `kpr.csv` and `study.toml` into `dir`, returning the study path
pub fn write_kpr_study(dir: &Path, cutoff_rank: f64) -> PathBuf {
    write(dir, "kpr.csv", &long_csv(&KPR_COSTS));
    write(dir, "study.toml", &kpr_study(cutoff_rank))
}
