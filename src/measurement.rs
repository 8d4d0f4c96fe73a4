//! Measurement tables consumed by the ranking pipeline
//!
//! Rows come from the simulation-log parser as CSV. Two layouts are accepted:
//! the long layout (one row per configuration, axis value, cost metric and
//! tolerance) and the wide solver layout, which carries slow and fast step
//! counts side by side and is expanded into long rows on load.
//!
//! A run failed when its return code is exactly [`FAILED_RUN_CODE`]. Other
//! non-zero codes are solver warnings and the run is kept.

use crate::error::{RankError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::Read;
use std::path::Path;

/// A (method, controller) pair under test
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConfigKey {
    pub method: String,
    pub controller: String,
}

impl ConfigKey {
    pub fn new(method: impl Into<String>, controller: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            controller: controller.into(),
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} + {}", self.method, self.controller)
    }
}

/// One configuration's (error, work) samples across a tolerance sweep
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementSeries {
    pub key: ConfigKey,
    errors: Vec<f64>,
    works: Vec<f64>,
}

impl MeasurementSeries {
    /// Build a series, checking that the two sample vectors line up
    ///
    /// Errors must be positive and works non-negative; both must be finite.
    pub fn new(key: ConfigKey, errors: Vec<f64>, works: Vec<f64>) -> Result<Self> {
        if errors.len() != works.len() {
            return Err(RankError::InvalidInput(format!(
                "{}: {} error samples but {} work samples",
                key,
                errors.len(),
                works.len()
            )));
        }
        if errors.is_empty() {
            return Err(RankError::InvalidInput(format!("{}: empty series", key)));
        }
        if let Some(bad) = errors.iter().find(|e| !e.is_finite() || **e <= 0.0) {
            return Err(RankError::InvalidInput(format!(
                "{}: error sample {} is not a positive finite value",
                key, bad
            )));
        }
        if let Some(bad) = works.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(RankError::InvalidInput(format!(
                "{}: work sample {} is not a non-negative finite value",
                key, bad
            )));
        }

        Ok(Self { key, errors, works })
    }

    pub fn errors(&self) -> &[f64] {
        &self.errors
    }

    pub fn works(&self) -> &[f64] {
        &self.works
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Smallest error this configuration attained
    pub fn min_error(&self) -> f64 {
        self.errors.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Largest error this configuration attained
    pub fn max_error(&self) -> f64 {
        self.errors.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Solver return code of a failed run
pub const FAILED_RUN_CODE: i32 = 1;

/// One row of the long-layout measurement table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRow {
    pub method: String,
    pub controller: String,
    pub order: u32,
    pub axis_param: f64,
    pub metric: String,
    pub error: f64,
    pub work: f64,
    /// Solver return code; absent means the run succeeded
    #[serde(default)]
    pub return_code: Option<i32>,
}

impl MeasurementRow {
    pub fn key(&self) -> ConfigKey {
        ConfigKey::new(&self.method, &self.controller)
    }

    fn failed(&self) -> bool {
        self.return_code == Some(FAILED_RUN_CODE)
    }
}

/// Compare axis parameter values read from different sources (CSV vs TOML)
pub fn same_param(a: f64, b: f64) -> bool {
    a == b || (a - b).abs() <= 1e-12 * a.abs().max(b.abs())
}

/// Immutable in-memory measurement table for one problem
#[derive(Debug, Clone, Default)]
pub struct MeasurementTable {
    rows: Vec<MeasurementRow>,
}

impl MeasurementTable {
    pub fn new(rows: Vec<MeasurementRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[MeasurementRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Load a long-layout CSV file
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        use anyhow::Context;

        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open measurement file: {}", path.display()))?;
        Self::from_csv_reader(file)
            .with_context(|| format!("Failed to parse measurement file: {}", path.display()))
    }

    /// Parse long-layout CSV with headers
    /// `method,controller,order,axis_param,metric,error,work[,return_code]`
    pub fn from_csv_reader<R: Read>(reader: R) -> anyhow::Result<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut rows = Vec::new();

        for (index, result) in csv_reader.deserialize::<MeasurementRow>().enumerate() {
            let row = result.map_err(|e| anyhow::anyhow!("row {}: {}", index + 2, e))?;
            rows.push(row);
        }

        tracing::debug!(rows = rows.len(), "loaded long-layout measurement table");
        Ok(Self { rows })
    }

    /// Load a wide solver-layout CSV file
    pub fn from_solver_csv_path<P: AsRef<Path>>(
        path: P,
        layout: &SolverLayout,
    ) -> anyhow::Result<Self> {
        use anyhow::Context;

        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open solver results: {}", path.display()))?;
        Self::from_solver_csv_reader(file, layout)
            .with_context(|| format!("Failed to parse solver results: {}", path.display()))
    }

    /// Parse wide solver-layout CSV and expand each run into slow and fast rows
    pub fn from_solver_csv_reader<R: Read>(
        reader: R,
        layout: &SolverLayout,
    ) -> anyhow::Result<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let headers = csv_reader.headers()?.clone();

        let column = |name: &str| -> anyhow::Result<usize> {
            headers.iter().position(|h| h == name).ok_or_else(|| {
                anyhow::anyhow!(
                    "missing column '{}' (available: {:?})",
                    name,
                    headers.iter().collect::<Vec<_>>()
                )
            })
        };

        let method_col = column("mri_method")?;
        let control_col = column("control")?;
        let axis_col = column(&layout.axis_column)?;
        let rtol_col = column("rtol")?;
        let accuracy_col = column("Accuracy")?;
        let slow_steps_col = column("SlowSteps")?;
        let slow_fails_col = column("SlowFails")?;
        let fast_steps_col = column("FastSteps")?;
        let fast_fails_col = column("FastFails")?;
        let return_col = headers.iter().position(|h| h == "ReturnCode");

        let mut rows = Vec::new();
        for (index, result) in csv_reader.records().enumerate() {
            let line = index + 2;
            let record = result.map_err(|e| anyhow::anyhow!("line {}: {}", line, e))?;

            let text = |col: usize| -> anyhow::Result<&str> {
                record
                    .get(col)
                    .map(str::trim)
                    .ok_or_else(|| anyhow::anyhow!("line {}: short record", line))
            };
            let number = |col: usize| -> anyhow::Result<f64> {
                let raw = text(col)?;
                raw.parse::<f64>().map_err(|e| {
                    anyhow::anyhow!(
                        "line {}: column '{}' value '{}': {}",
                        line,
                        &headers[col],
                        raw,
                        e
                    )
                })
            };

            let run = SolverRun {
                method: text(method_col)?.to_string(),
                controller: text(control_col)?.to_string(),
                axis_param: number(axis_col)?,
                rtol: number(rtol_col)?,
                accuracy: number(accuracy_col)?,
                slow_steps: number(slow_steps_col)?,
                slow_fails: number(slow_fails_col)?,
                fast_steps: number(fast_steps_col)?,
                fast_fails: number(fast_fails_col)?,
                return_code: match return_col {
                    Some(col) => Some(number(col)? as i32),
                    None => None,
                },
            };

            let order = layout.method_orders.get(&run.method).copied().ok_or_else(|| {
                anyhow::anyhow!("line {}: no order class configured for method {}", line, run.method)
            })?;
            rows.extend(run.into_rows(order, &layout.slow_metric, &layout.fast_metric));
        }

        tracing::debug!(rows = rows.len(), "expanded solver-layout measurement table");
        Ok(Self { rows })
    }

    /// Drop every row of any (method, controller) pair with a failed run
    ///
    /// Returns the reduced table and the excluded pairs.
    pub fn without_failed_runs(&self) -> (Self, BTreeSet<ConfigKey>) {
        let failed: BTreeSet<ConfigKey> = self
            .rows
            .iter()
            .filter(|row| row.failed())
            .map(MeasurementRow::key)
            .collect();

        let rows = self
            .rows
            .iter()
            .filter(|row| !failed.contains(&row.key()))
            .cloned()
            .collect();

        (Self { rows }, failed)
    }

    /// Collect the series for one configuration at one axis value and metric
    ///
    /// Rows keep table order, one sample per tolerance.
    pub fn series(&self, axis_param: f64, metric: &str, key: &ConfigKey) -> Result<MeasurementSeries> {
        let (errors, works): (Vec<f64>, Vec<f64>) = self
            .rows
            .iter()
            .filter(|row| {
                row.method == key.method
                    && row.controller == key.controller
                    && row.metric == metric
                    && same_param(row.axis_param, axis_param)
            })
            .map(|row| (row.error, row.work))
            .unzip();

        if errors.is_empty() {
            return Err(RankError::MissingData {
                key: format!("axis={} metric={} {}", axis_param, metric, key),
            });
        }

        MeasurementSeries::new(key.clone(), errors, works)
    }

    /// Order class of a method, taken from its first row
    pub fn order_of(&self, method: &str) -> Option<u32> {
        self.rows
            .iter()
            .find(|row| row.method == method)
            .map(|row| row.order)
    }

    /// Distinct controllers in first-seen order
    pub fn controllers(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.rows
            .iter()
            .filter(|row| seen.insert(row.controller.as_str()))
            .map(|row| row.controller.clone())
            .collect()
    }
}

/// How to read a wide solver-layout table
#[derive(Debug, Clone)]
pub struct SolverLayout {
    /// Column holding the experiment axis (e.g. `omega`, `ep`)
    pub axis_column: String,
    /// Order class per method name
    pub method_orders: BTreeMap<String, u32>,
    pub slow_metric: String,
    pub fast_metric: String,
}

/// One solver invocation in the wide layout
#[derive(Debug, Clone, PartialEq)]
pub struct SolverRun {
    pub method: String,
    pub controller: String,
    pub axis_param: f64,
    pub rtol: f64,
    pub accuracy: f64,
    pub slow_steps: f64,
    pub slow_fails: f64,
    pub fast_steps: f64,
    pub fast_fails: f64,
    pub return_code: Option<i32>,
}

impl SolverRun {
    /// Expand into one slow-work row and one fast-work row
    ///
    /// The reported accuracy is relative to `rtol`, so the attained error is
    /// their product. Work counts attempted steps, failed ones included.
    pub fn into_rows(self, order: u32, slow_metric: &str, fast_metric: &str) -> [MeasurementRow; 2] {
        let error = self.accuracy * self.rtol;
        let row = |metric: &str, work: f64| MeasurementRow {
            method: self.method.clone(),
            controller: self.controller.clone(),
            order,
            axis_param: self.axis_param,
            metric: metric.to_string(),
            error,
            work,
            return_code: self.return_code,
        };

        [
            row(slow_metric, self.slow_steps + self.slow_fails),
            row(fast_metric, self.fast_steps + self.fast_fails),
        ]
    }
}
