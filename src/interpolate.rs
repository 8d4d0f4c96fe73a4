//! Work-to-reach-error interpolation
//!
//! A configuration's tolerance sweep gives a scatter of (error, work) samples.
//! Work needed for an arbitrary target error is read off the piecewise-linear
//! curve through those samples in log10-log10 space. Targets below the best
//! attained error are unreachable and cost [`WORK_SENTINEL`].

use crate::error::{RankError, Result};
use crate::measurement::MeasurementSeries;

/// Work charged for a target error the configuration never reached
pub const WORK_SENTINEL: f64 = 1e20;

/// Estimate the work needed to reach `target_error`
///
/// # Errors
/// `InvalidInput` when the two slices differ in length, are empty, contain
/// non-positive errors / negative works, or the target is not positive.
///
/// # Example
/// ```
/// use effrank::interpolate::{estimate_work, WORK_SENTINEL};
///
/// let errors = [1e-2, 1e-4];
/// let works = [5.0, 50.0];
/// assert_eq!(estimate_work(&errors, &works, 1e-2).unwrap(), 5.0);
/// assert_eq!(estimate_work(&errors, &works, 1e-6).unwrap(), WORK_SENTINEL);
/// ```
pub fn estimate_work(errors: &[f64], works: &[f64], target_error: f64) -> Result<f64> {
    WorkCurve::from_samples(errors, works)?.estimate(target_error)
}

/// Samples sorted by ascending error, ready for repeated lookups
#[derive(Debug, Clone)]
pub struct WorkCurve {
    /// (log10 error, log10 work, work), ascending by error
    points: Vec<(f64, f64, f64)>,
    errors: Vec<f64>,
}

impl WorkCurve {
    pub fn from_series(series: &MeasurementSeries) -> Result<Self> {
        Self::from_samples(series.errors(), series.works())
    }

    pub fn from_samples(errors: &[f64], works: &[f64]) -> Result<Self> {
        if errors.len() != works.len() {
            return Err(RankError::InvalidInput(format!(
                "errors and works have differing numbers of entries ({} vs {})",
                errors.len(),
                works.len()
            )));
        }
        if errors.is_empty() {
            return Err(RankError::InvalidInput(
                "cannot interpolate an empty series".to_string(),
            ));
        }
        if errors.iter().any(|e| !e.is_finite() || *e <= 0.0) {
            return Err(RankError::InvalidInput(
                "error samples must be positive and finite".to_string(),
            ));
        }
        if works.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(RankError::InvalidInput(
                "work samples must be non-negative and finite".to_string(),
            ));
        }

        let mut pairs: Vec<(f64, f64)> = errors.iter().copied().zip(works.iter().copied()).collect();
        // Stable: duplicate errors keep input order
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let errors = pairs.iter().map(|(e, _)| *e).collect();
        let points = pairs
            .into_iter()
            .map(|(e, w)| (e.log10(), w.log10(), w))
            .collect();

        Ok(Self { points, errors })
    }

    /// Smallest attained error
    pub fn min_error(&self) -> f64 {
        self.errors[0]
    }

    /// Largest attained error
    pub fn max_error(&self) -> f64 {
        self.errors[self.errors.len() - 1]
    }

    /// Work needed to reach `target_error`
    pub fn estimate(&self, target_error: f64) -> Result<f64> {
        if !target_error.is_finite() || target_error <= 0.0 {
            return Err(RankError::InvalidInput(format!(
                "target error must be positive and finite, got {}",
                target_error
            )));
        }

        if target_error < self.min_error() {
            return Ok(WORK_SENTINEL);
        }

        // Exact sample hit returns the sample, not a log/exp round trip
        if let Some(index) = self.errors.iter().position(|e| *e == target_error) {
            return Ok(self.points[index].2);
        }

        // No extrapolation past the loosest sample
        if target_error > self.max_error() {
            return Ok(self.points[self.points.len() - 1].2);
        }

        let upper = self.errors.partition_point(|e| *e < target_error);
        let (x0, y0, _) = self.points[upper - 1];
        let (x1, y1, _) = self.points[upper];

        let t = (target_error.log10() - x0) / (x1 - x0);
        // Weighted form keeps log10(0) = -inf from producing NaN
        let log_work = y0 * (1.0 - t) + y1 * t;

        Ok(10f64.powf(log_work))
    }
}
