//! Efficiency ranking across a grid of target errors
//!
//! For every target error on a log-uniform grid, configurations are ordered by
//! the work they need to reach it. Each configuration's rank is averaged over
//! the grid, so a single extreme work value moves a configuration by at most
//! one rank at one grid point.

use crate::error::{RankError, Result};
use crate::interpolate::WorkCurve;
use crate::measurement::{ConfigKey, MeasurementSeries};
use serde::{Deserialize, Serialize};

/// Number of target errors when none is configured
pub const DEFAULT_GRID_SIZE: usize = 20;

/// Window used by callers that want a fixed range instead of the derived one
pub const DEFAULT_ERROR_WINDOW: ErrorWindow = ErrorWindow { lo: 1e-6, hi: 1e-2 };

/// Safety margins applied to the derived common error range
const LOWER_MARGIN: f64 = 1.05;
const UPPER_MARGIN: f64 = 0.95;

/// Closed range of target errors `[lo, hi]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorWindow {
    pub lo: f64,
    pub hi: f64,
}

impl ErrorWindow {
    pub fn new(lo: f64, hi: f64) -> Result<Self> {
        let window = Self { lo, hi };
        window.validate()?;
        Ok(window)
    }

    /// Range every configuration attains, narrowed by 5% on each side
    ///
    /// Lower bound is 1.05 × the largest per-configuration minimum error, upper
    /// bound 0.95 × the smallest per-configuration maximum error.
    ///
    /// # Errors
    /// `RangeOrder` when the attained ranges barely overlap and the narrowed
    /// window inverts; `InvalidInput` for an empty configuration list.
    pub fn common_to(curves: &[WorkCurve]) -> Result<Self> {
        if curves.is_empty() {
            return Err(RankError::InvalidInput(
                "cannot derive an error window without configurations".to_string(),
            ));
        }

        let largest_min = curves
            .iter()
            .map(WorkCurve::min_error)
            .fold(f64::NEG_INFINITY, f64::max);
        let smallest_max = curves
            .iter()
            .map(WorkCurve::max_error)
            .fold(f64::INFINITY, f64::min);

        Self::new(LOWER_MARGIN * largest_min, UPPER_MARGIN * smallest_max)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.lo > 0.0 && self.hi.is_finite()) {
            return Err(RankError::InvalidInput(format!(
                "error window [{:e}, {:e}] must be positive and finite",
                self.lo, self.hi
            )));
        }
        if self.lo > self.hi {
            return Err(RankError::RangeOrder {
                lo: self.lo,
                hi: self.hi,
            });
        }
        Ok(())
    }

    /// `size` target errors spaced uniformly in log10 from `lo` to `hi`
    ///
    /// Endpoints are returned exactly; a single-point grid is `[lo]`.
    pub fn grid(&self, size: usize) -> Result<Vec<f64>> {
        self.validate()?;
        if size < 1 {
            return Err(RankError::InvalidGridSize(size));
        }
        if size == 1 {
            return Ok(vec![self.lo]);
        }

        let (log_lo, log_hi) = (self.lo.log10(), self.hi.log10());
        let step = (log_hi - log_lo) / (size - 1) as f64;

        Ok((0..size)
            .map(|i| match i {
                0 => self.lo,
                i if i == size - 1 => self.hi,
                i => 10f64.powf(log_lo + step * i as f64),
            })
            .collect())
    }
}

/// A configuration and its grid-averaged rank (lower is more efficient)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedConfig {
    pub key: ConfigKey,
    pub average_rank: f64,
}

/// Rank configurations by efficiency, most efficient first
///
/// # Arguments
/// * `configs` - One measurement series per configuration
/// * `error_window` - Target error range; derived from the data when `None`
/// * `grid_size` - Number of log-uniform target errors (>= 1)
///
/// # Errors
/// `RangeOrder` for an inverted window (given or derived), `InvalidGridSize`
/// for `grid_size == 0`, `InvalidInput` for an empty configuration list.
///
/// # Example
/// ```
/// use effrank::measurement::{ConfigKey, MeasurementSeries};
/// use effrank::ranker::{rank_by_efficiency, ErrorWindow};
///
/// let cheap = MeasurementSeries::new(ConfigKey::new("A", "I"), vec![1e-2, 1e-6], vec![5.0, 50.0]).unwrap();
/// let dear = MeasurementSeries::new(ConfigKey::new("B", "I"), vec![1e-2, 1e-6], vec![9.0, 90.0]).unwrap();
///
/// let window = ErrorWindow::new(1e-5, 1e-3).unwrap();
/// let ranked = rank_by_efficiency(&[dear, cheap], Some(window), 8).unwrap();
/// assert_eq!(ranked[0].key.method, "A");
/// assert_eq!(ranked[0].average_rank, 1.0);
/// ```
pub fn rank_by_efficiency(
    configs: &[MeasurementSeries],
    error_window: Option<ErrorWindow>,
    grid_size: usize,
) -> Result<Vec<RankedConfig>> {
    if let Some(window) = &error_window {
        window.validate()?;
    }
    if grid_size < 1 {
        return Err(RankError::InvalidGridSize(grid_size));
    }
    if configs.is_empty() {
        return Err(RankError::InvalidInput(
            "no configurations to rank".to_string(),
        ));
    }

    let curves = configs
        .iter()
        .map(WorkCurve::from_series)
        .collect::<Result<Vec<_>>>()?;

    let window = match error_window {
        Some(window) => window,
        None => ErrorWindow::common_to(&curves)?,
    };
    let targets = window.grid(grid_size)?;

    tracing::debug!(
        configs = configs.len(),
        lo = window.lo,
        hi = window.hi,
        grid_size,
        "ranking by efficiency"
    );

    let mut rank_sums = vec![0.0_f64; configs.len()];
    let mut estimates: Vec<(usize, f64)> = Vec::with_capacity(configs.len());

    for target in &targets {
        estimates.clear();
        for (index, curve) in curves.iter().enumerate() {
            estimates.push((index, curve.estimate(*target)?));
        }

        // Stable sort: equal work keeps input order
        estimates.sort_by(|a, b| a.1.total_cmp(&b.1));

        for (position, (index, _)) in estimates.iter().enumerate() {
            rank_sums[*index] += (position as f64 + 1.0) / grid_size as f64;
        }
    }

    let mut ranked: Vec<RankedConfig> = configs
        .iter()
        .zip(rank_sums)
        .map(|(series, average_rank)| RankedConfig {
            key: series.key.clone(),
            average_rank,
        })
        .collect();
    ranked.sort_by(|a, b| a.average_rank.total_cmp(&b.average_rank));

    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(method: &str, errors: &[f64], works: &[f64]) -> MeasurementSeries {
        MeasurementSeries::new(ConfigKey::new(method, "MRIDec-I"), errors.to_vec(), works.to_vec())
            .unwrap()
    }

    #[test]
    fn test_single_point_grid_rank_ordering() {
        let configs = vec![
            series("ten", &[1e-2, 1e-4, 1e-6], &[1.0, 10.0, 100.0]),
            series("five", &[1e-2, 1e-4, 1e-6], &[1.0, 5.0, 100.0]),
            series("twenty", &[1e-2, 1e-4, 1e-6], &[1.0, 20.0, 100.0]),
        ];
        let window = ErrorWindow::new(1e-4, 1e-4).unwrap();

        let ranked = rank_by_efficiency(&configs, Some(window), 1).unwrap();

        let methods: Vec<&str> = ranked.iter().map(|r| r.key.method.as_str()).collect();
        assert_eq!(methods, vec!["five", "ten", "twenty"]);
        let ranks: Vec<f64> = ranked.iter().map(|r| r.average_rank).collect();
        assert_eq!(ranks, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_average_rank_splits_on_crossing_curves() {
        // "steep" is cheaper at loose errors, "flat" cheaper at tight errors
        let configs = vec![
            series("steep", &[1e-2, 1e-6], &[1.0, 1e4]),
            series("flat", &[1e-2, 1e-6], &[10.0, 1e3]),
        ];
        let window = ErrorWindow::new(1e-6, 1e-2).unwrap();

        let ranked = rank_by_efficiency(&configs, Some(window), 4).unwrap();

        // Ranks per target: 1e-2 steep, 1e-6 flat; each wins half the grid
        assert_eq!(ranked.len(), 2);
        assert!((ranked[0].average_rank - 1.5).abs() < 1e-12);
        assert!((ranked[1].average_rank - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_unreachable_target_ranks_last() {
        let configs = vec![
            series("coarse", &[1e-2, 1e-3], &[1.0, 2.0]),
            series("fine", &[1e-2, 1e-7], &[50.0, 500.0]),
        ];
        let window = ErrorWindow::new(1e-6, 1e-6).unwrap();

        let ranked = rank_by_efficiency(&configs, Some(window), 1).unwrap();
        assert_eq!(ranked[0].key.method, "fine");
        assert_eq!(ranked[1].key.method, "coarse");
    }

    #[test]
    fn test_ties_keep_input_order() {
        let configs = vec![
            series("first", &[1e-2, 1e-4], &[5.0, 50.0]),
            series("second", &[1e-2, 1e-4], &[5.0, 50.0]),
        ];

        let ranked = rank_by_efficiency(&configs, None, 4).unwrap();
        assert_eq!(ranked[0].key.method, "first");
        assert_eq!(ranked[0].average_rank, 1.0);
        assert_eq!(ranked[1].average_rank, 2.0);
    }

    #[test]
    fn test_inverted_window_is_range_order() {
        let configs = vec![series("a", &[1e-2, 1e-4], &[5.0, 50.0])];
        let window = ErrorWindow { lo: 1e-2, hi: 1e-4 };

        let err = rank_by_efficiency(&configs, Some(window), 5).unwrap_err();
        assert!(matches!(err, RankError::RangeOrder { .. }));
        assert!(ErrorWindow::new(1e-2, 1e-4).is_err());
    }

    #[test]
    fn test_zero_grid_is_invalid_grid_size() {
        let configs = vec![series("a", &[1e-2, 1e-4], &[5.0, 50.0])];
        let err = rank_by_efficiency(&configs, None, 0).unwrap_err();
        assert_eq!(err, RankError::InvalidGridSize(0));
    }

    #[test]
    fn test_empty_configs_is_invalid_input() {
        let err = rank_by_efficiency(&[], None, 5).unwrap_err();
        assert!(matches!(err, RankError::InvalidInput(_)));
    }

    #[test]
    fn test_derived_window_narrows_common_range() {
        let curves = vec![
            WorkCurve::from_samples(&[1e-2, 1e-6], &[1.0, 2.0]).unwrap(),
            WorkCurve::from_samples(&[1e-3, 1e-5], &[1.0, 2.0]).unwrap(),
        ];

        let window = ErrorWindow::common_to(&curves).unwrap();
        assert!((window.lo - 1.05e-5).abs() < 1e-18);
        assert!((window.hi - 0.95e-3).abs() < 1e-15);
    }

    #[test]
    fn test_derived_window_inverts_on_barely_overlapping_ranges() {
        // Ranges touch only at 1e-4; the 5% margins cross
        let configs = vec![
            series("loose", &[1e-2, 1e-4], &[1.0, 10.0]),
            series("tight", &[1e-4, 1e-6], &[10.0, 100.0]),
        ];

        let err = rank_by_efficiency(&configs, None, 5).unwrap_err();
        assert!(matches!(err, RankError::RangeOrder { .. }));
    }

    #[test]
    fn test_grid_is_log_uniform_with_exact_endpoints() {
        let window = ErrorWindow::new(1e-6, 1e-2).unwrap();
        let grid = window.grid(5).unwrap();

        assert_eq!(grid.len(), 5);
        assert_eq!(grid[0], 1e-6);
        assert_eq!(grid[4], 1e-2);
        assert!((grid[2].log10() + 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_average_rank_bounds() {
        let configs: Vec<MeasurementSeries> = (1..=4)
            .map(|k| {
                let scale = k as f64;
                series(&format!("m{}", k), &[1e-2, 1e-4, 1e-6], &[scale, 10.0 * scale, 100.0 / scale])
            })
            .collect();

        let grid_size = 7;
        let ranked = rank_by_efficiency(&configs, None, grid_size).unwrap();

        let total: f64 = ranked.iter().map(|r| r.average_rank).sum();
        // Ranks 1..=4 are handed out at every grid point
        assert!((total - 10.0).abs() < 1e-9);
        for r in &ranked {
            assert!(r.average_rank >= 1.0 - 1e-12 && r.average_rank <= 4.0 + 1e-12);
        }
        assert!(ranked.windows(2).all(|w| w[0].average_rank <= w[1].average_rank));
    }
}
