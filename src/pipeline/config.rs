// Configuration for rank aggregation

use crate::error::{RankError, Result};
use crate::ranker::{ErrorWindow, DEFAULT_ERROR_WINDOW, DEFAULT_GRID_SIZE};
use serde::{Deserialize, Serialize};

/// Configuration for rank aggregation
///
/// # Example
/// ```
/// use effrank::pipeline::PipelineConfig;
///
/// let config = PipelineConfig::default();
/// assert_eq!(config.cutoff_rank, 12.0);
/// assert_eq!(config.grid_size, 20);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Highest average rank that still counts as efficient
    ///
    /// Default: 12.0
    pub cutoff_rank: f64,

    /// Number of log-uniform target errors per ranking
    ///
    /// Default: 20
    pub grid_size: usize,

    /// Fixed target-error window `[lo, hi]`
    ///
    /// Default: `[1e-6, 1e-2]`
    pub error_window: [f64; 2],

    /// Ignore `error_window` and derive the range every configuration attains
    ///
    /// Default: false
    pub derive_error_window: bool,

    /// Labels of the two cost metrics, slow then fast
    ///
    /// Default: `["slow", "fast"]`
    pub metrics: [String; 2],
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cutoff_rank: 12.0,
            grid_size: DEFAULT_GRID_SIZE,
            error_window: [DEFAULT_ERROR_WINDOW.lo, DEFAULT_ERROR_WINDOW.hi],
            derive_error_window: false,
            metrics: ["slow".to_string(), "fast".to_string()],
        }
    }
}

impl PipelineConfig {
    /// Window handed to the ranker; `None` asks it to derive one
    pub fn window(&self) -> Option<ErrorWindow> {
        if self.derive_error_window {
            None
        } else {
            Some(ErrorWindow {
                lo: self.error_window[0],
                hi: self.error_window[1],
            })
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.cutoff_rank > 0.0) {
            return Err(RankError::InvalidInput(format!(
                "cutoff_rank must be positive, got {}",
                self.cutoff_rank
            )));
        }

        if self.grid_size < 1 {
            return Err(RankError::InvalidGridSize(self.grid_size));
        }

        if let Some(window) = self.window() {
            window.validate()?;
        }

        if self.metrics[0] == self.metrics[1] {
            return Err(RankError::InvalidInput(format!(
                "the two cost metrics must differ, both are '{}'",
                self.metrics[0]
            )));
        }

        Ok(())
    }
}
