// Configuration for z-score classification

use crate::error::{RankError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for z-score classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// |z| above which a group is classified best or worse
    ///
    /// Default: 1.0 (one standard deviation)
    pub threshold: f64,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self { threshold: 1.0 }
    }
}

impl NormalizerConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.threshold >= 0.0) || !self.threshold.is_finite() {
            return Err(RankError::InvalidInput(format!(
                "threshold must be a non-negative number, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}
