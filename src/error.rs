//! Error taxonomy for the ranking and classification core
//!
//! Every variant describes a deterministic data-quality problem. Nothing here is
//! retried: the error propagates to the caller and the run produces no output.

use thiserror::Error;

/// Errors raised by interpolation, ranking, aggregation and normalization
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RankError {
    /// Malformed measurement series or empty input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error window bounds are out of order
    #[error("Error window out of order: lower bound {lo:e} exceeds upper bound {hi:e}")]
    RangeOrder { lo: f64, hi: f64 },

    /// Target-error grid must contain at least one point
    #[error("Invalid grid size {0}: at least one target error is required")]
    InvalidGridSize(usize),

    /// An expected configuration has no rows in the measurement table
    #[error("Missing data: no measurements for {key}")]
    MissingData { key: String },

    /// Baseline standard deviation is zero or undefined
    #[error("Degenerate distribution: {0}")]
    DegenerateDistribution(String),
}

pub type Result<T> = std::result::Result<T, RankError>;
