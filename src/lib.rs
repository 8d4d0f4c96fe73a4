//! effrank - Work-precision efficiency ranking and z-score classification
//!
//! This library ranks solver configurations (method + step-size controller
//! pairs) by how little work they need to reach a range of target errors,
//! keeps the configurations that stay efficient across an experiment
//! parameter, and classifies groups of configurations by z-score.
//!
//! Stages, each a pure function of an immutable input:
//!
//! 1. [`interpolate`]: work needed for a target error (log-log interpolation)
//! 2. [`ranker`]: average rank over a log-uniform grid of target errors
//! 3. [`pipeline`]: four orderings per problem and order group, cutoff, intersection
//! 4. [`normalize`]: z-scores, classification, cross-slice summaries, ANOVA
//!
//! [`study`] wires the stages together from a TOML study file.

pub mod cli;
pub mod csv_output;
pub mod error;
pub mod interpolate;
pub mod json_output;
pub mod measurement;
pub mod normalize;
pub mod pipeline;
pub mod rank_table;
pub mod ranker;
pub mod study;

pub use error::{RankError, Result};
