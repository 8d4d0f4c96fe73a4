//! CLI argument parsing for effrank

use crate::normalize::{FamilyRule, GroupBy, GroupKey, RowFilter};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for results printed on stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
}

/// Column that defines groups (or slices)
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GroupByArg {
    Problem,
    Controller,
    Method,
    /// Controller families by name prefix (see --family)
    Family,
    Metric,
    Order,
    Param,
}

impl From<GroupByArg> for GroupBy {
    fn from(arg: GroupByArg) -> Self {
        match arg {
            GroupByArg::Problem => GroupBy::Problem,
            GroupByArg::Controller => GroupBy::Controller,
            GroupByArg::Method => GroupBy::Method,
            GroupByArg::Family => GroupBy::Family,
            GroupByArg::Metric => GroupBy::Metric,
            GroupByArg::Order => GroupBy::Order,
            GroupByArg::Param => GroupBy::Param,
        }
    }
}

fn parse_family_rule(s: &str) -> Result<FamilyRule, String> {
    s.parse().map_err(|e: crate::error::RankError| e.to_string())
}

#[derive(Parser, Debug)]
#[command(name = "effrank")]
#[command(version)]
#[command(
    about = "Rank solver configurations by work-precision efficiency and classify them by z-score",
    long_about = None
)]
pub struct Cli {
    /// Enable debug tracing output to stderr
    #[arg(long = "debug", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rank every problem and order group of a study, then run its analyses
    Rank(RankArgs),
    /// Compute group z-scores over a slice of a rank table
    Classify(ClassifyArgs),
    /// One-way ANOVA of average ranks across groups
    Anova(AnovaArgs),
}

#[derive(Args, Debug)]
pub struct RankArgs {
    /// Study definition (TOML)
    #[arg(long = "study", value_name = "FILE")]
    pub study: PathBuf,

    /// Directory for rank tables, retained pairs and z-score files
    #[arg(long = "out-dir", value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Format of the result printed on stdout
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Rank table, grouping and row selection shared by classify and anova
#[derive(Args, Debug)]
pub struct SliceArgs {
    /// Rank table CSV (e.g. rank_stats.csv written by `rank`)
    #[arg(long = "ranks", value_name = "FILE")]
    pub ranks: PathBuf,

    /// Column whose values form the groups
    #[arg(long = "group-by", value_enum)]
    pub group_by: GroupByArg,

    /// Controller family rule PREFIX=FAMILY (repeatable, first match wins)
    #[arg(long = "family", value_name = "PREFIX=FAMILY", value_parser = parse_family_rule)]
    pub families: Vec<FamilyRule>,

    /// Keep only this problem (repeatable)
    #[arg(long = "problem", value_name = "PROBLEM")]
    pub problems: Vec<String>,

    /// Keep only this metric (repeatable)
    #[arg(long = "metric", value_name = "METRIC")]
    pub metrics: Vec<String>,

    /// Keep only this method order (repeatable)
    #[arg(long = "order", value_name = "ORDER")]
    pub orders: Vec<u32>,

    /// Keep only this axis value (repeatable)
    #[arg(long = "param", value_name = "VALUE")]
    pub params: Vec<f64>,

    /// Keep only this method (repeatable)
    #[arg(long = "method", value_name = "METHOD")]
    pub methods: Vec<String>,

    /// Keep only this controller (repeatable)
    #[arg(long = "controller", value_name = "CONTROLLER")]
    pub controllers: Vec<String>,

    /// Drop this method (repeatable)
    #[arg(long = "exclude-method", value_name = "METHOD")]
    pub exclude_methods: Vec<String>,

    /// Drop this controller (repeatable)
    #[arg(long = "exclude-controller", value_name = "CONTROLLER")]
    pub exclude_controllers: Vec<String>,
}

impl SliceArgs {
    pub fn filter(&self) -> RowFilter {
        RowFilter {
            problems: self.problems.clone(),
            metrics: self.metrics.clone(),
            orders: self.orders.clone(),
            params: self.params.clone(),
            methods: self.methods.clone(),
            controllers: self.controllers.clone(),
            exclude_methods: self.exclude_methods.clone(),
            exclude_controllers: self.exclude_controllers.clone(),
        }
    }

    pub fn group_key(&self) -> GroupKey {
        GroupKey::from_group_by(self.group_by.into(), self.families.clone())
    }
}

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    #[command(flatten)]
    pub slice: SliceArgs,

    /// Classify each value of this column independently
    #[arg(long = "split-by", value_enum)]
    pub split_by: Option<GroupByArg>,

    /// |z| beyond which a group is best or worse
    #[arg(long = "threshold", default_value = "1.0")]
    pub threshold: f64,

    /// Write the z-score CSV here instead of printing a report
    #[arg(long = "out", value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Format of the result printed on stdout
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct AnovaArgs {
    #[command(flatten)]
    pub slice: SliceArgs,

    /// Format of the result printed on stdout (csv prints text)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,
}
