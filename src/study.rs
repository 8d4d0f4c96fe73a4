//! Study files: which problems, order groups and analyses to run
//!
//! A study is a TOML file. Pipeline settings sit at the top level, followed
//! by `[[problem]]`, `[[order_group]]` and `[[analysis]]` tables:
//!
//! ```toml
//! cutoff_rank = 12
//! metrics = ["slow", "fast"]
//!
//! [[problem]]
//! name = "kpr"
//! input = "kpr_results.csv"
//! axis_values = [50.0, 500.0]
//!
//! [[order_group]]
//! name = "2nd"
//! methods = ["ERK22a", "ERK22b"]
//!
//! [[analysis]]
//! name = "controllers_slow"
//! group_by = "controller"
//! metrics = ["slow"]
//! ```
//!
//! Relative input paths resolve against the study file's directory.

use crate::measurement::{ConfigKey, MeasurementTable, SolverLayout};
use crate::normalize::{
    average_all_group_scores, average_group_scores, classify, classify_split, one_way_anova,
    AnovaSummary, FamilyRule, GroupBy, GroupKey, NormalizerConfig, RowFilter, SummaryReport,
    ZScoreTable,
};
use crate::pipeline::{aggregate_ranks, combine, AggregationOutcome, AggregationUnit, OrderGroup, PipelineConfig};
use crate::rank_table::ConsolidatedRankTable;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Layout of a problem's measurement file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// One row per (configuration, axis value, metric, tolerance)
    #[default]
    Long,
    /// One row per solver run with step and failure counters
    Solver,
}

/// One test problem and where its measurements live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemSpec {
    pub name: String,
    pub input: PathBuf,
    #[serde(default)]
    pub format: InputFormat,
    /// Axis column of a solver-format file (e.g. `omega`)
    #[serde(default)]
    pub axis_column: Option<String>,
    pub axis_values: [f64; 2],
    /// Controllers to rank; all controllers of the file when empty
    #[serde(default)]
    pub controllers: Vec<String>,
}

/// One z-score analysis over the combined rank table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSpec {
    pub name: String,
    pub group_by: GroupBy,
    /// Classify each value of this column as its own slice
    #[serde(default)]
    pub split_by: Option<GroupBy>,
    /// Prefix rules for `group_by = "family"`
    #[serde(default)]
    pub families: Vec<FamilyRule>,
    #[serde(flatten)]
    pub filter: RowFilter,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Groups listed in the summary; every group of any slice when empty
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Also run a one-way ANOVA over the same groups
    #[serde(default)]
    pub anova: bool,
}

fn default_threshold() -> f64 {
    NormalizerConfig::default().threshold
}

impl AnalysisSpec {
    pub fn group_key(&self) -> GroupKey {
        GroupKey::from_group_by(self.group_by, self.families.clone())
    }

    fn heading(&self) -> &'static str {
        match self.group_by {
            GroupBy::Problem => "Problem",
            GroupBy::Controller => "Controller",
            GroupBy::Method => "Method",
            GroupBy::Family => "Controller family",
            GroupBy::Metric => "Metric",
            GroupBy::Order => "Order",
            GroupBy::Param => "Parameter",
        }
    }
}

/// A complete study definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Study {
    #[serde(flatten)]
    pub pipeline: PipelineConfig,

    /// Drop (method, controller) pairs with any failed run before ranking
    #[serde(default)]
    pub exclude_failed_runs: bool,

    /// Order class per method, needed by solver-format inputs
    #[serde(default)]
    pub method_orders: BTreeMap<String, u32>,

    #[serde(default, rename = "problem")]
    pub problems: Vec<ProblemSpec>,

    #[serde(default, rename = "order_group")]
    pub order_groups: Vec<OrderGroup>,

    #[serde(default, rename = "analysis")]
    pub analyses: Vec<AnalysisSpec>,
}

impl Study {
    pub fn from_toml(content: &str) -> Result<Self> {
        let study: Study = toml::from_str(content).context("Failed to parse study TOML")?;
        study.validate()?;
        Ok(study)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read study file: {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Invalid study file: {}", path.display()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.pipeline.validate()?;

        if self.problems.is_empty() {
            anyhow::bail!("Study defines no [[problem]]");
        }
        if self.order_groups.is_empty() {
            anyhow::bail!("Study defines no [[order_group]]");
        }

        for problem in &self.problems {
            if problem.format == InputFormat::Solver && problem.axis_column.is_none() {
                anyhow::bail!(
                    "Problem '{}' uses the solver format but sets no axis_column",
                    problem.name
                );
            }
        }

        for group in &self.order_groups {
            if group.methods.is_empty() {
                anyhow::bail!("Order group '{}' lists no methods", group.name);
            }
        }

        for analysis in &self.analyses {
            NormalizerConfig {
                threshold: analysis.threshold,
            }
            .validate()
            .with_context(|| format!("Analysis '{}'", analysis.name))?;
        }

        Ok(())
    }

    fn load_problem(&self, problem: &ProblemSpec, base_dir: &Path) -> Result<MeasurementTable> {
        let path = if problem.input.is_absolute() {
            problem.input.clone()
        } else {
            base_dir.join(&problem.input)
        };

        match problem.format {
            InputFormat::Long => MeasurementTable::from_csv_path(&path),
            InputFormat::Solver => {
                let layout = SolverLayout {
                    axis_column: problem.axis_column.clone().unwrap_or_default(),
                    method_orders: self.method_orders.clone(),
                    slow_metric: self.pipeline.metrics[0].clone(),
                    fast_metric: self.pipeline.metrics[1].clone(),
                };
                MeasurementTable::from_solver_csv_path(&path, &layout)
            }
        }
    }
}

/// Classified slices and their summary for one analysis
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub name: String,
    pub slices: Vec<(String, ZScoreTable)>,
    pub summary: SummaryReport,
    pub anova: Option<AnovaSummary>,
}

/// Everything a study run produces
#[derive(Debug, Clone, Serialize)]
pub struct StudyOutcome {
    /// One outcome per (problem, order group), problem-major
    pub units: Vec<AggregationOutcome>,
    /// All rank tables concatenated
    pub combined: ConsolidatedRankTable,
    pub analyses: Vec<AnalysisOutcome>,
}

impl StudyOutcome {
    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        let mut report = String::new();
        for unit in &self.units {
            report.push_str(&unit.to_report_string());
            report.push('\n');
        }
        for analysis in &self.analyses {
            report.push_str(&analysis.summary.to_report_string());
            if let Some(anova) = &analysis.anova {
                report.push('\n');
                report.push_str(&anova.to_report_string());
            }
            report.push('\n');
        }
        report
    }
}

/// Run every problem × order group unit, then every analysis
///
/// Any failing unit or analysis aborts the study; nothing partial is returned.
pub fn run_study(study: &Study, base_dir: &Path) -> Result<StudyOutcome> {
    study.validate()?;

    let mut units = Vec::with_capacity(study.problems.len() * study.order_groups.len());

    for problem in &study.problems {
        let loaded = study
            .load_problem(problem, base_dir)
            .with_context(|| format!("Failed to load problem '{}'", problem.name))?;

        let (table, excluded) = if study.exclude_failed_runs {
            loaded.without_failed_runs()
        } else {
            (loaded, BTreeSet::<ConfigKey>::new())
        };
        for key in &excluded {
            tracing::warn!(problem = %problem.name, pair = %key, "excluding pair with failed runs");
        }

        let controllers = if problem.controllers.is_empty() {
            table.controllers()
        } else {
            problem.controllers.clone()
        };

        for order_group in &study.order_groups {
            let unit = AggregationUnit {
                problem: problem.name.clone(),
                order_group: order_group.clone(),
                axis_values: problem.axis_values,
                controllers: controllers.clone(),
                excluded: excluded.clone(),
            };
            let outcome = aggregate_ranks(&table, &unit, &study.pipeline).with_context(|| {
                format!(
                    "Rank aggregation failed for problem '{}', order group '{}'",
                    problem.name, order_group.name
                )
            })?;
            units.push(outcome);
        }
    }

    let combined = combine(&units);
    tracing::info!(
        units = units.len(),
        records = combined.len(),
        "combined rank table"
    );

    let analyses = study
        .analyses
        .iter()
        .map(|analysis| {
            run_analysis(&combined, analysis)
                .with_context(|| format!("Analysis '{}' failed", analysis.name))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(StudyOutcome {
        units,
        combined,
        analyses,
    })
}

/// Classify the combined table for one analysis and summarize it
pub fn run_analysis(combined: &ConsolidatedRankTable, analysis: &AnalysisSpec) -> Result<AnalysisOutcome> {
    let group_key = analysis.group_key();

    let slices = match analysis.split_by {
        Some(split_by) => classify_split(
            combined,
            &analysis.filter,
            &GroupKey::from_group_by(split_by, analysis.families.clone()),
            &group_key,
            analysis.threshold,
        )?,
        None => vec![(
            analysis.name.clone(),
            classify(combined, &analysis.filter, &group_key, analysis.threshold)?,
        )],
    };

    let tables: Vec<ZScoreTable> = slices.iter().map(|(_, table)| table.clone()).collect();
    let averages = if analysis.members.is_empty() {
        average_all_group_scores(&tables)?
    } else {
        average_group_scores(&tables, &analysis.members)?
    };

    let title = analysis.title.clone().unwrap_or_else(|| {
        format!(
            "Average z-scores by {} for analysis '{}' across {} slice(s).",
            group_key,
            analysis.name,
            slices.len()
        )
    });
    let summary = SummaryReport::new(title, analysis.heading()).with_rows(averages);

    let anova = if analysis.anova {
        Some(one_way_anova(combined, &analysis.filter, &group_key)?)
    } else {
        None
    };

    tracing::info!(
        analysis = %analysis.name,
        slices = slices.len(),
        members = summary.rows.len(),
        "analysis complete"
    );

    Ok(AnalysisOutcome {
        name: analysis.name.clone(),
        slices,
        summary,
        anova,
    })
}
