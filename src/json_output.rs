//! JSON output format for study results
//!
//! `rank --format json` prints one [`JsonOutput`] document on stdout.

use crate::measurement::ConfigKey;
use crate::normalize::AnovaSummary;
use crate::rank_table::RankRecord;
use crate::study::{AnalysisOutcome, StudyOutcome};
use serde::{Deserialize, Serialize};

/// A retained (method, controller) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonPair {
    pub method: String,
    pub controller: String,
}

impl From<&ConfigKey> for JsonPair {
    fn from(key: &ConfigKey) -> Self {
        Self {
            method: key.method.clone(),
            controller: key.controller.clone(),
        }
    }
}

/// Pairs retained for one cost metric
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRetained {
    pub metric: String,
    pub pairs: Vec<JsonPair>,
}

/// One (problem, order group) aggregation unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonUnit {
    pub problem: String,
    pub order_group: String,
    pub axis_values: [f64; 2],
    pub retained: Vec<JsonRetained>,
    pub ranks: Vec<RankRecord>,
}

/// A group's z-score within one slice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonGroupScore {
    pub group: String,
    pub z_score: f64,
    pub status: String,
}

/// One classified slice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSlice {
    pub label: String,
    pub rows: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub groups: Vec<JsonGroupScore>,
}

/// One analysis with its slice-averaged z-scores
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonAnalysis {
    pub name: String,
    pub grouped_by: String,
    pub slices: Vec<JsonSlice>,
    /// (group, z-score averaged over slices)
    pub average_z_scores: Vec<(String, f64)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anova: Option<JsonAnova>,
}

/// One-way ANOVA result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonAnova {
    pub statistic: f64,
    pub pvalue: f64,
    pub df_between: usize,
    pub df_within: usize,
}

impl From<&AnovaSummary> for JsonAnova {
    fn from(summary: &AnovaSummary) -> Self {
        Self {
            statistic: summary.statistic,
            pvalue: summary.pvalue,
            df_between: summary.df_between,
            df_within: summary.df_within,
        }
    }
}

/// Summary counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSummary {
    pub units: usize,
    pub rank_records: usize,
    pub analyses: usize,
}

/// Root JSON output structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonOutput {
    /// Format version identifier
    pub version: String,
    /// Format name
    pub format: String,
    pub units: Vec<JsonUnit>,
    pub analyses: Vec<JsonAnalysis>,
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Create an empty JSON output structure
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "effrank-json-v1".to_string(),
            units: Vec::new(),
            analyses: Vec::new(),
            summary: JsonSummary {
                units: 0,
                rank_records: 0,
                analyses: 0,
            },
        }
    }

    /// Build the document for a finished study
    pub fn from_study(outcome: &StudyOutcome) -> Self {
        let mut output = Self::new();

        for unit in &outcome.units {
            output.units.push(JsonUnit {
                problem: unit.problem.clone(),
                order_group: unit.order_group.clone(),
                axis_values: unit.axis_values,
                retained: unit
                    .retained
                    .iter()
                    .map(|(metric, pairs)| JsonRetained {
                        metric: metric.clone(),
                        pairs: pairs.iter().map(JsonPair::from).collect(),
                    })
                    .collect(),
                ranks: unit.rank_table.records().to_vec(),
            });
        }

        for analysis in &outcome.analyses {
            output.add_analysis(analysis);
        }

        output.summary = JsonSummary {
            units: output.units.len(),
            rank_records: outcome.combined.len(),
            analyses: output.analyses.len(),
        };
        output
    }

    fn add_analysis(&mut self, analysis: &AnalysisOutcome) {
        let slices = analysis
            .slices
            .iter()
            .map(|(label, table)| JsonSlice {
                label: label.clone(),
                rows: table.len(),
                mean: table.mean,
                std_dev: table.std_dev,
                groups: table
                    .records
                    .iter()
                    .fold(Vec::<JsonGroupScore>::new(), |mut groups, record| {
                        if !groups.iter().any(|g| g.group == record.group) {
                            groups.push(JsonGroupScore {
                                group: record.group.clone(),
                                z_score: record.z_score,
                                status: record.status.to_string(),
                            });
                        }
                        groups
                    }),
            })
            .collect();

        let grouped_by = analysis
            .slices
            .first()
            .map(|(_, table)| table.grouped_by.clone())
            .unwrap_or_default();

        self.analyses.push(JsonAnalysis {
            name: analysis.name.clone(),
            grouped_by,
            slices,
            average_z_scores: analysis.summary.rows.clone(),
            anova: analysis.anova.as_ref().map(JsonAnova::from),
        });
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}
