// Z-score computation and best/worse/intermediate classification

use crate::error::{RankError, Result};
use crate::normalize::config::NormalizerConfig;
use crate::normalize::filter::{GroupKey, RowFilter};
use crate::rank_table::{ConsolidatedRankTable, RankRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Efficiency class of a group relative to its slice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Best,
    Worse,
    Intermediate,
}

impl Classification {
    /// `z` strictly beyond `threshold` is best (below) or worse (above)
    pub fn from_z(z_score: f64, threshold: f64) -> Self {
        if z_score < -threshold {
            Classification::Best
        } else if z_score > threshold {
            Classification::Worse
        } else {
            Classification::Intermediate
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Classification::Best => "best",
            Classification::Worse => "worse",
            Classification::Intermediate => "intermediate",
        };
        f.write_str(label)
    }
}

/// A rank record with its group's z-score and classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZScoreRecord {
    pub metric: String,
    pub order: u32,
    pub axis_param: f64,
    pub method: String,
    pub controller: String,
    pub group: String,
    pub average_rank: f64,
    pub z_score: f64,
    pub status: Classification,
}

/// One classified slice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZScoreTable {
    /// Grouping column name (controller, method, family, ...)
    pub grouped_by: String,
    pub records: Vec<ZScoreRecord>,
    /// Mean average rank of the slice
    pub mean: f64,
    /// Sample standard deviation (n - 1) of the slice
    pub std_dev: f64,
    pub threshold: f64,
}

impl ZScoreTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// One (group, z-score) per group, first-seen order
    pub fn group_scores(&self) -> Vec<(String, f64)> {
        let mut scores: Vec<(String, f64)> = Vec::new();
        for record in &self.records {
            if !scores.iter().any(|(group, _)| *group == record.group) {
                scores.push((record.group.clone(), record.z_score));
            }
        }
        scores
    }

    /// Z-score of a group, if present in this slice
    pub fn z_of(&self, group: &str) -> Option<f64> {
        self.records
            .iter()
            .find(|record| record.group == group)
            .map(|record| record.z_score)
    }

    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        let mut report = format!(
            "{} rows, mean rank {:.4}, std {:.4}, threshold {}\n",
            self.records.len(),
            self.mean,
            self.std_dev,
            self.threshold
        );
        report.push_str(&format!(
            "{:40} | {:>10} | {}\n",
            self.grouped_by, "z-score", "status"
        ));
        report.push_str(&format!("{}\n", "-".repeat(68)));

        for (group, z_score) in self.group_scores() {
            let status = Classification::from_z(z_score, self.threshold);
            report.push_str(&format!("{:40} | {:>10.5} | {}\n", group, z_score, status));
        }
        report
    }
}

fn mean_and_sample_std(values: &[f64]) -> Result<(f64, f64)> {
    let n = values.len();
    if n < 2 {
        return Err(RankError::DegenerateDistribution(format!(
            "sample standard deviation needs at least 2 rows, got {}",
            n
        )));
    }

    // Rounding in the mean leaves a residual std for identical values
    if values.iter().all(|v| *v == values[0]) {
        return Err(RankError::DegenerateDistribution(format!(
            "all {} average ranks equal {}",
            n, values[0]
        )));
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let std_dev = variance.sqrt();

    if !(std_dev > f64::EPSILON * mean.abs()) || !std_dev.is_finite() {
        return Err(RankError::DegenerateDistribution(format!(
            "standard deviation of {} average ranks is {}",
            n, std_dev
        )));
    }

    Ok((mean, std_dev))
}

/// Classify the filtered slice of `table`
///
/// Every row receives its group's z-score:
/// `(group mean - slice mean) / slice sample std`.
///
/// # Errors
/// `InvalidInput` for an empty slice or a negative threshold,
/// `DegenerateDistribution` when the slice has fewer than two rows or no spread.
pub fn classify(
    table: &ConsolidatedRankTable,
    filter: &RowFilter,
    group_key: &GroupKey,
    threshold: f64,
) -> Result<ZScoreTable> {
    NormalizerConfig { threshold }.validate()?;

    let slice: Vec<&RankRecord> = table.iter().filter(|r| filter.matches(r)).collect();
    if slice.is_empty() {
        return Err(RankError::InvalidInput(
            "filter selects no rank records".to_string(),
        ));
    }

    let ranks: Vec<f64> = slice.iter().map(|r| r.average_rank).collect();
    let (mean, std_dev) = mean_and_sample_std(&ranks)?;

    let labels: Vec<String> = slice.iter().map(|r| group_key.label(r)).collect();

    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for (label, record) in labels.iter().zip(&slice) {
        let entry = sums.entry(label.as_str()).or_insert((0.0, 0));
        entry.0 += record.average_rank;
        entry.1 += 1;
    }
    let z_scores: BTreeMap<&str, f64> = sums
        .into_iter()
        .map(|(label, (sum, count))| (label, (sum / count as f64 - mean) / std_dev))
        .collect();

    let records: Vec<ZScoreRecord> = slice
        .iter()
        .zip(&labels)
        .map(|(record, label)| {
            let z_score = z_scores[label.as_str()];
            ZScoreRecord {
                metric: record.metric.clone(),
                order: record.order,
                axis_param: record.axis_param,
                method: record.method.clone(),
                controller: record.controller.clone(),
                group: label.clone(),
                average_rank: record.average_rank,
                z_score,
                status: Classification::from_z(z_score, threshold),
            }
        })
        .collect();

    tracing::debug!(
        rows = records.len(),
        groups = z_scores.len(),
        grouped_by = %group_key,
        mean,
        std_dev,
        "classified slice"
    );

    Ok(ZScoreTable {
        grouped_by: group_key.to_string(),
        records,
        mean,
        std_dev,
        threshold,
    })
}

/// Classify each value of `split_key` as an independent slice
///
/// Slices come back labelled, in first-seen order. Any failing slice fails
/// the whole call.
pub fn classify_split(
    table: &ConsolidatedRankTable,
    filter: &RowFilter,
    split_key: &GroupKey,
    group_key: &GroupKey,
    threshold: f64,
) -> Result<Vec<(String, ZScoreTable)>> {
    let selected = filter.apply(table);
    if selected.is_empty() {
        return Err(RankError::InvalidInput(
            "filter selects no rank records".to_string(),
        ));
    }

    let mut slice_labels: Vec<String> = Vec::new();
    for record in selected.iter() {
        let label = split_key.label(record);
        if !slice_labels.contains(&label) {
            slice_labels.push(label);
        }
    }

    let everything = RowFilter::new();
    slice_labels
        .into_iter()
        .map(|label| {
            let slice = selected.filtered(|r| split_key.label(r) == label);
            let classified = classify(&slice, &everything, group_key, threshold)?;
            Ok((label, classified))
        })
        .collect()
}
