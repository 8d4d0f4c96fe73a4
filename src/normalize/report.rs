// Cross-slice z-score averages and the fixed-width summary report

use crate::error::{RankError, Result};
use crate::normalize::classify::ZScoreTable;
use serde::Serialize;

const BANNER_WIDTH: usize = 94;
const RULE_WIDTH: usize = 75;
const LABEL_WIDTH: usize = 50;

/// Average each member's z-score across several classified slices
///
/// Members keep the given order.
///
/// # Errors
/// `InvalidInput` without slices, `MissingData` for a member absent from
/// any slice.
pub fn average_group_scores(tables: &[ZScoreTable], members: &[String]) -> Result<Vec<(String, f64)>> {
    if tables.is_empty() {
        return Err(RankError::InvalidInput(
            "no classified slices to average".to_string(),
        ));
    }

    members
        .iter()
        .map(|member| {
            let mut sum = 0.0;
            for (index, table) in tables.iter().enumerate() {
                sum += table.z_of(member).ok_or_else(|| RankError::MissingData {
                    key: format!("group {} in slice {}", member, index),
                })?;
            }
            Ok((member.clone(), sum / tables.len() as f64))
        })
        .collect()
}

/// Average the z-score of every group seen in any slice
///
/// Groups come in first-seen order, slice by slice. A group is averaged over
/// the slices that contain it, so slices with disjoint groups (e.g. methods
/// split by order) still summarize.
///
/// # Errors
/// `InvalidInput` without slices.
pub fn average_all_group_scores(tables: &[ZScoreTable]) -> Result<Vec<(String, f64)>> {
    if tables.is_empty() {
        return Err(RankError::InvalidInput(
            "no classified slices to average".to_string(),
        ));
    }

    let mut totals: Vec<(String, f64, usize)> = Vec::new();
    for table in tables {
        for (group, z_score) in table.group_scores() {
            match totals.iter_mut().find(|(seen, _, _)| *seen == group) {
                Some(entry) => {
                    entry.1 += z_score;
                    entry.2 += 1;
                }
                None => totals.push((group, z_score, 1)),
            }
        }
    }

    Ok(totals
        .into_iter()
        .map(|(group, sum, count)| (group, sum / count as f64))
        .collect())
}

/// Plain-text table of average z-scores under a starred banner
///
/// # Example
/// ```
/// use effrank::normalize::SummaryReport;
///
/// let report = SummaryReport::new("Average z-scores at the slow scale", "Controller")
///     .row("MRIHTol-I", -1.25);
/// let text = report.to_report_string();
/// assert!(text.contains("| -1.25000"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    pub title: String,
    /// Heading of the label column (e.g. "Controller", "Method")
    pub heading: String,
    pub rows: Vec<(String, f64)>,
    /// Decimal places of the z-score column
    pub precision: usize,
}

impl SummaryReport {
    pub fn new(title: impl Into<String>, heading: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            heading: heading.into(),
            rows: Vec::new(),
            precision: 5,
        }
    }

    pub fn row(mut self, label: impl Into<String>, z_score: f64) -> Self {
        self.rows.push((label.into(), z_score));
        self
    }

    pub fn with_rows(mut self, rows: Vec<(String, f64)>) -> Self {
        self.rows = rows;
        self
    }

    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        let banner = "*".repeat(BANNER_WIDTH);
        let mut report = String::new();

        report.push_str(&format!("{} \n", banner));
        report.push_str(&format!("{} \n", self.title));
        report.push_str(&format!("{} \n\n", banner));
        report.push_str(&format!(
            "{:width$} | Average z-score\n",
            self.heading,
            width = LABEL_WIDTH
        ));
        report.push_str(&format!("{}\n", "-".repeat(RULE_WIDTH)));

        for (label, z_score) in &self.rows {
            report.push_str(&format!(
                "{:width$} | {:.prec$}\n",
                label,
                z_score,
                width = LABEL_WIDTH,
                prec = self.precision
            ));
        }
        report
    }
}
