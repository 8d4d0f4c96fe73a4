// One-way ANOVA of average ranks across groups, via aprender

use crate::error::{RankError, Result};
use crate::normalize::filter::{GroupKey, RowFilter};
use crate::rank_table::ConsolidatedRankTable;
use serde::Serialize;

/// Result of a one-way ANOVA over grouped average ranks
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnovaSummary {
    pub grouped_by: String,
    /// Group labels with their sample sizes, first-seen order
    pub groups: Vec<(String, usize)>,
    /// F-statistic
    pub statistic: f64,
    /// p-value; below 0.05 the group means likely differ
    pub pvalue: f64,
    pub df_between: usize,
    pub df_within: usize,
}

impl AnovaSummary {
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.pvalue < alpha
    }

    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        let mut report = format!(
            "One-way ANOVA of average rank by {} ({} groups)\n",
            self.grouped_by,
            self.groups.len()
        );
        for (group, size) in &self.groups {
            report.push_str(&format!("  {:40} n = {}\n", group, size));
        }
        report.push_str(&format!(
            "F({}, {}) = {:.4}, p = {:.4e}\n",
            self.df_between, self.df_within, self.statistic, self.pvalue
        ));
        report
    }
}

/// Test whether group means of the filtered slice differ
///
/// # Errors
/// `InvalidInput` for an empty slice, or when aprender rejects the groups
/// (fewer than two groups, no within-group degrees of freedom).
pub fn one_way_anova(
    table: &ConsolidatedRankTable,
    filter: &RowFilter,
    group_key: &GroupKey,
) -> Result<AnovaSummary> {
    let mut labels: Vec<String> = Vec::new();
    let mut samples: Vec<Vec<f32>> = Vec::new();

    for record in table.iter().filter(|r| filter.matches(r)) {
        let label = group_key.label(record);
        // aprender's hypothesis tests work in f32
        let rank = record.average_rank as f32;
        match labels.iter().position(|l| *l == label) {
            Some(index) => samples[index].push(rank),
            None => {
                labels.push(label);
                samples.push(vec![rank]);
            }
        }
    }

    if samples.is_empty() {
        return Err(RankError::InvalidInput(
            "filter selects no rank records".to_string(),
        ));
    }

    let result = aprender::stats::hypothesis::f_oneway(&samples)
        .map_err(|e| RankError::InvalidInput(format!("ANOVA by {}: {}", group_key, e)))?;

    tracing::debug!(
        grouped_by = %group_key,
        groups = samples.len(),
        statistic = result.statistic,
        pvalue = result.pvalue,
        "one-way ANOVA"
    );

    Ok(AnovaSummary {
        grouped_by: group_key.to_string(),
        groups: labels
            .into_iter()
            .zip(samples.iter().map(Vec::len))
            .collect(),
        statistic: f64::from(result.statistic),
        pvalue: f64::from(result.pvalue),
        df_between: result.df_between,
        df_within: result.df_within,
    })
}
