//! Rank records and the consolidated rank table
//!
//! The rank table is the hand-off between aggregation and statistics: it is
//! persisted as CSV and read back by the normalizer.

use crate::measurement::ConfigKey;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// One configuration's average rank at one (problem, axis value, metric)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankRecord {
    /// Empty when read from a table written without a problem column
    #[serde(default)]
    pub problem: String,
    pub method: String,
    pub controller: String,
    pub order: u32,
    pub axis_param: f64,
    pub metric: String,
    pub average_rank: f64,
}

impl RankRecord {
    pub fn key(&self) -> ConfigKey {
        ConfigKey::new(&self.method, &self.controller)
    }
}

/// Union of rank records; grows by append or merge only
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedRankTable {
    records: Vec<RankRecord>,
}

impl ConsolidatedRankTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<RankRecord>) -> Self {
        Self { records }
    }

    pub fn push(&mut self, record: RankRecord) {
        self.records.push(record);
    }

    /// Append every record of `other`
    pub fn merge(&mut self, other: &ConsolidatedRankTable) {
        self.records.extend(other.records.iter().cloned());
    }

    pub fn records(&self) -> &[RankRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &RankRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows matching `predicate`, as a new table
    pub fn filtered<F>(&self, predicate: F) -> Self
    where
        F: Fn(&RankRecord) -> bool,
    {
        Self {
            records: self.records.iter().filter(|r| predicate(r)).cloned().collect(),
        }
    }

    /// Load a rank table written by [`crate::csv_output::rank_table_to_csv`]
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        use anyhow::Context;

        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open rank table: {}", path.display()))?;
        Self::from_csv_reader(file)
            .with_context(|| format!("Failed to parse rank table: {}", path.display()))
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> anyhow::Result<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let records = csv_reader
            .deserialize::<RankRecord>()
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { records })
    }
}

impl FromIterator<RankRecord> for ConsolidatedRankTable {
    fn from_iter<I: IntoIterator<Item = RankRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(method: &str, controller: &str, metric: &str, rank: f64) -> RankRecord {
        RankRecord {
            problem: "kpr".to_string(),
            method: method.to_string(),
            controller: controller.to_string(),
            order: 2,
            axis_param: 50.0,
            metric: metric.to_string(),
            average_rank: rank,
        }
    }

    #[test]
    fn test_merge_appends_in_order() {
        let mut kpr = ConsolidatedRankTable::new();
        kpr.push(record("A", "I", "slow", 1.0));

        let bruss: ConsolidatedRankTable = vec![record("B", "I", "fast", 2.0)].into_iter().collect();
        kpr.merge(&bruss);

        assert_eq!(kpr.len(), 2);
        assert_eq!(kpr.records()[1].method, "B");
        assert_eq!(bruss.len(), 1);
    }

    #[test]
    fn test_filtered_leaves_source_untouched() {
        let table = ConsolidatedRankTable::from_records(vec![
            record("A", "I", "slow", 1.0),
            record("A", "I", "fast", 2.0),
        ]);

        let slow = table.filtered(|r| r.metric == "slow");
        assert_eq!(slow.len(), 1);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_csv_reader() {
        let csv = "\
problem,method,controller,order,axis_param,metric,average_rank
kpr,ERK22a,MRIDec-I,2,50,slow,1.25
bruss,ERK22a,MRIHTol-I,2,500,fast,3.5
";
        let table = ConsolidatedRankTable::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[0].average_rank, 1.25);
        assert_eq!(table.records()[1].problem, "bruss");
        assert_eq!(table.records()[1].key(), ConfigKey::new("ERK22a", "MRIHTol-I"));
    }

    #[test]
    fn test_csv_reader_without_problem_column() {
        let csv = "\
method,controller,order,axis_param,metric,average_rank
ERK22a,MRIDec-I,2,50,slow,1.25
";
        let table = ConsolidatedRankTable::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.records()[0].problem, "");
        assert_eq!(table.records()[0].metric, "slow");
    }
}
