// Row selection and grouping over rank records

use crate::error::{RankError, Result};
use crate::measurement::same_param;
use crate::rank_table::{ConsolidatedRankTable, RankRecord};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Selects the slice of a rank table to classify
///
/// Empty include lists accept everything. Exclusions win over inclusions.
///
/// # Example
/// ```
/// use effrank::normalize::RowFilter;
///
/// let filter = RowFilter::new()
///     .metric("slow")
///     .order(2)
///     .exclude_controller("MRIPI-I");
/// assert_eq!(filter.metrics, vec!["slow".to_string()]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowFilter {
    pub problems: Vec<String>,
    pub metrics: Vec<String>,
    pub orders: Vec<u32>,
    pub params: Vec<f64>,
    pub methods: Vec<String>,
    pub controllers: Vec<String>,
    pub exclude_methods: Vec<String>,
    pub exclude_controllers: Vec<String>,
}

impl RowFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn problem(mut self, problem: impl Into<String>) -> Self {
        self.problems.push(problem.into());
        self
    }

    pub fn metric(mut self, metric: impl Into<String>) -> Self {
        self.metrics.push(metric.into());
        self
    }

    pub fn order(mut self, order: u32) -> Self {
        self.orders.push(order);
        self
    }

    pub fn param(mut self, axis_param: f64) -> Self {
        self.params.push(axis_param);
        self
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.methods.push(method.into());
        self
    }

    pub fn controller(mut self, controller: impl Into<String>) -> Self {
        self.controllers.push(controller.into());
        self
    }

    pub fn exclude_method(mut self, method: impl Into<String>) -> Self {
        self.exclude_methods.push(method.into());
        self
    }

    pub fn exclude_controller(mut self, controller: impl Into<String>) -> Self {
        self.exclude_controllers.push(controller.into());
        self
    }

    pub fn matches(&self, record: &RankRecord) -> bool {
        fn accepts<T: PartialEq>(list: &[T], value: &T) -> bool {
            list.is_empty() || list.contains(value)
        }

        accepts(&self.problems, &record.problem)
            && accepts(&self.metrics, &record.metric)
            && accepts(&self.orders, &record.order)
            && accepts(&self.methods, &record.method)
            && accepts(&self.controllers, &record.controller)
            && (self.params.is_empty()
                || self.params.iter().any(|&p| same_param(p, record.axis_param)))
            && !self.exclude_methods.contains(&record.method)
            && !self.exclude_controllers.contains(&record.controller)
    }

    /// The selected rows, in table order
    pub fn apply(&self, table: &ConsolidatedRankTable) -> ConsolidatedRankTable {
        table.filtered(|record| self.matches(record))
    }
}

/// Maps controllers whose name starts with `prefix` to `family`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyRule {
    pub prefix: String,
    pub family: String,
}

impl FamilyRule {
    pub fn new(prefix: impl Into<String>, family: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            family: family.into(),
        }
    }

    /// Step-size controller families of the MRI adaptivity study
    pub fn mri_defaults() -> Vec<FamilyRule> {
        vec![
            FamilyRule::new("MRIHTol", "HTol"),
            FamilyRule::new("MRIDec", "Dec"),
            FamilyRule::new("MRIPI", "Hh"),
            FamilyRule::new("MRICC", "Hh"),
            FamilyRule::new("MRILL", "Hh"),
        ]
    }
}

/// Parses `PREFIX=FAMILY`
impl FromStr for FamilyRule {
    type Err = RankError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('=') {
            Some((prefix, family)) if !prefix.is_empty() && !family.is_empty() => {
                Ok(FamilyRule::new(prefix.trim(), family.trim()))
            }
            _ => Err(RankError::InvalidInput(format!(
                "family rule must look like PREFIX=FAMILY, got '{}'",
                s
            ))),
        }
    }
}

/// Grouping column named in configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    Problem,
    Controller,
    Method,
    Family,
    Metric,
    Order,
    Param,
}

/// How rows are grouped before computing group means
#[derive(Debug, Clone, PartialEq)]
pub enum GroupKey {
    Problem,
    Controller,
    Method,
    /// First matching prefix rule wins; unmatched controllers form their own group
    ControllerFamily(Vec<FamilyRule>),
    Metric,
    Order,
    AxisParam,
}

impl GroupKey {
    /// Resolve a configured grouping; `rules` only matter for `Family`
    ///
    /// An empty rule list for `Family` falls back to the MRI controller families.
    pub fn from_group_by(group_by: GroupBy, rules: Vec<FamilyRule>) -> Self {
        match group_by {
            GroupBy::Problem => GroupKey::Problem,
            GroupBy::Controller => GroupKey::Controller,
            GroupBy::Method => GroupKey::Method,
            GroupBy::Family if rules.is_empty() => {
                GroupKey::ControllerFamily(FamilyRule::mri_defaults())
            }
            GroupBy::Family => GroupKey::ControllerFamily(rules),
            GroupBy::Metric => GroupKey::Metric,
            GroupBy::Order => GroupKey::Order,
            GroupBy::Param => GroupKey::AxisParam,
        }
    }

    /// Group label of a record
    pub fn label(&self, record: &RankRecord) -> String {
        match self {
            GroupKey::Problem => record.problem.clone(),
            GroupKey::Controller => record.controller.clone(),
            GroupKey::Method => record.method.clone(),
            GroupKey::ControllerFamily(rules) => rules
                .iter()
                .find(|rule| record.controller.starts_with(&rule.prefix))
                .map(|rule| rule.family.clone())
                .unwrap_or_else(|| record.controller.clone()),
            GroupKey::Metric => record.metric.clone(),
            GroupKey::Order => record.order.to_string(),
            GroupKey::AxisParam => record.axis_param.to_string(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GroupKey::Problem => "problem",
            GroupKey::Controller => "controller",
            GroupKey::Method => "method",
            GroupKey::ControllerFamily(_) => "family",
            GroupKey::Metric => "metric",
            GroupKey::Order => "order",
            GroupKey::AxisParam => "param",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(method: &str, controller: &str, metric: &str, order: u32, axis_param: f64) -> RankRecord {
        RankRecord {
            problem: "kpr".to_string(),
            method: method.to_string(),
            controller: controller.to_string(),
            order,
            axis_param,
            metric: metric.to_string(),
            average_rank: 1.0,
        }
    }

    #[test]
    fn test_empty_filter_accepts_everything() {
        assert!(RowFilter::new().matches(&record("A", "I", "slow", 2, 50.0)));
    }

    #[test]
    fn test_include_lists() {
        let filter = RowFilter::new().metric("slow").order(3).param(500.0);
        assert!(filter.matches(&record("A", "I", "slow", 3, 500.0)));
        assert!(!filter.matches(&record("A", "I", "fast", 3, 500.0)));
        assert!(!filter.matches(&record("A", "I", "slow", 2, 500.0)));
        assert!(!filter.matches(&record("A", "I", "slow", 3, 50.0)));
    }

    #[test]
    fn test_problem_filter_and_label() {
        let mut bruss = record("A", "I", "slow", 2, 1e-4);
        bruss.problem = "bruss".to_string();

        let filter = RowFilter::new().problem("bruss");
        assert!(filter.matches(&bruss));
        assert!(!filter.matches(&record("A", "I", "slow", 2, 50.0)));

        let key = GroupKey::from_group_by(GroupBy::Problem, Vec::new());
        assert_eq!(key.label(&bruss), "bruss");
        assert_eq!(key.to_string(), "problem");
    }

    #[test]
    fn test_exclusion_wins() {
        let filter = RowFilter::new().controller("MRIPI-I").exclude_controller("MRIPI-I");
        assert!(!filter.matches(&record("A", "MRIPI-I", "slow", 2, 50.0)));

        let filter = RowFilter::new().exclude_method("A");
        assert!(!filter.matches(&record("A", "I", "slow", 2, 50.0)));
        assert!(filter.matches(&record("B", "I", "slow", 2, 50.0)));
    }

    #[test]
    fn test_family_rule_parse() {
        let rule: FamilyRule = "MRIHTol=HTol".parse().unwrap();
        assert_eq!(rule, FamilyRule::new("MRIHTol", "HTol"));
        assert!("MRIHTol".parse::<FamilyRule>().is_err());
        assert!("=HTol".parse::<FamilyRule>().is_err());
    }

    #[test]
    fn test_family_labels() {
        let key = GroupKey::from_group_by(GroupBy::Family, Vec::new());
        assert_eq!(key.label(&record("A", "MRIHTol-I", "slow", 2, 50.0)), "HTol");
        assert_eq!(key.label(&record("A", "MRIDec-PI", "slow", 2, 50.0)), "Dec");
        assert_eq!(key.label(&record("A", "MRIPID-I", "slow", 2, 50.0)), "Hh");
        assert_eq!(key.label(&record("A", "Fixed", "slow", 2, 50.0)), "Fixed");
    }

    #[test]
    fn test_first_rule_wins() {
        let key = GroupKey::ControllerFamily(vec![
            FamilyRule::new("MRIPID", "PID"),
            FamilyRule::new("MRIPI", "PI"),
        ]);
        assert_eq!(key.label(&record("A", "MRIPID-I", "slow", 2, 50.0)), "PID");
        assert_eq!(key.label(&record("A", "MRIPI-I", "slow", 2, 50.0)), "PI");
    }

    #[test]
    fn test_group_by_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            group_by: GroupBy,
        }
        let wrapper: Wrapper = toml::from_str("group_by = \"family\"").unwrap();
        assert_eq!(wrapper.group_by, GroupBy::Family);
    }
}
