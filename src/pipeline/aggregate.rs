// Four-way ranking, cutoff filtering and cross-axis intersection

use crate::error::{RankError, Result};
use crate::measurement::{ConfigKey, MeasurementTable};
use crate::pipeline::config::PipelineConfig;
use crate::rank_table::{ConsolidatedRankTable, RankRecord};
use crate::ranker::{rank_by_efficiency, RankedConfig};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Named set of methods ranked against each other (e.g. all 2nd order methods)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderGroup {
    pub name: String,
    pub methods: Vec<String>,
}

/// One independent unit of aggregation work
#[derive(Debug, Clone)]
pub struct AggregationUnit {
    pub problem: String,
    pub order_group: OrderGroup,
    /// The two experiment-axis values compared
    pub axis_values: [f64; 2],
    /// Controllers to pair with every method of the group
    pub controllers: Vec<String>,
    /// Pairs deliberately left out (e.g. failed solver runs)
    pub excluded: BTreeSet<ConfigKey>,
}

impl AggregationUnit {
    /// Configurations to rank, controller-major
    pub fn configurations(&self) -> Vec<ConfigKey> {
        self.controllers
            .iter()
            .flat_map(|controller| {
                self.order_group
                    .methods
                    .iter()
                    .map(move |method| ConfigKey::new(method, controller))
            })
            .filter(|key| !self.excluded.contains(key))
            .collect()
    }
}

/// Ranking of all configurations at one (axis value, metric)
#[derive(Debug, Clone, Serialize)]
pub struct AxisOrdering {
    pub axis_param: f64,
    pub metric: String,
    pub ranked: Vec<RankedConfig>,
}

/// Result of aggregating one (problem, order group) unit
#[derive(Debug, Clone, Serialize)]
pub struct AggregationOutcome {
    pub problem: String,
    pub order_group: String,
    pub axis_values: [f64; 2],
    /// Orderings, axis-major then metric
    pub orderings: Vec<AxisOrdering>,
    /// Every ordering flattened into tagged rank records
    pub rank_table: ConsolidatedRankTable,
    /// Per metric: configurations within the cutoff under both axis values
    pub retained: BTreeMap<String, BTreeSet<ConfigKey>>,
}

impl AggregationOutcome {
    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        let mut report = String::new();

        for ordering in &self.orderings {
            report.push_str(&format!(
                "For {} ({}) and axis value {} the {} efficiency ranks are:\n",
                self.problem, self.order_group, ordering.axis_param, ordering.metric
            ));
            for (position, ranked) in ordering.ranked.iter().enumerate() {
                report.push_str(&format!(
                    "  {:>3}  {:>8.4}  {}\n",
                    position + 1,
                    ranked.average_rank,
                    ranked.key
                ));
            }
            report.push('\n');
        }

        for (metric, pairs) in &self.retained {
            report.push_str(&format!(
                "Retained {} pairs ({}):\n",
                metric,
                pairs.len()
            ));
            for key in pairs {
                report.push_str(&format!("  - {}\n", key));
            }
        }

        report
    }
}

/// Configurations whose average rank is at most `cutoff`
pub fn retained_within_cutoff(ranked: &[RankedConfig], cutoff: f64) -> BTreeSet<ConfigKey> {
    ranked
        .iter()
        .filter(|r| r.average_rank <= cutoff)
        .map(|r| r.key.clone())
        .collect()
}

/// Rank one unit under both axis values and both cost metrics
///
/// # Errors
/// `MissingData` if any configuration lacks rows for an (axis value, metric)
/// combination or its method has no order class; ranking errors propagate.
pub fn aggregate_ranks(
    table: &MeasurementTable,
    unit: &AggregationUnit,
    config: &PipelineConfig,
) -> Result<AggregationOutcome> {
    config.validate()?;

    let configs = unit.configurations();
    if configs.is_empty() {
        return Err(RankError::InvalidInput(format!(
            "{} ({}): no configurations to rank",
            unit.problem, unit.order_group.name
        )));
    }

    let mut orders = BTreeMap::new();
    for method in &unit.order_group.methods {
        let order = table.order_of(method).ok_or_else(|| RankError::MissingData {
            key: format!("{}: order class of method {}", unit.problem, method),
        })?;
        orders.insert(method.as_str(), order);
    }

    let mut orderings = Vec::with_capacity(4);
    let mut rank_table = ConsolidatedRankTable::new();
    let mut within_cutoff: BTreeMap<&str, Vec<BTreeSet<ConfigKey>>> = BTreeMap::new();

    for axis_param in unit.axis_values {
        for metric in &config.metrics {
            let series = configs
                .iter()
                .map(|key| table.series(axis_param, metric, key))
                .collect::<Result<Vec<_>>>()?;

            let ranked = rank_by_efficiency(&series, config.window(), config.grid_size)?;
            let best = &ranked[0].key;

            tracing::debug!(
                problem = %unit.problem,
                group = %unit.order_group.name,
                axis_param,
                metric = %metric,
                best = %best,
                "ranked {} configurations",
                ranked.len()
            );

            for entry in &ranked {
                rank_table.push(RankRecord {
                    problem: unit.problem.clone(),
                    method: entry.key.method.clone(),
                    controller: entry.key.controller.clone(),
                    order: orders[entry.key.method.as_str()],
                    axis_param,
                    metric: metric.clone(),
                    average_rank: entry.average_rank,
                });
            }

            within_cutoff
                .entry(metric.as_str())
                .or_default()
                .push(retained_within_cutoff(&ranked, config.cutoff_rank));

            orderings.push(AxisOrdering {
                axis_param,
                metric: metric.clone(),
                ranked,
            });
        }
    }

    let retained: BTreeMap<String, BTreeSet<ConfigKey>> = within_cutoff
        .into_iter()
        .map(|(metric, sets)| {
            let both = sets[0].intersection(&sets[1]).cloned().collect();
            (metric.to_string(), both)
        })
        .collect();

    for (metric, pairs) in &retained {
        tracing::info!(
            problem = %unit.problem,
            group = %unit.order_group.name,
            metric = %metric,
            "retained {} of {} configurations",
            pairs.len(),
            configs.len()
        );
    }

    Ok(AggregationOutcome {
        problem: unit.problem.clone(),
        order_group: unit.order_group.name.clone(),
        axis_values: unit.axis_values,
        orderings,
        rank_table,
        retained,
    })
}

/// Union of the rank tables of several outcomes, in outcome order
pub fn combine(outcomes: &[AggregationOutcome]) -> ConsolidatedRankTable {
    let mut combined = ConsolidatedRankTable::new();
    for outcome in outcomes {
        combined.merge(&outcome.rank_table);
    }
    combined
}
