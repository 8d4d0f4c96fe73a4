// Rank aggregation across experiment axes and cost metrics
//
// For one problem and one method-order group, every (method, controller)
// configuration is ranked by efficiency under two axis values (e.g. two
// multirate ratios) and two cost metrics (slow and fast work), giving four
// orderings. Configurations within the rank cutoff under BOTH axis values are
// retained per metric: efficiency that survives a change of the experiment
// parameter, not a single lucky setting.
//
// Missing measurements are fatal. Ranks are relative to whoever is present, so
// silently dropping a configuration would shift every other rank.

mod aggregate;
mod config;

pub use aggregate::{
    aggregate_ranks, combine, retained_within_cutoff, AggregationOutcome, AggregationUnit,
    AxisOrdering, OrderGroup,
};
pub use config::PipelineConfig;
