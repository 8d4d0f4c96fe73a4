// Statistical normalization of average ranks into z-scores
//
// A slice of the consolidated rank table (chosen by a RowFilter) is reduced to
// one mean average rank per group (controller, method, controller family, ...).
// Each group mean is expressed in standard deviations of the whole slice:
//
//   z = (group mean - slice mean) / slice std   (sample std, n - 1)
//
// and broadcast to every row of the group. Groups well below the slice mean
// are classified "best", well above "worse", the rest "intermediate".
//
// Slices are independent: the same rank table can be classified per metric,
// per order or per axis value without one result influencing another.
//
// Companion tools:
// - average_group_scores / average_all_group_scores / SummaryReport: average
//   a group's z-score across several slices and print the fixed-width summary
// - one_way_anova: aprender's f_oneway over the same groups

mod anova;
mod classify;
mod config;
mod filter;
mod report;

pub use anova::{one_way_anova, AnovaSummary};
pub use classify::{classify, classify_split, Classification, ZScoreRecord, ZScoreTable};
pub use config::NormalizerConfig;
pub use filter::{FamilyRule, GroupBy, GroupKey, RowFilter};
pub use report::{average_all_group_scores, average_group_scores, SummaryReport};
