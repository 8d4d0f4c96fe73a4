//! CSV and text artifacts of a study run
//!
//! Files written by [`write_study`] into the output directory:
//!
//! - `ranks_stats_{problem}-{group}.csv`: rank table of one aggregation unit
//! - `{problem}-{group}{metric}.csv`: pairs retained for one cost metric
//! - `rank_stats.csv`: all rank tables combined
//! - `zscores_{analysis}-{slice}.csv`: one classified slice
//! - `AvgZscores_{analysis}.txt`: fixed-width summary of an analysis

use crate::measurement::ConfigKey;
use crate::normalize::ZScoreTable;
use crate::rank_table::ConsolidatedRankTable;
use crate::study::StudyOutcome;
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Header of z-score files
pub const ZSCORE_HEADER: [&str; 8] = [
    "metric",
    "order",
    "axis_param",
    "method",
    "controller",
    "average_rank",
    "z_score",
    "status",
];

/// Write `problem,method,controller,order,axis_param,metric,average_rank` rows
pub fn rank_table_to_csv<W: Write>(table: &ConsolidatedRankTable, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in table.iter() {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write retained pairs as `controller,method` rows
pub fn retained_pairs_to_csv<W: Write>(pairs: &BTreeSet<ConfigKey>, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["controller", "method"])?;
    for key in pairs {
        csv_writer.write_record([key.controller.as_str(), key.method.as_str()])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write one classified slice
pub fn zscore_table_to_csv<W: Write>(table: &ZScoreTable, writer: W) -> Result<()> {
    zscore_tables_to_csv([table], writer)
}

/// Write several classified slices under a single header
pub fn zscore_tables_to_csv<'a, I, W>(tables: I, writer: W) -> Result<()>
where
    I: IntoIterator<Item = &'a ZScoreTable>,
    W: Write,
{
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(ZSCORE_HEADER)?;
    for table in tables {
        for record in &table.records {
            csv_writer.write_record([
                record.metric.clone(),
                record.order.to_string(),
                record.axis_param.to_string(),
                record.method.clone(),
                record.controller.clone(),
                record.average_rank.to_string(),
                record.z_score.to_string(),
                record.status.to_string(),
            ])?;
        }
    }
    csv_writer.flush()?;
    Ok(())
}

/// Keep file names portable: anything but alphanumerics, `-`, `_` and `.` becomes `_`
fn file_label(label: &str) -> String {
    label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Render every artifact of a study run as (file name, contents)
fn render_study(outcome: &StudyOutcome) -> Result<Vec<(String, Vec<u8>)>> {
    let mut artifacts = Vec::new();

    for unit in &outcome.units {
        let stem = format!("{}-{}", file_label(&unit.problem), file_label(&unit.order_group));

        let mut buffer = Vec::new();
        rank_table_to_csv(&unit.rank_table, &mut buffer)?;
        artifacts.push((format!("ranks_stats_{}.csv", stem), buffer));

        for (metric, pairs) in &unit.retained {
            let mut buffer = Vec::new();
            retained_pairs_to_csv(pairs, &mut buffer)?;
            artifacts.push((format!("{}{}.csv", stem, file_label(metric)), buffer));
        }
    }

    let mut buffer = Vec::new();
    rank_table_to_csv(&outcome.combined, &mut buffer)?;
    artifacts.push(("rank_stats.csv".to_string(), buffer));

    for analysis in &outcome.analyses {
        let name = file_label(&analysis.name);

        for (slice, table) in &analysis.slices {
            let mut buffer = Vec::new();
            zscore_table_to_csv(table, &mut buffer)?;
            artifacts.push((format!("zscores_{}-{}.csv", name, file_label(slice)), buffer));
        }

        let mut summary = analysis.summary.to_report_string();
        if let Some(anova) = &analysis.anova {
            summary.push('\n');
            summary.push_str(&anova.to_report_string());
        }
        artifacts.push((format!("AvgZscores_{}.txt", name), summary.into_bytes()));
    }

    Ok(artifacts)
}

fn staging_path(out_dir: &Path, name: &str) -> PathBuf {
    out_dir.join(format!(".{}.tmp", name))
}

fn remove_staged(staged: &[PathBuf]) {
    for path in staged {
        let _ = std::fs::remove_file(path);
    }
}

/// Write every artifact of a study run into `out_dir`
///
/// All artifacts are rendered in memory and staged as hidden `.tmp` files
/// first. Final names appear only once every file is staged; a failed staging
/// write removes the staged files and leaves `out_dir` as it was.
///
/// Returns the written paths in write order.
pub fn write_study(outcome: &StudyOutcome, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let artifacts = render_study(outcome)?;

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory: {}", out_dir.display()))?;

    let mut staged = Vec::with_capacity(artifacts.len());
    for (name, contents) in &artifacts {
        let temp_path = staging_path(out_dir, name);
        if let Err(err) = std::fs::write(&temp_path, contents) {
            let _ = std::fs::remove_file(&temp_path);
            remove_staged(&staged);
            return Err(err).with_context(|| format!("Failed to write {}", temp_path.display()));
        }
        staged.push(temp_path);
    }

    let mut written = Vec::with_capacity(artifacts.len());
    for ((name, _), temp_path) in artifacts.iter().zip(&staged) {
        let path = out_dir.join(name);
        if let Err(err) = std::fs::rename(temp_path, &path) {
            remove_staged(&staged);
            return Err(err).with_context(|| format!("Failed to write {}", path.display()));
        }
        written.push(path);
    }

    tracing::info!(files = written.len(), dir = %out_dir.display(), "wrote study artifacts");
    Ok(written)
}
