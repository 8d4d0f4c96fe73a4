use anyhow::{Context, Result};
use clap::Parser;
use effrank::cli::{AnovaArgs, ClassifyArgs, Cli, Command, OutputFormat, RankArgs};
use effrank::normalize::{
    average_all_group_scores, classify, classify_split, one_way_anova, GroupKey, SummaryReport,
};
use effrank::rank_table::ConsolidatedRankTable;
use effrank::study::{run_study, Study};
use effrank::{csv_output, json_output::JsonOutput};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn run_rank(args: &RankArgs) -> Result<()> {
    let study = Study::from_path(&args.study)?;
    let base_dir = args.study.parent().unwrap_or_else(|| Path::new("."));
    let outcome = run_study(&study, base_dir)?;

    if let Some(out_dir) = &args.out_dir {
        let written = csv_output::write_study(&outcome, out_dir)?;
        eprintln!("Wrote {} files to {}", written.len(), out_dir.display());
    }

    match args.format {
        OutputFormat::Text => print!("{}", outcome.to_report_string()),
        OutputFormat::Json => println!("{}", JsonOutput::from_study(&outcome).to_json()?),
        OutputFormat::Csv => csv_output::rank_table_to_csv(&outcome.combined, std::io::stdout())?,
    }
    Ok(())
}

fn run_classify(args: &ClassifyArgs) -> Result<()> {
    let table = ConsolidatedRankTable::from_csv_path(&args.slice.ranks)?;
    let filter = args.slice.filter();
    let group_key = args.slice.group_key();

    let slices = match args.split_by {
        Some(split_by) => {
            let split_key = GroupKey::from_group_by(split_by.into(), args.slice.families.clone());
            classify_split(&table, &filter, &split_key, &group_key, args.threshold)?
        }
        None => vec![(
            "all".to_string(),
            classify(&table, &filter, &group_key, args.threshold)?,
        )],
    };

    if let Some(out) = &args.out {
        let file = std::fs::File::create(out)
            .with_context(|| format!("Failed to create {}", out.display()))?;
        csv_output::zscore_tables_to_csv(slices.iter().map(|(_, t)| t), file)?;
        eprintln!("Wrote z-scores to {}", out.display());
        return Ok(());
    }

    match args.format {
        OutputFormat::Text => {
            for (label, table) in &slices {
                println!("== {} ==", label);
                print!("{}", table.to_report_string());
                println!();
            }
            if slices.len() > 1 {
                let tables: Vec<_> = slices.iter().map(|(_, t)| t.clone()).collect();
                let averages = average_all_group_scores(&tables)?;
                let title = format!(
                    "Average z-scores by {} across {} slices.",
                    group_key,
                    slices.len()
                );
                let report = SummaryReport::new(title, group_key.to_string()).with_rows(averages);
                print!("{}", report.to_report_string());
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&slices)?),
        OutputFormat::Csv => {
            csv_output::zscore_tables_to_csv(slices.iter().map(|(_, t)| t), std::io::stdout())?;
        }
    }
    Ok(())
}

fn run_anova(args: &AnovaArgs) -> Result<()> {
    let table = ConsolidatedRankTable::from_csv_path(&args.slice.ranks)?;
    let summary = one_way_anova(&table, &args.slice.filter(), &args.slice.group_key())?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text | OutputFormat::Csv => print!("{}", summary.to_report_string()),
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    match &args.command {
        Command::Rank(cmd) => run_rank(cmd),
        Command::Classify(cmd) => run_classify(cmd),
        Command::Anova(cmd) => run_anova(cmd),
    }
}
