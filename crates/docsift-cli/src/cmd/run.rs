//! Run subcommand - filter every input file into the output directory

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use docsift_core::{SharedProgress, fmt_num, pct};
use docsift_filters::RunSummary;

use crate::config::Config;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Input directory (.jsonl, .jsonl.gz, .txt, .txt.gz, .parquet)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of files processed in parallel
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Gzip the merged results and stats files
    #[arg(long)]
    pub compress: bool,

    /// JSON key holding the document text
    #[arg(long)]
    pub text_key: Option<String>,
}

/// Merge CLI arguments over the config file
pub fn build_config(args: RunArgs, config: &Config) -> docsift_filters::Config {
    let mut stages = config.stages.clone();
    if let Some(key) = args.text_key {
        stages.text_key = key;
    }
    docsift_filters::Config {
        input_dir: args.input.unwrap_or_else(|| config.input.dir.clone()),
        output_dir: args.output.unwrap_or_else(|| config.output.dir.clone()),
        workers: config.workers.resolve(args.workers),
        compress_merged: args.compress || config.output.compress_merged,
        rejected_format: config.output.rejected_format,
        stages,
    }
}

pub fn run(args: RunArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let run_config = build_config(args, config);

    log::info!("Filtering {}", run_config.input_dir.display());
    log::info!("  Output: {}", run_config.output_dir.display());
    log::info!("  Text key: {}", run_config.stages.text_key);

    let summary = docsift_filters::run(&run_config, progress)?;

    print_summary(&summary);
    eprintln!("{}", summary.format_table());

    if !summary.is_success() {
        anyhow::bail!("{} files failed", summary.files_failed);
    }
    Ok(())
}

/// Print a key-value summary table on stderr
fn print_summary(summary: &RunSummary) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Filtering").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);
    let rows = [
        (
            "Files",
            format!(
                "{}/{} processed ({} skipped, {} failed)",
                summary.files_processed,
                summary.files_total,
                summary.files_skipped,
                summary.files_failed
            ),
        ),
        (
            "Records",
            format!(
                "{} accepted of {} ({:.1}%)",
                fmt_num(summary.accepted),
                fmt_num(summary.records),
                pct(summary.accepted, summary.records)
            ),
        ),
        ("Rejected", fmt_num(summary.rejected)),
        ("Errors", fmt_num(summary.errors)),
        ("Merged documents", fmt_num(summary.merged_documents)),
        (
            "Results",
            summary
                .results_path
                .as_ref()
                .map_or_else(|| "-".to_string(), |p| p.display().to_string()),
        ),
        ("Time", format!("{:.1}s", summary.elapsed.as_secs_f64())),
    ];
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    eprintln!("\n{table}");
}
