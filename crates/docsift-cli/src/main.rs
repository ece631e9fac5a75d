//! docsift - streaming document filtering for corpus preparation
//!
//! Reads raw text/JSON records from a directory, runs them through a fixed
//! chain of filter stages and writes accepted, rejected and merged outputs
//! with per-record checkpoints.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "docsift")]
#[command(about = "Streaming document filtering for corpus preparation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./docsift.toml or ~/.config/docsift/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Filter every input file (resumes from checkpoints)
    Run(cmd::run::RunArgs),
    /// List the filter stages in execution order
    Stages,
    /// Show current configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = Arc::new(docsift_core::ProgressContext::new());

    // Logging:
    //   TTY:     quiet (warn) unless --debug: progress lines show activity
    //   non-TTY: info unless --debug: logs are the only progress indicator
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = if is_tty { !cli.debug } else { false };
    docsift_core::init_logging(quiet, cli.debug, multi);

    let config = if let Some(path) = cli.config {
        Config::from_file(&path)?
    } else {
        Config::load()?
    };

    match cli.command {
        Command::Run(args) => cmd::run::run(args, &config, &progress),
        Command::Stages => cmd::stages::run(&config),
        Command::Config => {
            use comfy_table::{
                Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
            };

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec![
                    Cell::new("Setting").fg(Color::Cyan),
                    Cell::new("Value").fg(Color::Cyan),
                ]);

            let stages = &config.stages;
            table.add_row(vec![
                "Input directory",
                &config.input.dir.display().to_string(),
            ]);
            table.add_row(vec![
                "Output directory",
                &config.output.dir.display().to_string(),
            ]);
            table.add_row(vec![
                "Compress merged",
                &config.output.compress_merged.to_string(),
            ]);
            table.add_row(vec![
                "Rejected format",
                &format!("{:?}", config.output.rejected_format).to_lowercase(),
            ]);
            table.add_row(vec![
                "Workers",
                &format!("{} (max: {})", config.workers.default, config.workers.max),
            ]);
            table.add_row(vec!["Text key", &stages.text_key]);
            table.add_row(vec![
                "Length",
                &format!(
                    "{}..={} chars",
                    stages.length.min_doc_len, stages.length.max_doc_len
                ),
            ]);
            table.add_row(vec![
                "Language",
                &if stages.language.enabled {
                    format!(
                        "{} (score >= {}, lookup {})",
                        stages.language.lang, stages.language.min_score, stages.language.lookup_size
                    )
                } else {
                    "disabled".to_string()
                },
            ]);

            eprintln!("\n{table}");
            Ok(())
        }
    }
}
