//! Run orchestration: discover inputs, filter each file, merge run outputs

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use docsift_core::{
    ChainStats, JsonlSink, ProgressContext, SinkPaths, Source, cleanup_tmp_files, fmt_num, pct,
};
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::config::Config;
use crate::error::FileError;
use crate::pipeline::build_chain;
use crate::worker::{FileContext, FileReport, process_file};

/// Base names of the run-level outputs
const RESULTS_BASE: &str = "results.filtering";
const STATS_BASE: &str = "stats.filtering";

/// Supported input files in `input_dir`, sorted by name.
///
/// Two files sharing an output stem would overwrite each other's outputs
/// and are rejected.
pub fn discover_sources(input_dir: &Path) -> anyhow::Result<Vec<Source>> {
    if !input_dir.is_dir() {
        bail!("input directory {} does not exist", input_dir.display());
    }
    let pattern = input_dir.join("*");
    let pattern_str = pattern.to_string_lossy();

    let mut sources: Vec<Source> = glob::glob(&pattern_str)
        .context("invalid glob pattern")?
        .filter_map(|e| e.ok())
        .filter(|p| p.is_file())
        .filter_map(|p| Source::from_path(&p))
        .collect();
    sources.sort_by(|a, b| a.name.cmp(&b.name));

    let mut stems: FxHashMap<&str, &str> = FxHashMap::default();
    for source in &sources {
        if let Some(other) = stems.insert(&source.stem, &source.name) {
            bail!(
                "inputs {other} and {} share the output stem '{}'",
                source.name,
                source.stem
            );
        }
    }
    Ok(sources)
}

/// Run the filtering pipeline over every input file.
///
/// Chain construction happens before any input is touched, so a missing
/// dictionary or unsupported language aborts the run up front. A file that
/// fails is logged and left out of the merged outputs; other files continue.
pub fn run(config: &Config, progress: &ProgressContext) -> anyhow::Result<RunSummary> {
    let start = Instant::now();

    let chain = build_chain(&config.stages).context("failed to build filter chain")?;
    log::debug!("Chain: {}", chain.stage_names().collect::<Vec<_>>().join(" → "));

    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("failed to create output directory {}", config.output_dir.display())
    })?;
    cleanup_tmp_files(&config.output_dir).context("failed to clean stale tmp files")?;

    let sources = discover_sources(&config.input_dir)?;
    if sources.is_empty() {
        log::warn!("No input files in {}", config.input_dir.display());
    }
    let workers = config.workers.max(1);
    log::info!(
        "Filtering {} files with {} worker{}",
        sources.len(),
        workers,
        if workers == 1 { "" } else { "s" }
    );

    let ctx = FileContext {
        chain: &chain,
        output_dir: &config.output_dir,
        text_key: &config.stages.text_key,
        rejected_format: config.rejected_format,
    };
    let run_one = |source: &Source| -> Result<FileReport, FileError> {
        let pb = progress.file_line(&source.name);
        let result = process_file(source, &ctx, &pb);
        pb.finish_and_clear();
        match &result {
            Ok(report) => report.log(),
            Err(e) => log::error!("{}: {e}", source.name),
        }
        result
    };

    let results: Vec<Result<FileReport, FileError>> = if workers == 1 {
        sources.iter().map(run_one).collect()
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .context("failed to build worker pool")?;
        // Collecting an indexed parallel iterator keeps input order
        pool.install(|| sources.par_iter().map(run_one).collect())
    };

    let mut summary = RunSummary::empty();
    summary.files_total = sources.len();
    summary.stages = chain.new_stats();

    let mut merged_results = JsonlSink::new(&config.output_dir, RESULTS_BASE, config.compress_merged)
        .context("failed to create merged results file")?;
    let mut merged_stats = JsonlSink::new(&config.output_dir, STATS_BASE, config.compress_merged)
        .context("failed to create merged stats file")?;

    for (source, result) in sources.iter().zip(results) {
        let report = match result {
            Ok(report) => report,
            Err(_) => {
                summary.files_failed += 1;
                continue;
            }
        };
        if report.skipped {
            summary.files_skipped += 1;
        } else {
            summary.files_processed += 1;
        }
        summary.records += report.processed;
        summary.accepted += report.accepted;
        summary.rejected += report.rejected;
        summary.errors += report.errors;

        let accepted = SinkPaths::new(&config.output_dir, &source.stem).accepted;
        if accepted.exists() {
            merged_results
                .append_file(&accepted)
                .with_context(|| format!("failed to merge {}", accepted.display()))?;
        }
        if let Some(stats) = &report.stats {
            summary.stages.merge(&stats.stages);
            let line = serde_json::to_string(stats).context("failed to serialize stats")?;
            merged_stats.write_line(&line)?;
        }
    }

    let (results_path, result_lines) = merged_results
        .finalize()
        .context("failed to finalize merged results")?;
    let (stats_path, _) = merged_stats
        .finalize()
        .context("failed to finalize merged stats")?;
    log::info!(
        "Merged {} accepted documents into {}",
        fmt_num(result_lines),
        results_path.display()
    );

    summary.merged_documents = result_lines;
    summary.results_path = Some(results_path);
    summary.stats_path = Some(stats_path);
    summary.elapsed = start.elapsed();
    summary.log();
    Ok(summary)
}

/// Summary of a filtering run
#[derive(Debug)]
pub struct RunSummary {
    pub files_total: usize,
    pub files_processed: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
    /// Records handled during this run
    pub records: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub errors: u64,
    /// Lines in the merged results file (all runs)
    pub merged_documents: u64,
    /// Per-stage counters summed over all files, earlier runs included
    pub stages: ChainStats,
    pub results_path: Option<PathBuf>,
    pub stats_path: Option<PathBuf>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn empty() -> Self {
        Self {
            files_total: 0,
            files_processed: 0,
            files_skipped: 0,
            files_failed: 0,
            records: 0,
            accepted: 0,
            rejected: 0,
            errors: 0,
            merged_documents: 0,
            stages: ChainStats::default(),
            results_path: None,
            stats_path: None,
            elapsed: Duration::ZERO,
        }
    }

    pub fn log(&self) {
        log::info!("=== Filtering Summary ===");
        log::info!(
            "Files: {}/{} processed, {} skipped, {} failed",
            self.files_processed,
            self.files_total,
            self.files_skipped,
            self.files_failed
        );
        log::info!(
            "Records: {} ({} accepted, {:.1}%; {} rejected; {} errors)",
            fmt_num(self.records),
            fmt_num(self.accepted),
            pct(self.accepted, self.records),
            fmt_num(self.rejected),
            fmt_num(self.errors)
        );
        log::info!("Time: {:.1}s", self.elapsed.as_secs_f64());
        let secs = self.elapsed.as_secs_f64();
        if self.records > 0 && secs > 0.0 {
            log::info!("Throughput: {:.0} records/sec", self.records as f64 / secs);
        }
    }

    /// Per-stage table for terminal output
    pub fn format_table(&self) -> String {
        self.stages.format_table("Stage")
    }

    /// Whether every file completed
    pub fn is_success(&self) -> bool {
        self.files_failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn run_summary_empty() {
        let summary = RunSummary::empty();
        assert_eq!(summary.files_total, 0);
        assert_eq!(summary.records, 0);
        assert!(summary.stages.is_empty());
        assert!(summary.is_success());
        assert_eq!(summary.elapsed, Duration::ZERO);
    }

    #[test]
    fn run_summary_log_does_not_panic() {
        let mut summary = RunSummary::empty();
        summary.records = 1000;
        summary.accepted = 900;
        summary.elapsed = Duration::from_secs(2);
        summary.log();
        RunSummary::empty().log();
    }

    #[test]
    fn discover_sorts_and_filters() {
        let dir = TempDir::new().unwrap();
        for name in ["b.jsonl", "a.txt.gz", "c.parquet", "notes.md", "d.jsonl.gz"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("sub.jsonl")).unwrap();
        let names: Vec<_> = discover_sources(dir.path())
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, ["a.txt.gz", "b.jsonl", "c.parquet", "d.jsonl.gz"]);
    }

    #[test]
    fn discover_rejects_duplicate_stems() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("part.jsonl"), "").unwrap();
        fs::write(dir.path().join("part.jsonl.gz"), "").unwrap();
        let err = discover_sources(dir.path()).unwrap_err();
        assert!(err.to_string().contains("share the output stem"));
    }

    #[test]
    fn discover_missing_dir_is_error() {
        assert!(discover_sources(Path::new("/no/such/input/dir")).is_err());
    }
}
