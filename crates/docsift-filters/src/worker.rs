//! Per-file processing: read, filter and route every record of one input

use std::path::Path;
use std::time::{Duration, Instant};

use docsift_core::{
    Chain, ChainStats, Checkpoint, Document, ErrorRecord, FileSinks, FileStats, RecordError,
    SinkPaths, Source, fmt_num, open_records, pct, read_snapshot, snapshot_path, write_snapshot,
};
use indicatif::ProgressBar;

use crate::config::RejectedFormat;
use crate::error::FileError;

/// Records between progress line updates
const PROGRESS_INTERVAL: u64 = 10_000;

/// Everything a worker needs besides the input itself
#[derive(Debug, Clone, Copy)]
pub struct FileContext<'a> {
    pub chain: &'a Chain,
    pub output_dir: &'a Path,
    pub text_key: &'a str,
    pub rejected_format: RejectedFormat,
}

/// Outcome of one input file
#[derive(Debug)]
pub struct FileReport {
    pub name: String,
    pub stem: String,
    /// Checkpoint found at start
    pub resumed_from: u64,
    /// Already complete; no sink was opened
    pub skipped: bool,
    /// Records handled during this run
    pub processed: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub errors: u64,
    /// Cumulative counters including earlier runs; `None` when a skipped
    /// file has no snapshot
    pub stats: Option<FileStats>,
    pub elapsed: Duration,
}

impl FileReport {
    /// Log completion for non-TTY output
    pub fn log(&self) {
        if self.skipped {
            log::info!(
                "{}: already complete ({} records), skipped",
                self.stem,
                fmt_num(self.resumed_from)
            );
            return;
        }
        log::info!(
            "{}: {}/{} accepted ({:.1}%), {} rejected, {} errors [{:.1}s]",
            self.stem,
            fmt_num(self.accepted),
            fmt_num(self.processed),
            pct(self.accepted, self.processed),
            fmt_num(self.rejected),
            fmt_num(self.errors),
            self.elapsed.as_secs_f64()
        );
    }
}

/// Process one input file, resuming from its checkpoint.
///
/// Per record the routed output is flushed first, then the stats snapshot
/// and finally the checkpoint are rewritten. Stage failures and undecodable
/// records go to the error sink and do not stop the file.
pub fn process_file(
    source: &Source,
    ctx: &FileContext<'_>,
    pb: &ProgressBar,
) -> Result<FileReport, FileError> {
    let start = Instant::now();
    let mut checkpoint =
        Checkpoint::open(ctx.output_dir, &source.stem).map_err(FileError::Checkpoint)?;
    let snapshot_file = snapshot_path(ctx.output_dir, &source.stem);
    let snapshot = read_snapshot(&snapshot_file).map_err(FileError::Checkpoint)?;

    // The snapshot is written after the record's output and before the
    // checkpoint, so a snapshot ahead of the checkpoint marks records whose
    // output is already on disk.
    if let Some(ahead) = snapshot.as_ref().map(|s| s.lines).filter(|&n| n > checkpoint.get()) {
        log::warn!(
            "{}: checkpoint {} behind stats snapshot, advancing to {}",
            source.stem,
            checkpoint.get(),
            ahead
        );
        checkpoint.set(ahead).map_err(FileError::Checkpoint)?;
    }
    let resumed_from = checkpoint.get();

    let mut stats = ctx.chain.new_stats();
    let snapshot = snapshot.filter(|_| resumed_from > 0);
    if let Some(snapshot) = &snapshot {
        stats.restore(snapshot);
    } else if resumed_from > 0 {
        log::warn!(
            "{}: no stats snapshot, counters restart at record {}",
            source.stem,
            resumed_from
        );
    }

    let mut records = open_records(source, ctx.text_key, resumed_from)?.peekable();
    if resumed_from > 0 && records.peek().is_none() {
        let stats = snapshot.map(|s| FileStats::from_snapshot(&source.name, &stats, &s));
        return Ok(FileReport {
            name: source.name.clone(),
            stem: source.stem.clone(),
            resumed_from,
            skipped: true,
            processed: 0,
            accepted: 0,
            rejected: 0,
            errors: 0,
            stats,
            elapsed: start.elapsed(),
        });
    }

    if resumed_from > 0 {
        log::info!("{}: resuming at record {}", source.stem, fmt_num(resumed_from));
    } else {
        log::debug!("{}: starting", source.stem);
    }

    let mut sinks = FileSinks::open(SinkPaths::new(ctx.output_dir, &source.stem), resumed_from > 0)
        .map_err(FileError::Output)?;
    let mut done = resumed_from;

    for item in records {
        let record = item?;
        match record.body {
            Ok(raw) => route(ctx, &mut sinks, &mut stats, record.index, raw)?,
            Err(err) => {
                let RecordError::InvalidUtf8 { lossy } = &err;
                sinks
                    .write_error(&ErrorRecord {
                        line: record.index + 1,
                        error: err.to_string(),
                        raw: lossy,
                    })
                    .map_err(FileError::Output)?;
            }
        }

        done = record.index + 1;
        write_snapshot(&snapshot_file, done, &stats).map_err(FileError::Checkpoint)?;
        checkpoint.set(done).map_err(FileError::Checkpoint)?;

        let processed = done - resumed_from;
        if processed % PROGRESS_INTERVAL == 0 {
            pb.set_message(format!(
                "{} lines ({:.1}% accepted)",
                fmt_num(processed),
                pct(sinks.accepted_count, processed)
            ));
        }
    }

    // Also covers files with no records at all
    write_snapshot(&snapshot_file, done, &stats).map_err(FileError::Checkpoint)?;

    let (accepted, rejected, errors) =
        (sinks.accepted_count, sinks.rejected_count, sinks.error_count);
    sinks.finish().map_err(FileError::Output)?;

    Ok(FileReport {
        name: source.name.clone(),
        stem: source.stem.clone(),
        resumed_from,
        skipped: false,
        processed: done - resumed_from,
        accepted,
        rejected,
        errors,
        stats: Some(FileStats {
            file: source.name.clone(),
            stages: stats,
        }),
        elapsed: start.elapsed(),
    })
}

/// Run the chain over one raw record and write it to the matching sink
fn route(
    ctx: &FileContext<'_>,
    sinks: &mut FileSinks,
    stats: &mut ChainStats,
    index: u64,
    raw: String,
) -> Result<(), FileError> {
    let mut doc = Document::new(raw);
    let written = match ctx.chain.apply(&mut doc, stats) {
        Err(e) => sinks.write_error(&ErrorRecord {
            line: index + 1,
            error: e.to_string(),
            raw: doc.raw(),
        }),
        Ok(()) if doc.is_rejected() => {
            let line = match ctx.rejected_format {
                RejectedFormat::Raw => doc.raw(),
                RejectedFormat::Dumped => doc.dumped().unwrap_or(doc.raw()),
            };
            sinks.write_rejected(line)
        }
        Ok(()) => match doc.dumped() {
            Some(line) => sinks.write_accepted(line),
            None => sinks.write_error(&ErrorRecord {
                line: index + 1,
                error: "chain produced no output line".into(),
                raw: doc.raw(),
            }),
        },
    };
    written.map_err(FileError::Output)
}
