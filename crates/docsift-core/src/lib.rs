//! Docsift Core - streaming document-filtering infrastructure
//!
//! This crate provides the reusable pieces of a filtering pipeline:
//! the per-record [`Document`], the [`Stage`] contract and [`Chain`]
//! executor, per-stage statistics, write-through checkpoints, restartable
//! source readers and routed output sinks.

pub mod chain;
pub mod checkpoint;
pub mod document;
pub mod error;
pub mod logging;
pub mod progress;
pub mod sink;
pub mod source;
pub mod stage;
pub mod stats;

// Re-exports for convenience
pub use chain::Chain;
pub use checkpoint::{Checkpoint, progress_path};
pub use document::Document;
pub use error::{RecordError, SourceError, StageError};
pub use logging::{IndicatifLogger, Verbosity, init_logging};
pub use progress::{ProgressContext, SharedProgress, fmt_num, pct};
pub use sink::{ErrorRecord, FileSinks, JsonlSink, SinkPaths, cleanup_tmp_files, write_atomic};
pub use source::{Record, Records, Source, SourceFormat, open_records};
pub use stage::Stage;
pub use stats::{
    ChainStats, FileStats, StageCounts, StatsSnapshot, read_snapshot, snapshot_path, write_snapshot,
};
