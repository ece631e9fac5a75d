//! Docsift Filters - document filtering stages and run orchestration
//!
//! This crate provides the concrete filter stages (loading, normalization,
//! content filters, segmentation, language acceptance, PII masking, dumping),
//! the canonical chain builder and the per-file and run-level drivers.
//!
//! # Example
//!
//! ```no_run
//! use docsift_core::ProgressContext;
//! use docsift_filters::{Config, run};
//!
//! let config = Config {
//!     input_dir: "data/raw".into(),
//!     output_dir: "data/filtered".into(),
//!     ..Default::default()
//! };
//!
//! let summary = run(&config, &ProgressContext::hidden()).expect("Pipeline failed");
//! println!("Accepted {} documents", summary.accepted);
//! ```

pub mod bbs;
pub mod char_ratio;
pub mod config;
pub mod dumper;
pub mod error;
pub mod keywords;
pub mod language;
pub mod length;
pub mod loader;
pub mod normalize;
pub mod pii;
pub mod pipeline;
pub mod runner;
pub mod segments;
pub mod text;
pub mod worker;

// Re-exports for convenience
pub use config::{CharClass, Config, RejectedFormat, StagesConfig};
pub use error::{BuildError, FileError};
pub use language::{Detection, LanguageIdentifier, WhatlangIdentifier};
pub use pipeline::{build_chain, build_chain_with};
pub use runner::{RunSummary, discover_sources, run};
pub use worker::{FileContext, FileReport, process_file};
