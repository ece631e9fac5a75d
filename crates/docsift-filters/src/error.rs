//! Error types: chain construction ([`BuildError`], fatal at startup) and
//! per-file processing ([`FileError`], fatal for that file only).

use std::fmt;
use std::io;
use std::path::PathBuf;

use docsift_core::SourceError;

#[derive(Debug)]
pub enum BuildError {
    /// Language identifier or segmenter cannot serve the configured target
    ClassifierUnavailable(String),
    /// Keyword dictionary could not be read
    Dictionary { path: PathBuf, source: std::io::Error },
    /// A compiled pattern (dictionary or built-in) failed to build
    InvalidPattern(regex::Error),
    InvalidConfig(String),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClassifierUnavailable(msg) => write!(f, "classifier unavailable: {msg}"),
            Self::Dictionary { path, source } => {
                write!(f, "failed to load dictionary {}: {source}", path.display())
            }
            Self::InvalidPattern(e) => write!(f, "invalid pattern: {e}"),
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Dictionary { source, .. } => Some(source),
            Self::InvalidPattern(e) => Some(e),
            _ => None,
        }
    }
}

impl From<regex::Error> for BuildError {
    fn from(e: regex::Error) -> Self {
        Self::InvalidPattern(e)
    }
}

/// Failure that ends processing of one input file
#[derive(Debug)]
pub enum FileError {
    /// Input could not be opened or read
    Source(SourceError),
    /// Accepted, rejected or error sink write failed
    Output(io::Error),
    /// Checkpoint or stats snapshot could not be read or written
    Checkpoint(io::Error),
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source(e) => write!(f, "source: {e}"),
            Self::Output(e) => write!(f, "output: {e}"),
            Self::Checkpoint(e) => write!(f, "checkpoint: {e}"),
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Source(e) => Some(e),
            Self::Output(e) | Self::Checkpoint(e) => Some(e),
        }
    }
}

impl From<SourceError> for FileError {
    fn from(e: SourceError) -> Self {
        Self::Source(e)
    }
}
