//! Error types shared by sources, stages and the chain

use std::fmt;

/// Unexpected failure of a single stage on a single record.
///
/// Never fatal for the run: the worker routes the record to the error sink
/// and advances the checkpoint past it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageError {
    pub stage: String,
    pub message: String,
}

impl StageError {
    pub fn new(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.stage, self.message)
    }
}

impl std::error::Error for StageError {}

/// Error opening or reading an input file. Fatal for that file.
#[derive(Debug)]
pub enum SourceError {
    Io(std::io::Error),
    Parquet(parquet::errors::ParquetError),
    Arrow(arrow::error::ArrowError),
    /// Configured text column not present in the columnar file
    MissingColumn(String),
    /// Text column has a non-string type
    UnsupportedColumn { column: String, data_type: String },
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO: {e}"),
            Self::Parquet(e) => write!(f, "parquet: {e}"),
            Self::Arrow(e) => write!(f, "arrow: {e}"),
            Self::MissingColumn(c) => write!(f, "column '{c}' not found"),
            Self::UnsupportedColumn { column, data_type } => {
                write!(f, "column '{column}' has unsupported type {data_type}")
            }
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parquet(e) => Some(e),
            Self::Arrow(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SourceError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<parquet::errors::ParquetError> for SourceError {
    fn from(e: parquet::errors::ParquetError) -> Self {
        Self::Parquet(e)
    }
}

impl From<arrow::error::ArrowError> for SourceError {
    fn from(e: arrow::error::ArrowError) -> Self {
        Self::Arrow(e)
    }
}

/// Per-record decode failure. The record occupies a line index but never
/// reaches the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Line bytes are not valid UTF-8; carries the lossy rendering
    InvalidUtf8 { lossy: String },
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUtf8 { .. } => write!(f, "invalid UTF-8 in record"),
        }
    }
}

impl std::error::Error for RecordError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;

    #[test]
    fn stage_error_display() {
        let err = StageError::new("json_dumper", "serialization failed");
        assert_eq!(format!("{err}"), "json_dumper: serialization failed");
    }

    #[test]
    fn source_error_display_io() {
        let err = SourceError::Io(std::io::Error::new(ErrorKind::NotFound, "not found"));
        assert!(format!("{err}").contains("IO:"));
    }

    #[test]
    fn source_error_missing_column() {
        let err = SourceError::MissingColumn("body".into());
        assert_eq!(format!("{err}"), "column 'body' not found");
    }

    #[test]
    fn source_error_has_source_for_io() {
        use std::error::Error;
        let err = SourceError::from(std::io::Error::other("boom"));
        assert!(err.source().is_some());
        assert!(SourceError::MissingColumn("x".into()).source().is_none());
    }
}
