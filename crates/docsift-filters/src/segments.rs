//! Line segmentation stages.
//!
//! `split_lines` fills the segment buffer, the removal stages prune it and
//! `merge_segments` joins what is left back into the working text. Each of
//! the latter three is a no-op when no buffer is present.

use std::sync::LazyLock;

use docsift_core::{Document, Stage, StageError};
use regex::Regex;

use crate::text::word_count;

/// Date-only line, optionally followed by a weekday and a time
static DATE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?:\d{4}年\d{1,2}月\d{1,2}日|\d{4}[/.\-]\d{1,2}[/.\-]\d{1,2}|\d{1,2}月\d{1,2}日)",
        r"\s*(?:[(（][月火水木金土日][)）])?",
        r"\s*(?:\d{1,2}:\d{2}(?::\d{2})?)?$"
    ))
    .expect("invalid date pattern")
});

#[derive(Debug, Clone, Copy, Default)]
pub struct SplitLines;

impl Stage for SplitLines {
    fn name(&self) -> &str {
        "split_lines"
    }

    fn apply(&self, doc: &mut Document) -> Result<(), StageError> {
        let segments = doc
            .text()
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect();
        doc.set_segments(segments);
        Ok(())
    }
}

/// Drops segments with at most one word token
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveOneWord;

impl Stage for RemoveOneWord {
    fn name(&self) -> &str {
        "remove_one_word"
    }

    fn apply(&self, doc: &mut Document) -> Result<(), StageError> {
        if let Some(segments) = doc.segments_mut() {
            segments.retain(|s| word_count(s) > 1);
        }
        Ok(())
    }
}

/// Drops segments that are nothing but a date
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveDate;

impl RemoveDate {
    pub fn is_date_line(segment: &str) -> bool {
        DATE_LINE.is_match(segment.trim())
    }
}

impl Stage for RemoveDate {
    fn name(&self) -> &str {
        "remove_date"
    }

    fn apply(&self, doc: &mut Document) -> Result<(), StageError> {
        if let Some(segments) = doc.segments_mut() {
            segments.retain(|s| !Self::is_date_line(s));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct MergeSegments {
    delimiter: String,
}

impl MergeSegments {
    pub fn new(delimiter: impl Into<String>) -> Self {
        Self {
            delimiter: delimiter.into(),
        }
    }
}

impl Stage for MergeSegments {
    fn name(&self) -> &str {
        "merge_segments"
    }

    fn apply(&self, doc: &mut Document) -> Result<(), StageError> {
        if let Some(segments) = doc.take_segments() {
            doc.set_text(segments.join(&self.delimiter));
        }
        Ok(())
    }
}
