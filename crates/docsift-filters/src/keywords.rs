//! Keyword dictionaries and the keyword-ratio filter

use std::path::Path;

use docsift_core::{Document, Stage, StageError};
use regex::{Regex, RegexBuilder};
use rustc_hash::FxHashSet;

use crate::error::BuildError;
use crate::text::word_count;

/// Compiled regex size limit for large dictionaries (64MB)
const DICT_REGEX_SIZE_LIMIT: usize = 64 * 1024 * 1024;

/// Fixed keyword set compiled into one case-insensitive alternation.
#[derive(Debug, Clone)]
pub struct KeywordDictionary {
    pattern: Option<Regex>,
    len: usize,
}

impl KeywordDictionary {
    /// Build from dictionary text: one keyword per line, `#` comments and
    /// blank lines ignored, duplicates removed.
    pub fn parse(content: &str) -> Result<Self, BuildError> {
        let mut seen = FxHashSet::default();
        let mut words: Vec<&str> = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .filter(|l| seen.insert(*l))
            .collect();
        if words.is_empty() {
            return Ok(Self {
                pattern: None,
                len: 0,
            });
        }
        // Longest first so the leftmost match is also the longest keyword
        words.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
        let alternation = words
            .iter()
            .map(|w| regex::escape(w))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = RegexBuilder::new(&alternation)
            .case_insensitive(true)
            .size_limit(DICT_REGEX_SIZE_LIMIT)
            .build()?;
        Ok(Self {
            pattern: Some(pattern),
            len: words.len(),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, BuildError> {
        let content = std::fs::read_to_string(path).map_err(|source| BuildError::Dictionary {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Number of distinct keywords
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Count left-most, non-overlapping keyword matches
    pub fn count_matches(&self, text: &str) -> usize {
        self.pattern
            .as_ref()
            .map_or(0, |p| p.find_iter(text).count())
    }
}

/// Rejects when `matches / words > threshold`.
///
/// Text with zero word tokens is never rejected by this stage.
#[derive(Debug, Clone)]
pub struct KeywordRatioFilter {
    name: String,
    dictionary: KeywordDictionary,
    threshold: f64,
}

impl KeywordRatioFilter {
    pub fn new(name: impl Into<String>, dictionary: KeywordDictionary, threshold: f64) -> Self {
        Self {
            name: name.into(),
            dictionary,
            threshold,
        }
    }

    /// Keyword ratio of `text`, `None` when it has no word tokens
    pub fn ratio(&self, text: &str) -> Option<f64> {
        let words = word_count(text);
        if words == 0 {
            return None;
        }
        Some(self.dictionary.count_matches(text) as f64 / words as f64)
    }
}

impl Stage for KeywordRatioFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, doc: &mut Document) -> Result<(), StageError> {
        if let Some(ratio) = self.ratio(doc.text()) {
            if ratio > self.threshold {
                doc.reject(&self.name);
            }
        }
        Ok(())
    }
}
