//! Per-record unit of work flowing through a [`Chain`](crate::Chain)

use serde_json::{Map, Value};

/// A single input record and its working state.
///
/// `text` starts out equal to the raw record and is rewritten by stages.
/// The rejection verdict is monotonic: [`reject`](Document::reject) can only
/// set it, and the first reason recorded is kept.
#[derive(Debug, Clone)]
pub struct Document {
    raw: String,
    text: String,
    fields: Map<String, Value>,
    rejection: Option<String>,
    segments: Option<Vec<String>>,
    dumped: Option<String>,
}

impl Document {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        Self {
            text: raw.clone(),
            raw,
            fields: Map::new(),
            rejection: None,
            segments: None,
            dumped: None,
        }
    }

    /// Original record exactly as read from the source
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Structured fields extracted by the loader (text key excluded)
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.fields
    }

    pub fn is_rejected(&self) -> bool {
        self.rejection.is_some()
    }

    /// Name of the stage that first rejected this document
    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection.as_deref()
    }

    /// Mark the document rejected. Returns `true` only when this call flipped the verdict.
    pub fn reject(&mut self, reason: &str) -> bool {
        if self.rejection.is_some() {
            return false;
        }
        self.rejection = Some(reason.to_string());
        true
    }

    /// Segment buffer, present only between a split and a merge stage
    pub fn segments(&self) -> Option<&[String]> {
        self.segments.as_deref()
    }

    pub fn segments_mut(&mut self) -> Option<&mut Vec<String>> {
        self.segments.as_mut()
    }

    pub fn set_segments(&mut self, segments: Vec<String>) {
        self.segments = Some(segments);
    }

    pub fn take_segments(&mut self) -> Option<Vec<String>> {
        self.segments.take()
    }

    /// Serialized output line produced by the terminal dump stage
    pub fn dumped(&self) -> Option<&str> {
        self.dumped.as_deref()
    }

    pub fn set_dumped(&mut self, line: String) {
        self.dumped = Some(line);
    }
}
