//! Document length bounds

use docsift_core::{Document, Stage, StageError};

/// Rejects documents whose length in characters is outside
/// `min_doc_len..=max_doc_len`. Both bounds are accepted.
#[derive(Debug, Clone)]
pub struct DocumentLengthFilter {
    min_doc_len: usize,
    max_doc_len: usize,
}

impl DocumentLengthFilter {
    pub fn new(min_doc_len: usize, max_doc_len: usize) -> Self {
        Self {
            min_doc_len,
            max_doc_len,
        }
    }
}

impl Stage for DocumentLengthFilter {
    fn name(&self) -> &str {
        "document_length"
    }

    fn apply(&self, doc: &mut Document) -> Result<(), StageError> {
        let len = doc.text().chars().count();
        if !(self.min_doc_len..=self.max_doc_len).contains(&len) {
            doc.reject(self.name());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(len: usize) -> bool {
        let mut doc = Document::new("あ".repeat(len));
        DocumentLengthFilter::new(10, 100_000).apply(&mut doc).unwrap();
        doc.is_rejected()
    }

    #[test]
    fn bounds_are_inclusive() {
        assert!(rejected(9));
        assert!(!rejected(10));
        assert!(!rejected(100_000));
        assert!(rejected(100_001));
    }

    #[test]
    fn counts_characters_not_bytes() {
        // 4 multi-byte chars = 12 bytes, still too short
        assert!(rejected(4));
    }

    #[test]
    fn empty_text_rejected() {
        assert!(rejected(0));
    }
}
