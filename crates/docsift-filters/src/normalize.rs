//! Unicode compatibility normalization

use docsift_core::{Document, Stage, StageError};
use unicode_normalization::{IsNormalized, UnicodeNormalization, is_nfkc_quick};

/// Applies NFKC (full-width → half-width, compatibility ligatures, ...).
/// Never rejects.
#[derive(Debug, Clone, Default)]
pub struct DocumentNormalizer;

impl Stage for DocumentNormalizer {
    fn name(&self) -> &str {
        "document_normalizer"
    }

    fn apply(&self, doc: &mut Document) -> Result<(), StageError> {
        if is_nfkc_quick(doc.text().chars()) == IsNormalized::Yes {
            return Ok(());
        }
        let normalized: String = doc.text().nfkc().collect();
        doc.set_text(normalized);
        Ok(())
    }
}
