//! Filter stage contract

use crate::document::Document;
use crate::error::StageError;

/// One transformation/rejection unit of a [`Chain`](crate::Chain).
///
/// Stages carry only immutable configuration so a chain can be shared across
/// worker threads; per-stage counters live in [`ChainStats`](crate::ChainStats).
/// A stage may rewrite text, fields and segments, and may call
/// [`Document::reject`]. It must not depend on external mutable state, since a
/// record can be replayed once after a crash.
pub trait Stage: Send + Sync {
    /// Stable identifier used in rejection reasons and statistics
    fn name(&self) -> &str;

    fn apply(&self, doc: &mut Document) -> Result<(), StageError>;

    /// Whether the stage still runs once the document has been rejected.
    ///
    /// Only output-shaping stages (the dumper) return `true`.
    fn runs_on_rejected(&self) -> bool {
        false
    }
}

impl std::fmt::Debug for dyn Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage").field("name", &self.name()).finish()
    }
}
