//! Fixed, ordered sequence of stages applied to every document

use crate::document::Document;
use crate::error::StageError;
use crate::stage::Stage;
use crate::stats::ChainStats;

/// Ordered stage pipeline, constructed once and never reordered.
///
/// `Chain` is immutable after construction and `Sync`, so one instance can
/// serve several files in parallel; each file passes its own [`ChainStats`].
#[derive(Debug)]
pub struct Chain {
    stages: Vec<Box<dyn Stage>>,
}

impl Chain {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|s| s.name())
    }

    /// Fresh zeroed counters aligned with this chain
    pub fn new_stats(&self) -> ChainStats {
        ChainStats::new(self.stage_names())
    }

    /// Run every stage over `doc` in order.
    ///
    /// Once the document is rejected, stages that do not opt in via
    /// [`Stage::runs_on_rejected`] are skipped and not counted. On a stage
    /// error the remaining stages are not run.
    pub fn apply(&self, doc: &mut Document, stats: &mut ChainStats) -> Result<(), StageError> {
        for (idx, stage) in self.stages.iter().enumerate() {
            let was_rejected = doc.is_rejected();
            if was_rejected && !stage.runs_on_rejected() {
                continue;
            }
            let result = stage.apply(doc);
            stats.record(idx, !was_rejected && doc.is_rejected());
            result?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StageCounts;

    struct RejectIf(&'static str, fn(&str) -> bool);

    impl Stage for RejectIf {
        fn name(&self) -> &str {
            self.0
        }
        fn apply(&self, doc: &mut Document) -> Result<(), StageError> {
            if (self.1)(doc.text()) {
                doc.reject(self.0);
            }
            Ok(())
        }
    }

    struct Upper;

    impl Stage for Upper {
        fn name(&self) -> &str {
            "upper"
        }
        fn apply(&self, doc: &mut Document) -> Result<(), StageError> {
            let up = doc.text().to_uppercase();
            doc.set_text(up);
            Ok(())
        }
    }

    struct Dump;

    impl Stage for Dump {
        fn name(&self) -> &str {
            "dump"
        }
        fn apply(&self, doc: &mut Document) -> Result<(), StageError> {
            let line = format!("{}|{}", doc.text(), doc.is_rejected());
            doc.set_dumped(line);
            Ok(())
        }
        fn runs_on_rejected(&self) -> bool {
            true
        }
    }

    struct Fail;

    impl Stage for Fail {
        fn name(&self) -> &str {
            "fail"
        }
        fn apply(&self, _doc: &mut Document) -> Result<(), StageError> {
            Err(StageError::new("fail", "boom"))
        }
    }

    fn chain() -> Chain {
        Chain::new(vec![
            Box::new(RejectIf("short", |t| t.len() < 3)),
            Box::new(Upper),
            Box::new(RejectIf("has_x", |t| t.contains('X'))),
            Box::new(Dump),
        ])
    }

    #[test]
    fn stages_run_in_order() {
        let c = chain();
        let mut stats = c.new_stats();
        let mut doc = Document::new("abcd");
        c.apply(&mut doc, &mut stats).unwrap();
        assert_eq!(doc.text(), "ABCD");
        assert!(!doc.is_rejected());
        assert_eq!(doc.dumped(), Some("ABCD|false"));
    }

    #[test]
    fn rejected_document_skips_content_stages_but_dumps() {
        let c = chain();
        let mut stats = c.new_stats();
        let mut doc = Document::new("ab");
        c.apply(&mut doc, &mut stats).unwrap();
        assert_eq!(doc.rejection_reason(), Some("short"));
        // Upper skipped
        assert_eq!(doc.text(), "ab");
        assert_eq!(doc.dumped(), Some("ab|true"));
        assert_eq!(stats.get("upper"), Some(StageCounts::default()));
        assert_eq!(stats.get("dump"), Some(StageCounts { seen: 1, rejected: 0 }));
    }

    #[test]
    fn rejection_counted_only_by_first_rejecting_stage() {
        let c = chain();
        let mut stats = c.new_stats();
        for text in ["ab", "xyz", "hello", "x"] {
            let mut doc = Document::new(text);
            c.apply(&mut doc, &mut stats).unwrap();
        }
        assert_eq!(stats.get("short"), Some(StageCounts { seen: 4, rejected: 2 }));
        assert_eq!(stats.get("upper"), Some(StageCounts { seen: 2, rejected: 0 }));
        assert_eq!(stats.get("has_x"), Some(StageCounts { seen: 2, rejected: 1 }));
        assert_eq!(stats.get("dump"), Some(StageCounts { seen: 4, rejected: 0 }));
    }

    #[test]
    fn stage_error_stops_chain() {
        let c = Chain::new(vec![Box::new(Fail), Box::new(Dump)]);
        let mut stats = c.new_stats();
        let mut doc = Document::new("abc");
        let err = c.apply(&mut doc, &mut stats).unwrap_err();
        assert_eq!(err.stage, "fail");
        assert!(doc.dumped().is_none());
        assert_eq!(stats.get("fail"), Some(StageCounts { seen: 1, rejected: 0 }));
        assert_eq!(stats.get("dump"), Some(StageCounts::default()));
    }

    #[test]
    fn verdict_is_monotonic_across_stages() {
        let c = chain();
        let mut stats = c.new_stats();
        let mut doc = Document::new("x");
        c.apply(&mut doc, &mut stats).unwrap();
        assert!(doc.is_rejected());
        assert_eq!(doc.rejection_reason(), Some("short"));
    }

    #[test]
    fn chain_is_sync() {
        fn assert_sync<T: Sync + Send>() {}
        assert_sync::<Chain>();
    }
}
