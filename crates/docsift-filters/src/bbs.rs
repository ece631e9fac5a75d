//! Bulletin-board comment detection

use std::sync::LazyLock;

use docsift_core::{Document, Stage, StageError};
use regex::Regex;

/// Post headers, reply anchors, poster IDs and anonymous-poster names
static BBS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?m)(?:^\s*\d{1,5}\s*[:：]",
        r"|>>\d{1,5}",
        r"|ID\s*[:：]\s*[0-9A-Za-z+/.]{6,}",
        r"|名無し(?:さん)?",
        r"|\d{4}/\d{1,2}/\d{1,2}\s*[(（].[)）]\s*\d{1,2}:\d{2}",
        r")"
    ))
    .expect("invalid BBS pattern")
});

/// Rejects text with more than `max_allowed_num` BBS pattern matches.
#[derive(Debug, Clone)]
pub struct DiscardBbsComments {
    max_allowed_num: usize,
}

impl DiscardBbsComments {
    pub fn new(max_allowed_num: usize) -> Self {
        Self { max_allowed_num }
    }
}

impl Stage for DiscardBbsComments {
    fn name(&self) -> &str {
        "discard_bbs_comments"
    }

    fn apply(&self, doc: &mut Document) -> Result<(), StageError> {
        // Stop counting once over the limit
        let hits = BBS_PATTERN
            .find_iter(doc.text())
            .take(self.max_allowed_num + 1)
            .count();
        if hits > self.max_allowed_num {
            doc.reject(self.name());
        }
        Ok(())
    }
}
