//! Per-stage seen/rejected counters and their on-disk forms.
//!
//! - [`ChainStats`]: counters for one file, positionally aligned with a chain
//! - [`StatsSnapshot`]: `<stem>_stats.json`, rewritten after every record
//! - [`FileStats`]: one line of the run-level `stats.filtering.jsonl`

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::progress::fmt_num;
use crate::sink::write_atomic;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCounts {
    pub seen: u64,
    pub rejected: u64,
}

/// Counters for every stage of a chain, in chain order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainStats {
    stages: Vec<(String, StageCounts)>,
}

impl ChainStats {
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            stages: names
                .into_iter()
                .map(|n| (n.into(), StageCounts::default()))
                .collect(),
        }
    }

    pub(crate) fn record(&mut self, idx: usize, rejected: bool) {
        if let Some((_, counts)) = self.stages.get_mut(idx) {
            counts.seen += 1;
            if rejected {
                counts.rejected += 1;
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<StageCounts> {
        self.stages
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| *c)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, StageCounts)> {
        self.stages.iter().map(|(n, c)| (n.as_str(), *c))
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Add another file's counters into this one, matching stages by name.
    /// Stages unknown to `self` are appended.
    pub fn merge(&mut self, other: &ChainStats) {
        for (name, counts) in &other.stages {
            match self.stages.iter_mut().find(|(n, _)| n == name) {
                Some((_, c)) => {
                    c.seen += counts.seen;
                    c.rejected += counts.rejected;
                }
                None => self.stages.push((name.clone(), *counts)),
            }
        }
    }

    /// Overwrite counters from a persisted snapshot; stages absent from the
    /// snapshot keep their current values.
    pub fn restore(&mut self, snapshot: &StatsSnapshot) {
        for (name, counts) in &mut self.stages {
            if let Some(saved) = snapshot.stages.get(name) {
                *counts = *saved;
            }
        }
    }

    /// Summary table of per-stage counts.
    pub fn format_table(&self, title: &str) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec![
                Cell::new(title)
                    .fg(Color::Cyan)
                    .add_attribute(comfy_table::Attribute::Bold),
                Cell::new("Seen").fg(Color::Cyan),
                Cell::new("Rejected").fg(Color::Cyan),
                Cell::new("%").fg(Color::Cyan),
            ]);

        for (name, counts) in self.iter() {
            let pct = if counts.seen > 0 {
                counts.rejected as f64 / counts.seen as f64 * 100.0
            } else {
                0.0
            };
            let reject_cell = if counts.rejected > 0 {
                Cell::new(fmt_num(counts.rejected)).fg(Color::Yellow)
            } else {
                Cell::new(fmt_num(counts.rejected))
            };
            table.add_row(vec![
                Cell::new(name),
                Cell::new(fmt_num(counts.seen)),
                reject_cell,
                Cell::new(format!("{pct:.1}")),
            ]);
        }
        format!("\n{table}")
    }
}

/// Serialized as a JSON object keyed by stage name, preserving chain order.
impl Serialize for ChainStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.stages.len()))?;
        for (name, counts) in &self.stages {
            map.serialize_entry(name, counts)?;
        }
        map.end()
    }
}

/// Persisted counters for a partially or fully processed file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StatsSnapshot {
    /// Records covered by these counters
    pub lines: u64,
    pub stages: BTreeMap<String, StageCounts>,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    lines: u64,
    stages: &'a ChainStats,
}

/// Snapshot file path for an input stem
pub fn snapshot_path(output_dir: &Path, stem: &str) -> PathBuf {
    output_dir.join(format!("{stem}_stats.json"))
}

/// Atomically rewrite a stats snapshot.
pub fn write_snapshot(path: &Path, lines: u64, stats: &ChainStats) -> io::Result<()> {
    let json = serde_json::to_vec(&SnapshotRef {
        lines,
        stages: stats,
    })
    .map_err(io::Error::other)?;
    write_atomic(path, &json)
}

/// Load a snapshot if one exists. A corrupt snapshot is an error.
pub fn read_snapshot(path: &Path) -> io::Result<Option<StatsSnapshot>> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// One record of the run-level statistics file.
#[derive(Debug, Clone, Serialize)]
pub struct FileStats {
    pub file: String,
    pub stages: ChainStats,
}

impl FileStats {
    /// Build from a snapshot, ordering stages like `order` (chain order).
    /// Snapshot stages not in `order` follow in name order.
    pub fn from_snapshot(
        file: impl Into<String>,
        order: &ChainStats,
        snapshot: &StatsSnapshot,
    ) -> Self {
        let mut stages = ChainStats::new(order.iter().map(|(n, _)| n.to_string()));
        stages.restore(snapshot);
        for (name, counts) in &snapshot.stages {
            if stages.get(name).is_none() {
                stages.stages.push((name.clone(), *counts));
            }
        }
        Self {
            file: file.into(),
            stages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn stats(names: &[&str]) -> ChainStats {
        ChainStats::new(names.iter().copied())
    }

    #[test]
    fn record_increments_seen_and_rejected() {
        let mut s = stats(&["a", "b"]);
        s.record(0, false);
        s.record(0, true);
        s.record(1, false);
        assert_eq!(s.get("a"), Some(StageCounts { seen: 2, rejected: 1 }));
        assert_eq!(s.get("b"), Some(StageCounts { seen: 1, rejected: 0 }));
        assert_eq!(s.get("c"), None);
    }

    #[test]
    fn record_out_of_range_is_ignored() {
        let mut s = stats(&["a"]);
        s.record(5, true);
        assert_eq!(s.get("a"), Some(StageCounts::default()));
    }

    #[test]
    fn serialize_preserves_chain_order() {
        let mut s = stats(&["zeta", "alpha"]);
        s.record(0, true);
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(
            json,
            r#"{"zeta":{"seen":1,"rejected":1},"alpha":{"seen":0,"rejected":0}}"#
        );
    }

    #[test]
    fn merge_adds_by_name() {
        let mut a = stats(&["x", "y"]);
        a.record(0, true);
        let mut b = stats(&["x", "z"]);
        b.record(0, false);
        b.record(1, true);
        a.merge(&b);
        assert_eq!(a.get("x"), Some(StageCounts { seen: 2, rejected: 1 }));
        assert_eq!(a.get("y"), Some(StageCounts::default()));
        assert_eq!(a.get("z"), Some(StageCounts { seen: 1, rejected: 1 }));
    }

    #[test]
    fn snapshot_write_read_restore() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("f_stats.json");
        let mut s = stats(&["a", "b"]);
        s.record(0, false);
        s.record(1, true);
        write_snapshot(&path, 7, &s).unwrap();

        let snap = read_snapshot(&path).unwrap().unwrap();
        assert_eq!(snap.lines, 7);

        let mut fresh = stats(&["a", "b"]);
        fresh.restore(&snap);
        assert_eq!(fresh, s);
    }

    #[test]
    fn read_snapshot_missing_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(read_snapshot(&dir.path().join("nope.json")).unwrap().is_none());
    }

    #[test]
    fn read_snapshot_corrupt_is_invalid_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, b"{not json").unwrap();
        let err = read_snapshot(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn file_stats_serialization() {
        let mut order = stats(&["json_loader", "document_length"]);
        order.record(1, true);
        let snap = StatsSnapshot {
            lines: 1,
            stages: [("document_length".to_string(), StageCounts { seen: 1, rejected: 1 })]
                .into_iter()
                .collect(),
        };
        let fs = FileStats::from_snapshot("a.jsonl", &order, &snap);
        let json = serde_json::to_string(&fs).unwrap();
        assert_eq!(
            json,
            r#"{"file":"a.jsonl","stages":{"json_loader":{"seen":0,"rejected":0},"document_length":{"seen":1,"rejected":1}}}"#
        );
    }

    #[test]
    fn format_table_lists_stages() {
        let mut s = stats(&["document_length"]);
        s.record(0, true);
        let table = s.format_table("Stage");
        assert!(table.contains("document_length"));
        assert!(table.contains("100.0"));
    }
}
