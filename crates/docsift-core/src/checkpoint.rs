//! Write-through per-file progress tracking.
//!
//! The checkpoint for an input file is `<stem>_progress.txt` holding a single
//! integer: the number of records fully processed. It is rewritten (tmp +
//! rename) after every record, and only after that record's output was
//! flushed, so it never runs ahead of persisted output.

use std::io;
use std::path::{Path, PathBuf};

use crate::sink::write_atomic;

/// Checkpoint file path for an input stem
pub fn progress_path(output_dir: &Path, stem: &str) -> PathBuf {
    output_dir.join(format!("{stem}_progress.txt"))
}

/// Persisted last-completed record index for one input file.
#[derive(Debug)]
pub struct Checkpoint {
    path: PathBuf,
    value: u64,
}

impl Checkpoint {
    /// Open the checkpoint for `stem`, reading the persisted value (0 if absent).
    pub fn open(output_dir: &Path, stem: &str) -> io::Result<Self> {
        let path = progress_path(output_dir, stem);
        let value = read_progress(&path)?;
        Ok(Self { path, value })
    }

    pub fn get(&self) -> u64 {
        self.value
    }

    /// Persist `value` immediately.
    ///
    /// Values below the current one are ignored so the checkpoint is monotonic.
    pub fn set(&mut self, value: u64) -> io::Result<()> {
        if value < self.value {
            log::warn!(
                "{}: ignoring checkpoint regression {} -> {value}",
                self.path.display(),
                self.value
            );
            return Ok(());
        }
        write_atomic(&self.path, value.to_string().as_bytes())?;
        self.value = value;
        Ok(())
    }
}

fn read_progress(path: &Path) -> io::Result<u64> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed.parse().map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{}: bad checkpoint {trimmed:?}: {e}", path.display()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_checkpoint_is_zero() {
        let dir = TempDir::new().unwrap();
        let cp = Checkpoint::open(dir.path(), "wiki").unwrap();
        assert_eq!(cp.get(), 0);
        assert!(!progress_path(dir.path(), "wiki").exists());
    }

    #[test]
    fn set_persists_plain_integer() {
        let dir = TempDir::new().unwrap();
        let mut cp = Checkpoint::open(dir.path(), "wiki").unwrap();
        cp.set(42).unwrap();
        let on_disk = std::fs::read_to_string(dir.path().join("wiki_progress.txt")).unwrap();
        assert_eq!(on_disk, "42");

        let reopened = Checkpoint::open(dir.path(), "wiki").unwrap();
        assert_eq!(reopened.get(), 42);
    }

    #[test]
    fn set_never_regresses() {
        let dir = TempDir::new().unwrap();
        let mut cp = Checkpoint::open(dir.path(), "w").unwrap();
        cp.set(10).unwrap();
        cp.set(3).unwrap();
        assert_eq!(cp.get(), 10);
        assert_eq!(Checkpoint::open(dir.path(), "w").unwrap().get(), 10);
    }

    #[test]
    fn tolerates_trailing_newline() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("w_progress.txt"), "17\n").unwrap();
        assert_eq!(Checkpoint::open(dir.path(), "w").unwrap().get(), 17);
    }

    #[test]
    fn garbage_is_invalid_data() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("w_progress.txt"), "abc").unwrap();
        let err = Checkpoint::open(dir.path(), "w").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn no_tmp_file_left_behind() {
        let dir = TempDir::new().unwrap();
        let mut cp = Checkpoint::open(dir.path(), "w").unwrap();
        cp.set(1).unwrap();
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["w_progress.txt".to_string()]);
    }
}
