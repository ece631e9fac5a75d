//! Output sinks: per-file routed JSONL writers and run-level merged writers

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;

/// Write `bytes` to `path` through a sibling `.tmp` file and rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = tmp_path(path);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Remove stale .tmp files in the output directory
pub fn cleanup_tmp_files(output_dir: &Path) -> io::Result<()> {
    for entry in fs::read_dir(output_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "tmp") {
            log::warn!("Removing stale tmp file: {}", path.display());
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Paths of the per-file output streams
#[derive(Debug, Clone)]
pub struct SinkPaths {
    pub accepted: PathBuf,
    pub rejected: PathBuf,
    pub errors: PathBuf,
}

impl SinkPaths {
    pub fn new(output_dir: &Path, stem: &str) -> Self {
        Self {
            accepted: output_dir.join(format!("{stem}.jsonl")),
            rejected: output_dir.join(format!("{stem}_rejected.jsonl")),
            errors: output_dir.join(format!("{stem}_errors.jsonl")),
        }
    }
}

/// A failed record as written to `<stem>_errors.jsonl`
#[derive(Debug, Serialize)]
pub struct ErrorRecord<'a> {
    pub line: u64,
    pub error: String,
    pub raw: &'a str,
}

/// Accepted / rejected / error sinks for one input file.
///
/// Every write is followed by a flush so that a checkpoint written afterwards
/// never covers output still sitting in a buffer. The error sink is opened on
/// first use.
pub struct FileSinks {
    paths: SinkPaths,
    append: bool,
    accepted: BufWriter<File>,
    rejected: BufWriter<File>,
    errors: Option<BufWriter<File>>,
    pub accepted_count: u64,
    pub rejected_count: u64,
    pub error_count: u64,
}

impl std::fmt::Debug for FileSinks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSinks")
            .field("accepted", &self.paths.accepted)
            .field("append", &self.append)
            .finish_non_exhaustive()
    }
}

fn open_stream(path: &Path, append: bool) -> io::Result<BufWriter<File>> {
    let file = if append {
        OpenOptions::new().create(true).append(true).open(path)?
    } else {
        File::create(path)?
    };
    Ok(BufWriter::new(file))
}

impl FileSinks {
    /// Open the sinks in append mode (resume) or truncating mode (fresh start).
    pub fn open(paths: SinkPaths, append: bool) -> io::Result<Self> {
        let accepted = open_stream(&paths.accepted, append)?;
        let rejected = open_stream(&paths.rejected, append)?;
        if !append && paths.errors.exists() {
            fs::remove_file(&paths.errors)?;
        }
        Ok(Self {
            paths,
            append,
            accepted,
            rejected,
            errors: None,
            accepted_count: 0,
            rejected_count: 0,
            error_count: 0,
        })
    }

    pub fn write_accepted(&mut self, line: &str) -> io::Result<()> {
        write_line(&mut self.accepted, line)?;
        self.accepted_count += 1;
        Ok(())
    }

    pub fn write_rejected(&mut self, line: &str) -> io::Result<()> {
        write_line(&mut self.rejected, line)?;
        self.rejected_count += 1;
        Ok(())
    }

    pub fn write_error(&mut self, record: &ErrorRecord<'_>) -> io::Result<()> {
        let json = serde_json::to_string(record).map_err(io::Error::other)?;
        let writer = match self.errors.take() {
            Some(w) => w,
            None => open_stream(&self.paths.errors, true)?,
        };
        let writer = self.errors.insert(writer);
        write_line(writer, &json)?;
        self.error_count += 1;
        Ok(())
    }

    /// Flush and close all streams
    pub fn finish(mut self) -> io::Result<()> {
        self.accepted.flush()?;
        self.rejected.flush()?;
        if let Some(w) = &mut self.errors {
            w.flush()?;
        }
        Ok(())
    }
}

fn write_line(w: &mut impl Write, line: &str) -> io::Result<()> {
    w.write_all(line.as_bytes())?;
    w.write_all(b"\n")?;
    w.flush()
}

enum Encoder {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

/// Run-level JSONL writer (optionally gzip) with atomic tmp→rename
pub struct JsonlSink {
    encoder: Encoder,
    tmp_path: PathBuf,
    final_path: PathBuf,
    line_count: u64,
}

impl std::fmt::Debug for JsonlSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlSink")
            .field("final_path", &self.final_path)
            .field("line_count", &self.line_count)
            .finish_non_exhaustive()
    }
}

impl JsonlSink {
    /// Create `<base>.jsonl` or `<base>.jsonl.gz` in `output_dir`.
    pub fn new(output_dir: &Path, base: &str, compress: bool) -> io::Result<Self> {
        let filename = if compress {
            format!("{base}.jsonl.gz")
        } else {
            format!("{base}.jsonl")
        };
        let final_path = output_dir.join(&filename);
        let tmp_path = tmp_path(&final_path);

        let file = BufWriter::new(File::create(&tmp_path)?);
        let encoder = if compress {
            Encoder::Gzip(GzEncoder::new(file, Compression::default()))
        } else {
            Encoder::Plain(file)
        };
        Ok(Self {
            encoder,
            tmp_path,
            final_path,
            line_count: 0,
        })
    }

    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        let w: &mut dyn Write = match &mut self.encoder {
            Encoder::Plain(w) => w,
            Encoder::Gzip(w) => w,
        };
        w.write_all(line.as_bytes())?;
        w.write_all(b"\n")?;
        self.line_count += 1;
        Ok(())
    }

    /// Copy every line of a JSONL file into this sink.
    pub fn append_file(&mut self, path: &Path) -> io::Result<u64> {
        use std::io::BufRead;
        let reader = io::BufReader::new(File::open(path)?);
        let mut n = 0;
        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            self.write_line(&line)?;
            n += 1;
        }
        Ok(n)
    }

    /// Flush, finish the gzip trailer and rename tmp → final
    pub fn finalize(self) -> io::Result<(PathBuf, u64)> {
        match self.encoder {
            Encoder::Plain(mut w) => w.flush()?,
            Encoder::Gzip(gz) => gz.finish()?.flush()?,
        }
        fs::rename(&self.tmp_path, &self.final_path)?;
        Ok((self.final_path, self.line_count))
    }
}
