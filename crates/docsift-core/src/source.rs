//! Lazy, restartable record readers over on-disk inputs.
//!
//! Supported inputs, detected from the file name:
//! - `.jsonl` / `.jsonl.gz`: each line is one raw record, verbatim
//! - `.txt` / `.txt.gz`: each line is wrapped into `{"<key>": line}`
//! - `.parquet`: one string column, each row wrapped into `{"<key>": value}`
//!
//! Restarting at an offset skips that many records before yielding. Line
//! formats still scan the skipped bytes; parquet seeks by row offset.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use arrow::array::{Array, StringArray};
use arrow::datatypes::DataType;
use flate2::read::MultiGzDecoder;
use parquet::arrow::ProjectionMask;
use parquet::arrow::arrow_reader::{ParquetRecordBatchReader, ParquetRecordBatchReaderBuilder};
use serde_json::{Map, Value};

use crate::error::{RecordError, SourceError};

/// Buffer size for line readers (256KB)
const READ_BUF_SIZE: usize = 256 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Jsonl { gzip: bool },
    Text { gzip: bool },
    Parquet,
}

impl SourceFormat {
    /// Detect the format from a file name, returning it with the name's stem.
    pub fn detect(file_name: &str) -> Option<(Self, &str)> {
        const SUFFIXES: &[(&str, SourceFormat)] = &[
            (".jsonl.gz", SourceFormat::Jsonl { gzip: true }),
            (".jsonl", SourceFormat::Jsonl { gzip: false }),
            (".txt.gz", SourceFormat::Text { gzip: true }),
            (".txt", SourceFormat::Text { gzip: false }),
            (".parquet", SourceFormat::Parquet),
        ];
        SUFFIXES.iter().find_map(|(suffix, format)| {
            file_name
                .strip_suffix(suffix)
                .filter(|stem| !stem.is_empty())
                .map(|stem| (*format, stem))
        })
    }
}

/// One discovered input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub path: PathBuf,
    /// File name, used as the file id in statistics
    pub name: String,
    /// Name with format extensions removed, used to name outputs
    pub stem: String,
    pub format: SourceFormat,
}

impl Source {
    /// Returns `None` for files with an unsupported extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let (format, stem) = SourceFormat::detect(name)?;
        Some(Self {
            path: path.to_path_buf(),
            name: name.to_string(),
            stem: stem.to_string(),
            format,
        })
    }
}

/// A single raw record and its 0-based position in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub index: u64,
    pub body: Result<String, RecordError>,
}

/// Iterator over the records of one input file
pub struct Records {
    inner: Inner,
}

enum Inner {
    Lines(LineRecords),
    Parquet(ParquetRecords),
}

impl Iterator for Records {
    type Item = Result<Record, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            Inner::Lines(r) => r.next(),
            Inner::Parquet(r) => r.next(),
        }
    }
}

/// Open `source`, skipping the first `skip` records.
///
/// `key` names the text field used when wrapping plain-text lines and
/// columnar rows; for parquet it is also the column read.
pub fn open_records(source: &Source, key: &str, skip: u64) -> Result<Records, SourceError> {
    let inner = match source.format {
        SourceFormat::Jsonl { gzip } => {
            Inner::Lines(LineRecords::open(&source.path, gzip, None, skip)?)
        }
        SourceFormat::Text { gzip } => Inner::Lines(LineRecords::open(
            &source.path,
            gzip,
            Some(key.to_string()),
            skip,
        )?),
        SourceFormat::Parquet => Inner::Parquet(ParquetRecords::open(&source.path, key, skip)?),
    };
    Ok(Records { inner })
}

/// Wrap a text value into a single-key JSON object line
fn wrap(key: &str, value: Option<&str>) -> String {
    let mut obj = Map::with_capacity(1);
    obj.insert(key.to_string(), value.map_or(Value::Null, Value::from));
    Value::Object(obj).to_string()
}

struct LineRecords {
    reader: Box<dyn BufRead + Send>,
    buf: Vec<u8>,
    index: u64,
    wrap_key: Option<String>,
}

impl LineRecords {
    fn open(path: &Path, gzip: bool, wrap_key: Option<String>, skip: u64) -> std::io::Result<Self> {
        let file = File::open(path)?;
        let reader: Box<dyn BufRead + Send> = if gzip {
            Box::new(BufReader::with_capacity(
                READ_BUF_SIZE,
                MultiGzDecoder::new(file),
            ))
        } else {
            Box::new(BufReader::with_capacity(READ_BUF_SIZE, file))
        };
        let mut records = Self {
            reader,
            buf: Vec::with_capacity(4096),
            index: 0,
            wrap_key,
        };
        while records.index < skip {
            if !records.read_raw()? {
                break;
            }
            records.index += 1;
        }
        Ok(records)
    }

    /// Read the next line into `buf` without its terminator. Returns false at EOF.
    fn read_raw(&mut self) -> std::io::Result<bool> {
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(false);
        }
        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }
        Ok(true)
    }

    fn next(&mut self) -> Option<Result<Record, SourceError>> {
        match self.read_raw() {
            Ok(false) => return None,
            Ok(true) => {}
            Err(e) => return Some(Err(e.into())),
        }
        let body = match std::str::from_utf8(&self.buf) {
            Ok(line) => Ok(match &self.wrap_key {
                Some(key) => wrap(key, Some(line)),
                None => line.to_string(),
            }),
            Err(_) => Err(RecordError::InvalidUtf8 {
                lossy: String::from_utf8_lossy(&self.buf).into_owned(),
            }),
        };
        let record = Record {
            index: self.index,
            body,
        };
        self.index += 1;
        Some(Ok(record))
    }
}

struct ParquetRecords {
    reader: ParquetRecordBatchReader,
    key: String,
    column: Option<StringArray>,
    row: usize,
    index: u64,
}

impl ParquetRecords {
    fn open(path: &Path, key: &str, skip: u64) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

        let schema = builder.schema().clone();
        let field = schema
            .fields()
            .iter()
            .find(|f| f.name() == key)
            .ok_or_else(|| SourceError::MissingColumn(key.to_string()))?;
        if !matches!(
            field.data_type(),
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View
        ) {
            return Err(SourceError::UnsupportedColumn {
                column: key.to_string(),
                data_type: field.data_type().to_string(),
            });
        }

        let mask = ProjectionMask::columns(builder.parquet_schema(), std::iter::once(key));
        let offset = usize::try_from(skip).unwrap_or(usize::MAX);
        let reader = builder.with_projection(mask).with_offset(offset).build()?;

        Ok(Self {
            reader,
            key: key.to_string(),
            column: None,
            row: 0,
            index: skip,
        })
    }

    fn next(&mut self) -> Option<Result<Record, SourceError>> {
        loop {
            if let Some(col) = &self.column {
                if self.row < col.len() {
                    let value = (!col.is_null(self.row)).then(|| col.value(self.row));
                    let record = Record {
                        index: self.index,
                        body: Ok(wrap(&self.key, value)),
                    };
                    self.row += 1;
                    self.index += 1;
                    return Some(Ok(record));
                }
            }
            let batch = match self.reader.next()? {
                Ok(b) => b,
                Err(e) => return Some(Err(e.into())),
            };
            let col = match arrow::compute::cast(batch.column(0), &DataType::Utf8) {
                Ok(c) => c,
                Err(e) => return Some(Err(e.into())),
            };
            let Some(strings) = col.as_any().downcast_ref::<StringArray>() else {
                return Some(Err(SourceError::UnsupportedColumn {
                    column: self.key.clone(),
                    data_type: col.data_type().to_string(),
                }));
            };
            self.column = Some(strings.clone());
            self.row = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn collect(records: Records) -> Vec<(u64, String)> {
        records
            .map(|r| {
                let r = r.unwrap();
                (r.index, r.body.unwrap())
            })
            .collect()
    }

    #[test]
    fn detect_formats() {
        assert_eq!(
            SourceFormat::detect("a.jsonl"),
            Some((SourceFormat::Jsonl { gzip: false }, "a"))
        );
        assert_eq!(
            SourceFormat::detect("a.b.jsonl.gz"),
            Some((SourceFormat::Jsonl { gzip: true }, "a.b"))
        );
        assert_eq!(
            SourceFormat::detect("wiki.txt.gz"),
            Some((SourceFormat::Text { gzip: true }, "wiki"))
        );
        assert_eq!(
            SourceFormat::detect("x.parquet"),
            Some((SourceFormat::Parquet, "x"))
        );
        assert_eq!(SourceFormat::detect("notes.md"), None);
        assert_eq!(SourceFormat::detect(".jsonl"), None);
        assert_eq!(SourceFormat::detect("a.gz"), None);
    }

    #[test]
    fn jsonl_lines_verbatim_and_crlf_stripped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.jsonl");
        std::fs::write(&path, "{\"text\":\"x\"}\r\n{\"text\":\"y\"}\n\nlast").unwrap();
        let source = Source::from_path(&path).unwrap();
        let got = collect(open_records(&source, "text", 0).unwrap());
        assert_eq!(
            got,
            vec![
                (0, "{\"text\":\"x\"}".to_string()),
                (1, "{\"text\":\"y\"}".to_string()),
                (2, String::new()),
                (3, "last".to_string()),
            ]
        );
    }

    #[test]
    fn skip_resumes_at_offset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.jsonl");
        std::fs::write(&path, "l0\nl1\nl2\n").unwrap();
        let source = Source::from_path(&path).unwrap();
        let got = collect(open_records(&source, "text", 2).unwrap());
        assert_eq!(got, vec![(2, "l2".to_string())]);
        assert_eq!(open_records(&source, "text", 3).unwrap().count(), 0);
        assert_eq!(open_records(&source, "text", 10).unwrap().count(), 0);
    }

    #[test]
    fn gzip_text_lines_are_wrapped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plain.txt.gz");
        let mut gz = flate2::write::GzEncoder::new(
            File::create(&path).unwrap(),
            flate2::Compression::default(),
        );
        gz.write_all("こんにちは\n\"quoted\"\n".as_bytes()).unwrap();
        gz.finish().unwrap();

        let source = Source::from_path(&path).unwrap();
        assert_eq!(source.stem, "plain");
        let got = collect(open_records(&source, "body", 0).unwrap());
        assert_eq!(got[0].1, r#"{"body":"こんにちは"}"#);
        assert_eq!(got[1].1, r#"{"body":"\"quoted\""}"#);
    }

    #[test]
    fn invalid_utf8_is_a_record_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.jsonl");
        std::fs::write(&path, b"ok\n\xff\xfe\nok2\n").unwrap();
        let source = Source::from_path(&path).unwrap();
        let all: Vec<Record> = open_records(&source, "text", 0)
            .unwrap()
            .map(Result::unwrap)
            .collect();
        assert_eq!(all.len(), 3);
        assert!(matches!(all[1].body, Err(RecordError::InvalidUtf8 { .. })));
        assert_eq!(all[2].index, 2);
    }

    fn write_parquet(path: &Path, column: &str, values: Vec<Option<&str>>) {
        use arrow::array::RecordBatch;
        use arrow::datatypes::{Field, Schema};
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new(column, DataType::Utf8, true),
        ]));
        let ids = arrow::array::Int64Array::from((0..values.len() as i64).collect::<Vec<_>>());
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(ids), Arc::new(StringArray::from(values))],
        )
        .unwrap();
        let mut writer =
            parquet::arrow::ArrowWriter::try_new(File::create(path).unwrap(), schema, None)
                .unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn parquet_rows_wrapped_with_offset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.parquet");
        write_parquet(&path, "text", vec![Some("a"), None, Some("c")]);
        let source = Source::from_path(&path).unwrap();

        let got = collect(open_records(&source, "text", 0).unwrap());
        assert_eq!(
            got,
            vec![
                (0, r#"{"text":"a"}"#.to_string()),
                (1, r#"{"text":null}"#.to_string()),
                (2, r#"{"text":"c"}"#.to_string()),
            ]
        );

        let resumed = collect(open_records(&source, "text", 2).unwrap());
        assert_eq!(resumed, vec![(2, r#"{"text":"c"}"#.to_string())]);
    }

    #[test]
    fn parquet_missing_column() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.parquet");
        write_parquet(&path, "body", vec![Some("a")]);
        let source = Source::from_path(&path).unwrap();
        let err = open_records(&source, "text", 0).err().unwrap();
        assert!(matches!(err, SourceError::MissingColumn(ref c) if c == "text"));
    }

    #[test]
    fn parquet_non_string_column() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.parquet");
        write_parquet(&path, "body", vec![Some("a")]);
        let source = Source::from_path(&path).unwrap();
        let err = open_records(&source, "id", 0).err().unwrap();
        assert!(matches!(err, SourceError::UnsupportedColumn { .. }));
    }
}
