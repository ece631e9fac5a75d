//! Terminal serialization stage

use docsift_core::{Document, Stage, StageError};
use serde_json::{Map, Value};

use crate::config::DumperConfig;

/// Serializes the final text into one JSON line.
///
/// Runs on every document, rejected or not, so every record has an output
/// line of the same shape.
#[derive(Debug, Clone)]
pub struct JsonDumper {
    key: String,
    dump_reason: bool,
    keep_fields: bool,
}

impl JsonDumper {
    pub fn new(key: impl Into<String>, config: &DumperConfig) -> Self {
        Self {
            key: key.into(),
            dump_reason: config.dump_reason,
            keep_fields: config.keep_fields,
        }
    }
}

impl Stage for JsonDumper {
    fn name(&self) -> &str {
        "json_dumper"
    }

    fn runs_on_rejected(&self) -> bool {
        true
    }

    fn apply(&self, doc: &mut Document) -> Result<(), StageError> {
        let mut obj = if self.keep_fields {
            doc.fields().clone()
        } else {
            Map::new()
        };
        obj.insert(self.key.clone(), Value::String(doc.text().to_string()));
        if self.dump_reason {
            obj.insert("is_rejected".into(), Value::Bool(doc.is_rejected()));
            obj.insert(
                "reason".into(),
                doc.rejection_reason()
                    .map_or(Value::Null, |r| Value::String(r.to_string())),
            );
        }
        let line = serde_json::to_string(&obj)
            .map_err(|e| StageError::new(self.name(), e.to_string()))?;
        doc.set_dumped(line);
        Ok(())
    }
}
