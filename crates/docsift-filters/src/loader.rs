//! JSON record loader, the first stage of every chain

use docsift_core::{Document, Stage, StageError};
use serde_json::Value;

/// Parses the working text as a JSON object and replaces it with the value
/// of `key`. Malformed JSON, non-objects, and a missing or non-string key
/// reject the document. Other fields are kept on the document.
#[derive(Debug, Clone)]
pub struct JsonLoader {
    key: String,
}

impl JsonLoader {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Stage for JsonLoader {
    fn name(&self) -> &str {
        "json_loader"
    }

    fn apply(&self, doc: &mut Document) -> Result<(), StageError> {
        let mut object = match serde_json::from_str::<Value>(doc.text()) {
            Ok(Value::Object(map)) => map,
            _ => {
                doc.reject(self.name());
                return Ok(());
            }
        };
        match object.remove(&self.key) {
            Some(Value::String(text)) => {
                doc.set_text(text);
                *doc.fields_mut() = object;
            }
            _ => {
                doc.reject(self.name());
            }
        }
        Ok(())
    }
}
