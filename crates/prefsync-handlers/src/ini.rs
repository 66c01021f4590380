//! INI file handler

use std::path::PathBuf;
use std::sync::Arc;

use prefsync_model::ValueKind;
use serde_json::Value;

use crate::adapters::IniStore;
use crate::error::{ApplyError, CaptureError, Captured};

/// Captures and applies one key in one section of an INI file.
pub struct IniHandler {
    store: Arc<dyn IniStore>,
    file_path: PathBuf,
    section: String,
    key: String,
    kind: ValueKind,
}

impl IniHandler {
    pub fn new(
        store: Arc<dyn IniStore>,
        file_path: PathBuf,
        section: String,
        key: String,
        kind: ValueKind,
    ) -> Self {
        Self {
            store,
            file_path,
            section,
            key,
            kind,
        }
    }

    /// A missing key is an affirmative empty (the preference becomes a
    /// stored null); a backend fault leaves the preference untouched.
    pub async fn capture(&self) -> Result<Captured, CaptureError> {
        match self
            .store
            .get(&self.file_path, &self.section, &self.key)
            .await
        {
            Ok(Some(text)) => match self.kind.coerce(&Value::String(text)) {
                Some(value) => Ok(Captured::Value(value)),
                None => Err(CaptureError::CoercionFailed),
            },
            Ok(None) => Ok(Captured::Empty),
            Err(e) => Err(CaptureError::Backend(e)),
        }
    }

    pub async fn apply(&self, value: &Value) -> Result<(), ApplyError> {
        let coerced = self.kind.coerce(value).ok_or(ApplyError::TypeMismatch {
            expected: self.kind,
            value: value.clone(),
        })?;
        let text = stringify(&coerced);
        self.store
            .set(&self.file_path, &self.section, &self.key, &text)
            .await
            .map_err(ApplyError::Backend)
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
