//! Key/value store (registry) handler

use std::sync::Arc;

use prefsync_model::{RegistryValueKind, ValueKind};
use serde_json::Value;
use tracing::debug;

use crate::adapters::{KeyValueStore, RegistryValue};
use crate::error::{ApplyError, CaptureError, Captured};

/// Captures and applies one value under a key/value store path.
pub struct RegistryHandler {
    store: Arc<dyn KeyValueStore>,
    key_path: String,
    value_name: String,
    native_kind: RegistryValueKind,
    kind: ValueKind,
}

impl RegistryHandler {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        key_path: String,
        value_name: String,
        native_kind: RegistryValueKind,
        kind: ValueKind,
    ) -> Self {
        Self {
            store,
            key_path,
            value_name,
            native_kind,
            kind,
        }
    }

    /// The store conflates "absent" with "present but wrong type", so this
    /// handler never reports an affirmative empty; every non-value outcome
    /// is an error and the destination preference stays untouched.
    pub async fn capture(&self) -> Result<Captured, CaptureError> {
        match self.store.get(&self.key_path, &self.value_name).await {
            Ok(Some(native)) => match from_native(&native, self.kind) {
                Some(value) => Ok(Captured::Value(value)),
                None => {
                    debug!(
                        key_path = %self.key_path,
                        value_name = %self.value_name,
                        "Registry value did not coerce to declared kind"
                    );
                    Err(CaptureError::CoercionFailed)
                }
            },
            Ok(None) => Err(CaptureError::Absent),
            Err(e) => Err(CaptureError::Backend(e)),
        }
    }

    pub async fn apply(&self, value: &Value) -> Result<(), ApplyError> {
        let native = to_native(value, self.native_kind).ok_or(ApplyError::CoercionFailed)?;
        match self
            .store
            .set(&self.key_path, &self.value_name, native)
            .await
        {
            Ok(true) => Ok(()),
            Ok(false) => Err(ApplyError::Rejected),
            Err(e) => Err(ApplyError::Backend(e)),
        }
    }
}

/// Coerce a native store value to the setting's declared kind.
fn from_native(native: &RegistryValue, kind: ValueKind) -> Option<Value> {
    let raw = match native {
        RegistryValue::Dword(n) => Value::from(*n),
        RegistryValue::Qword(n) => Value::from(*n),
        RegistryValue::Sz(s) => Value::String(s.clone()),
        RegistryValue::Binary(_) => return None,
    };
    kind.coerce(&raw)
}

/// Coerce an applied value to the native kind declared for the store.
fn to_native(value: &Value, native_kind: RegistryValueKind) -> Option<RegistryValue> {
    match native_kind {
        RegistryValueKind::Dword => dword_of(value).map(RegistryValue::Dword),
        RegistryValueKind::Qword => qword_of(value).map(RegistryValue::Qword),
        RegistryValueKind::Sz => match value {
            Value::String(s) => Some(RegistryValue::Sz(s.clone())),
            Value::Number(n) => Some(RegistryValue::Sz(n.to_string())),
            Value::Bool(b) => Some(RegistryValue::Sz(b.to_string())),
            _ => None,
        },
        // Nothing in the engine produces binary payloads for the store.
        RegistryValueKind::Binary => None,
    }
}

fn dword_of(value: &Value) -> Option<u32> {
    match value {
        Value::Bool(b) => Some(u32::from(*b)),
        Value::Number(n) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= f64::from(u32::MAX)).map(|f| f as u32)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn qword_of(value: &Value) -> Option<u64> {
    match value {
        Value::Bool(b) => Some(u64::from(*b)),
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
