//! Opaque system setting handler

use std::sync::Arc;

use prefsync_model::ValueKind;
use serde_json::Value;

use crate::adapters::SystemSettings;
use crate::error::{ApplyError, CaptureError, Captured};

/// Captures and applies an opaque system setting addressed by id.
pub struct SystemHandler {
    system: Arc<dyn SystemSettings>,
    setting_id: String,
    kind: ValueKind,
}

impl SystemHandler {
    pub fn new(system: Arc<dyn SystemSettings>, setting_id: String, kind: ValueKind) -> Self {
        Self {
            system,
            setting_id,
            kind,
        }
    }

    /// A `None` from the backend is a valid success: the setting
    /// legitimately reports no value.
    pub async fn capture(&self) -> Result<Captured, CaptureError> {
        match self.system.get_value(&self.setting_id).await {
            Ok(Some(value)) => match self.kind.coerce(&value) {
                Some(coerced) => Ok(Captured::Value(coerced)),
                None => Err(CaptureError::CoercionFailed),
            },
            Ok(None) => Ok(Captured::Empty),
            Err(e) => Err(CaptureError::Backend(e)),
        }
    }

    /// Type-checks against the declared kind before the backend is
    /// invoked; a mismatch fails without any adapter call.
    pub async fn apply(&self, value: &Value) -> Result<(), ApplyError> {
        if !self.kind.matches(value) {
            return Err(ApplyError::TypeMismatch {
                expected: self.kind,
                value: value.clone(),
            });
        }
        self.system
            .set_value(&self.setting_id, value.clone())
            .await
            .map_err(ApplyError::Backend)
    }
}
