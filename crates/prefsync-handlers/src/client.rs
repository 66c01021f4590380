//! Client handler
//!
//! The setting's value already lives in the preferences document, so
//! capture and apply are identity operations with no external backend.

use serde_json::Value;

use crate::error::{ApplyError, CaptureError, Captured};

pub struct ClientHandler {
    /// Preference value at bind time, if any.
    current: Option<Value>,
}

impl ClientHandler {
    pub fn new(current: Option<Value>) -> Self {
        Self { current }
    }

    /// Re-captures whatever the document already holds; an absent entry
    /// stays absent.
    pub async fn capture(&self) -> Result<Captured, CaptureError> {
        match &self.current {
            Some(value) => Ok(Captured::Value(value.clone())),
            None => Err(CaptureError::Absent),
        }
    }

    pub async fn apply(&self, _value: &Value) -> Result<(), ApplyError> {
        Ok(())
    }
}
