//! Process-state handler
//!
//! Models "the named process is running" as a boolean setting. Applying a
//! value the process already satisfies makes no backend call at all.

use std::sync::Arc;

use prefsync_model::ValueKind;
use serde_json::Value;
use tracing::debug;

use crate::adapters::ProcessManager;
use crate::error::{ApplyError, CaptureError, Captured};

pub struct ProcessHandler {
    process: Arc<dyn ProcessManager>,
    exe_path: String,
}

impl ProcessHandler {
    pub fn new(process: Arc<dyn ProcessManager>, exe_path: String) -> Self {
        Self { process, exe_path }
    }

    pub async fn capture(&self) -> Result<Captured, CaptureError> {
        match self.process.is_running(&self.exe_path).await {
            Ok(running) => Ok(Captured::Value(Value::Bool(running))),
            Err(e) => Err(CaptureError::Backend(e)),
        }
    }

    pub async fn apply(&self, value: &Value) -> Result<(), ApplyError> {
        let desired = match ValueKind::Boolean.coerce(value) {
            Some(Value::Bool(b)) => b,
            _ => {
                return Err(ApplyError::TypeMismatch {
                    expected: ValueKind::Boolean,
                    value: value.clone(),
                })
            }
        };
        let current = self
            .process
            .is_running(&self.exe_path)
            .await
            .map_err(ApplyError::Backend)?;
        if current == desired {
            debug!(exe = %self.exe_path, running = current, "Process already in desired state");
            return Ok(());
        }
        let changed = if desired {
            self.process.start(&self.exe_path).await
        } else {
            self.process.stop(&self.exe_path).await
        }
        .map_err(ApplyError::Backend)?;
        if changed {
            Ok(())
        } else {
            Err(ApplyError::Rejected)
        }
    }
}
