//! Apply session
//!
//! Writes preference values back to their backends. Each entry is resolved
//! through the registry, applied through its handler, and, on success,
//! finalized exactly once if the setting declares a finalizer. A finalizer
//! failure is logged and surfaced on the report entry but does not flip
//! the apply success. No cross-setting rollback exists.

use prefsync_handlers::{Adapters, SettingFinalizer, SettingHandler};
use prefsync_model::{PreferenceKey, Preferences, SolutionRegistry};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::report::{ApplyOutcome, ApplyReport};

pub struct ApplySession<'a> {
    registry: &'a SolutionRegistry,
    adapters: Adapters,
}

impl<'a> ApplySession<'a> {
    pub fn new(registry: &'a SolutionRegistry, adapters: Adapters) -> Self {
        Self { registry, adapters }
    }

    /// Apply every entry of a preferences document.
    pub async fn run_preferences(&self, preferences: &Preferences) -> ApplyReport {
        self.run(preferences.flatten()).await
    }

    /// Apply the given `(key, value)` entries in order. Stale keys are
    /// tolerated and reported per entry; stored nulls are skipped.
    pub async fn run(&self, entries: Vec<(PreferenceKey, Option<Value>)>) -> ApplyReport {
        info!(entries = entries.len(), "Starting apply session");
        let mut report = ApplyReport::default();

        for (key, value) in entries {
            let outcome = self.apply_one(&key, value).await;
            report.record(key, outcome);
        }

        info!(
            applied = report.succeeded(),
            failed = report.failed(),
            "Apply session finished"
        );
        report
    }

    async fn apply_one(&self, key: &PreferenceKey, value: Option<Value>) -> ApplyOutcome {
        let Some(setting) = self.registry.setting(key) else {
            warn!(%key, "Preference does not name a registered setting");
            return ApplyOutcome::UnknownSetting;
        };
        let Some(value) = value else {
            debug!(%key, "Stored null, nothing to apply");
            return ApplyOutcome::Skipped;
        };
        if setting.handler.is_none() {
            debug!(%key, "Setting has no handler, cannot apply");
            return ApplyOutcome::NoHandler;
        }
        let handler =
            match SettingHandler::bind(setting, &self.adapters, Some(value.clone())) {
                Ok(handler) => handler,
                Err(_) => return ApplyOutcome::NoHandler,
            };

        if let Err(e) = handler.apply(&value).await {
            warn!(%key, error = %e, "Apply failed");
            return ApplyOutcome::Failed(e);
        }

        let mut finalizer_failed = false;
        if let Some(description) = &setting.finalizer {
            let finalizer = SettingFinalizer::bind(description, &self.adapters);
            if let Err(e) = finalizer.run().await {
                // Non-fatal: the value reached the backend.
                warn!(%key, error = %e, "Finalizer failed after successful apply");
                finalizer_failed = true;
            }
        }
        debug!(%key, finalizer_failed, "Applied value");
        ApplyOutcome::Applied { finalizer_failed }
    }
}
