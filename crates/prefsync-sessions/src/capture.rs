//! Capture session
//!
//! Registers capture targets, reads each setting's backend value through
//! its handler, and writes the outcome into a `Preferences` document under
//! the per-backend write-back policy:
//!
//! - a captured value overwrites the preference;
//! - an affirmative "no value" overwrites it with a stored null;
//! - any capture failure leaves the existing preference untouched.
//!
//! The registry handler never reports an affirmative "no value" because
//! its backend conflates absence with unreadable types, so its failures
//! always fall under the untouched rule.

use prefsync_handlers::{Adapters, Captured, SettingHandler};
use prefsync_model::{PreferenceKey, Preferences, SolutionRegistry};
use tracing::{debug, info, warn};

use crate::report::{CaptureOutcome, CaptureReport};

/// Single-pass capture over a set of registered targets.
pub struct CaptureSession<'a> {
    registry: &'a SolutionRegistry,
    adapters: Adapters,
    targets: Vec<PreferenceKey>,
}

impl<'a> CaptureSession<'a> {
    pub fn new(registry: &'a SolutionRegistry, adapters: Adapters) -> Self {
        Self {
            registry,
            adapters,
            targets: Vec::new(),
        }
    }

    /// Register every setting of every known solution as a capture target.
    pub fn add_all_solutions(&mut self) {
        for solution in self.registry.iter() {
            for setting in &solution.settings {
                self.targets
                    .push(PreferenceKey::new(&solution.id, &setting.name));
            }
        }
    }

    /// Register every setting of one solution. Returns `false` for an
    /// unknown id.
    pub fn add_solution(&mut self, id: &str) -> bool {
        match self.registry.solution(id) {
            Some(solution) => {
                for setting in &solution.settings {
                    self.targets
                        .push(PreferenceKey::new(&solution.id, &setting.name));
                }
                true
            }
            None => false,
        }
    }

    /// Register a single setting.
    pub fn add_setting(&mut self, key: PreferenceKey) {
        self.targets.push(key);
    }

    /// Capture every registered target into `preferences`. Runs each
    /// target to completion in registration order; one setting's failure
    /// never aborts the pass.
    pub async fn run(mut self, preferences: &mut Preferences) -> CaptureReport {
        let targets = std::mem::take(&mut self.targets);
        info!(targets = targets.len(), "Starting capture session");
        let mut report = CaptureReport::default();

        for key in targets {
            let outcome = self.capture_one(&key, preferences).await;
            report.record(key, outcome);
        }

        info!(
            captured = report.succeeded(),
            failed = report.failed(),
            "Capture session finished"
        );
        report
    }

    async fn capture_one(
        &self,
        key: &PreferenceKey,
        preferences: &mut Preferences,
    ) -> CaptureOutcome {
        let Some(setting) = self.registry.setting(key) else {
            warn!(%key, "Capture target does not name a registered setting");
            return CaptureOutcome::UnknownSetting;
        };
        if setting.handler.is_none() {
            debug!(%key, "Setting has no handler, skipping capture");
            return CaptureOutcome::NoHandler;
        }
        let existing = preferences.get(key).flatten().cloned();
        let handler = match SettingHandler::bind(setting, &self.adapters, existing) {
            Ok(handler) => handler,
            Err(_) => return CaptureOutcome::NoHandler,
        };

        match handler.capture().await {
            Ok(Captured::Value(value)) => {
                debug!(%key, "Captured value");
                preferences.set(key, Some(value));
                CaptureOutcome::Captured
            }
            Ok(Captured::Empty) => {
                debug!(%key, "Backend reports no value, storing null");
                preferences.set(key, None);
                CaptureOutcome::Empty
            }
            Err(e) => {
                warn!(%key, error = %e, "Capture failed, preference left untouched");
                CaptureOutcome::Unchanged(e)
            }
        }
    }
}
