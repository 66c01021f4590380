//! Per-setting session outcomes
//!
//! Sessions report one outcome per preference key so a host can render
//! "N of M settings restored" instead of a single opaque error.

use std::collections::BTreeMap;

use prefsync_handlers::{ApplyError, CaptureError};
use prefsync_model::PreferenceKey;

/// Outcome of capturing one setting.
#[derive(Debug)]
pub enum CaptureOutcome {
    /// A value was read and written into the preferences document.
    Captured,
    /// The backend affirmatively reported no value; a null was stored.
    Empty,
    /// Capture failed; the existing preference entry was left untouched.
    Unchanged(CaptureError),
    /// The setting declares no handler; nothing to capture.
    NoHandler,
    /// The key does not name a registered setting.
    UnknownSetting,
}

impl CaptureOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CaptureOutcome::Captured | CaptureOutcome::Empty)
    }
}

/// Outcome of applying one setting.
#[derive(Debug)]
pub enum ApplyOutcome {
    /// The backend accepted the value. `finalizer_failed` records a
    /// non-fatal post-apply failure; the apply itself still succeeded.
    Applied { finalizer_failed: bool },
    /// The stored value was null; there is nothing to write.
    Skipped,
    /// The setting declares no handler.
    NoHandler,
    /// The key does not name a registered setting (stale preferences are
    /// tolerated and reported here).
    UnknownSetting,
    Failed(ApplyError),
}

impl ApplyOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            ApplyOutcome::Applied { .. } | ApplyOutcome::Skipped
        )
    }
}

/// Result of a capture session.
#[derive(Debug, Default)]
pub struct CaptureReport {
    outcomes: BTreeMap<PreferenceKey, CaptureOutcome>,
}

impl CaptureReport {
    pub(crate) fn record(&mut self, key: PreferenceKey, outcome: CaptureOutcome) {
        self.outcomes.insert(key, outcome);
    }

    pub fn outcome(&self, key: &PreferenceKey) -> Option<&CaptureOutcome> {
        self.outcomes.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PreferenceKey, &CaptureOutcome)> {
        self.outcomes.iter()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }
}

/// Result of an apply session.
#[derive(Debug, Default)]
pub struct ApplyReport {
    outcomes: BTreeMap<PreferenceKey, ApplyOutcome>,
}

impl ApplyReport {
    pub(crate) fn record(&mut self, key: PreferenceKey, outcome: ApplyOutcome) {
        self.outcomes.insert(key, outcome);
    }

    pub fn outcome(&self, key: &PreferenceKey) -> Option<&ApplyOutcome> {
        self.outcomes.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PreferenceKey, &ApplyOutcome)> {
        self.outcomes.iter()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }
}
