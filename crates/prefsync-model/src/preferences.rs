//! Portable preferences document
//!
//! A two-level map `solution id -> setting name -> value` holding captured
//! or desired setting values. A stored JSON `null` is meaningful ("the
//! backend reports no value") and is distinct from the key being absent.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::Result;

/// Address of one preference: `(solution id, setting name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PreferenceKey {
    pub solution_id: String,
    pub setting_name: String,
}

impl PreferenceKey {
    pub fn new(solution_id: impl Into<String>, setting_name: impl Into<String>) -> Self {
        Self {
            solution_id: solution_id.into(),
            setting_name: setting_name.into(),
        }
    }
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.solution_id, self.setting_name)
    }
}

/// The preferences document. Ordered maps keep serialization
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Preferences {
    solutions: BTreeMap<String, BTreeMap<String, Option<Value>>>,
}

impl Preferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outer `None` means the key is absent; `Some(None)` is a stored null.
    pub fn get(&self, key: &PreferenceKey) -> Option<Option<&Value>> {
        self.solutions
            .get(&key.solution_id)
            .and_then(|settings| settings.get(&key.setting_name))
            .map(Option::as_ref)
    }

    pub fn contains(&self, key: &PreferenceKey) -> bool {
        self.get(key).is_some()
    }

    /// Store a value (or an explicit null) for a key, replacing any
    /// previous entry.
    pub fn set(&mut self, key: &PreferenceKey, value: Option<Value>) {
        self.solutions
            .entry(key.solution_id.clone())
            .or_default()
            .insert(key.setting_name.clone(), value);
    }

    /// Remove an entry, dropping the solution map once empty.
    pub fn remove(&mut self, key: &PreferenceKey) -> Option<Option<Value>> {
        let settings = self.solutions.get_mut(&key.solution_id)?;
        let removed = settings.remove(&key.setting_name);
        if settings.is_empty() {
            self.solutions.remove(&key.solution_id);
        }
        removed
    }

    /// All entries as `(key, value)` pairs in document order. Stale keys
    /// that no longer name a registered setting are included as-is; the
    /// apply path reports them individually.
    pub fn flatten(&self) -> Vec<(PreferenceKey, Option<Value>)> {
        self.solutions
            .iter()
            .flat_map(|(solution_id, settings)| {
                settings.iter().map(move |(name, value)| {
                    (PreferenceKey::new(solution_id, name), value.clone())
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.solutions.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.values().all(BTreeMap::is_empty)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
