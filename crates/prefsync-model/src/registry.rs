//! Solutions registry
//!
//! An explicitly constructed index of every known `Solution`, built once at
//! startup from a declarative JSON document and passed by reference into
//! capture/apply sessions. There is no process-wide default instance.

use std::collections::HashMap;

use crate::error::{ModelError, Result};
use crate::preferences::PreferenceKey;
use crate::types::{Setting, Solution};

/// Registry of all loaded solutions, indexed by id.
#[derive(Debug, Clone, Default)]
pub struct SolutionRegistry {
    solutions: Vec<Solution>,
    by_id: HashMap<String, usize>,
}

impl SolutionRegistry {
    /// Build a registry from already-constructed solutions. Rejects
    /// duplicate solution ids and duplicate setting names within a
    /// solution.
    pub fn new(solutions: Vec<Solution>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(solutions.len());
        for (i, solution) in solutions.iter().enumerate() {
            if by_id.insert(solution.id.clone(), i).is_some() {
                return Err(ModelError::DuplicateSolution(solution.id.clone()));
            }
            let mut seen = HashMap::with_capacity(solution.settings.len());
            for setting in &solution.settings {
                if seen.insert(setting.name.as_str(), ()).is_some() {
                    return Err(ModelError::DuplicateSetting {
                        solution: solution.id.clone(),
                        name: setting.name.clone(),
                    });
                }
            }
        }
        tracing::info!(solutions = solutions.len(), "Loaded solutions registry");
        Ok(Self { solutions, by_id })
    }

    /// Parse a solutions document: a JSON array of solutions.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let solutions: Vec<Solution> = serde_json::from_str(text)?;
        Self::new(solutions)
    }

    pub fn solution(&self, id: &str) -> Option<&Solution> {
        self.by_id.get(id).map(|&i| &self.solutions[i])
    }

    /// Resolve a preference key to its setting. `None` for stale keys.
    pub fn setting(&self, key: &PreferenceKey) -> Option<&Setting> {
        self.solution(&key.solution_id)?.setting(&key.setting_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Solution> {
        self.solutions.iter()
    }

    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }
}
