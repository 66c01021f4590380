//! Declarative model for the settings capture/apply engine
//!
//! A `Solution` groups the `Setting`s of one application or feature area.
//! Each setting declares its logical `ValueKind`, an optional default, and
//! the declarative `HandlerDescription`/`FinalizerDescription` that say
//! where the value lives and how the OS is told about a change. Captured
//! and desired values travel in a portable `Preferences` document keyed by
//! `(solution id, setting name)`.

pub mod error;
pub mod preferences;
pub mod registry;
pub mod types;

pub use error::{ModelError, Result};
pub use preferences::{PreferenceKey, Preferences};
pub use registry::SolutionRegistry;
pub use types::{
    FinalizerDescription, HandlerDescription, RegistryValueKind, Setting, Solution, ValueKind,
};
