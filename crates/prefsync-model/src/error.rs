//! Model error types

use thiserror::Error;

/// Model result type
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors raised while loading declarative documents
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("duplicate solution id: {0}")]
    DuplicateSolution(String),

    #[error("duplicate setting '{name}' in solution '{solution}'")]
    DuplicateSetting { solution: String, name: String },
}
