//! Handler boundary error taxonomy
//!
//! Every adapter failure is converted into one of these values at the
//! handler boundary; nothing here escapes to the orchestrators as a panic
//! or an unwound error. The capture taxonomy distinguishes affirmative
//! absence, coercion failure, and backend faults because the preferences
//! write-back policy treats them differently.

use prefsync_model::ValueKind;
use serde_json::Value;
use thiserror::Error;

/// Result alias for adapter calls.
pub type AdapterResult<T> = std::result::Result<T, AdapterError>;

/// Failure reported by a host-supplied backend adapter.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

/// Successful capture outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum Captured {
    /// The backend produced a value, already coerced to the setting's kind.
    Value(Value),
    /// The backend affirmatively reports no value. Stored as an explicit
    /// null in the preferences document.
    Empty,
}

/// Why a capture produced nothing usable. Any of these leaves the
/// destination preference untouched.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("backend has no value for this setting")]
    Absent,

    #[error("backend value does not coerce to the declared kind")]
    CoercionFailed,

    #[error("backend error: {0}")]
    Backend(AdapterError),
}

/// Why an apply failed for one setting.
#[derive(Debug, Error)]
pub enum ApplyError {
    /// The supplied value's shape does not match the declared kind. Raised
    /// before any backend call is attempted.
    #[error("value {value} does not match declared kind {expected:?}")]
    TypeMismatch { expected: ValueKind, value: Value },

    #[error("value does not coerce to the backend's native kind")]
    CoercionFailed,

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// The adapter returned `false` without raising an error.
    #[error("backend refused the write")]
    Rejected,

    #[error("backend error: {0}")]
    Backend(AdapterError),
}

/// Why a post-apply finalizer failed. Non-fatal to the setting's reported
/// apply success.
#[derive(Debug, Error)]
pub enum FinalizeError {
    #[error("finalizer reported failure")]
    Rejected,

    #[error("backend error: {0}")]
    Backend(AdapterError),
}

/// Why a handler could not be bound from its description.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("setting has no handler description")]
    NoHandler,
}
