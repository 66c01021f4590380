//! Capture and apply session orchestration
//!
//! Sessions are the entry point callers invoke: a `CaptureSession` reads
//! current backend values into a `Preferences` document, an `ApplySession`
//! writes preference values back out and runs post-apply finalizers. Each
//! setting's outcome is independent; one failure never aborts a session and
//! nothing is rolled back.

pub mod apply;
pub mod capture;
pub mod report;

pub use apply::ApplySession;
pub use capture::CaptureSession;
pub use report::{ApplyOutcome, ApplyReport, CaptureOutcome, CaptureReport};
