//! Backend handlers for the settings capture/apply engine
//!
//! This crate binds declarative `HandlerDescription`s to host-supplied
//! backend adapters and exposes the uniform capture/apply contract the
//! sessions drive. Adapter failures never escape a handler; they are
//! converted into the `CaptureError`/`ApplyError` taxonomy so one
//! setting's failure stays isolated from every other setting.

pub mod adapters;
pub mod client;
pub mod error;
pub mod files;
pub mod finalizer;
pub mod fs;
pub mod handler;
pub mod ini;
pub mod memory;
pub mod process;
pub mod registry;
pub mod system;

pub use adapters::{
    Adapters, FileManager, IniStore, KeyValueStore, ProcessManager, RegistryValue,
    SystemParameters, SystemSettings,
};
pub use error::{
    AdapterError, AdapterResult, ApplyError, BindError, CaptureError, Captured, FinalizeError,
};
pub use files::FilePayload;
pub use finalizer::SettingFinalizer;
pub use handler::SettingHandler;
