//! Backend adapter ports
//!
//! Narrow async contracts the host environment implements, one per backend
//! family. Handlers depend on these traits only; the engine never talks to
//! an operating system API directly.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use prefsync_model::RegistryValueKind;
use serde_json::Value;

use crate::error::AdapterResult;

/// A value as the key/value store natively types it.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryValue {
    Dword(u32),
    Qword(u64),
    Sz(String),
    Binary(Vec<u8>),
}

impl RegistryValue {
    pub fn kind(&self) -> RegistryValueKind {
        match self {
            RegistryValue::Dword(_) => RegistryValueKind::Dword,
            RegistryValue::Qword(_) => RegistryValueKind::Qword,
            RegistryValue::Sz(_) => RegistryValueKind::Sz,
            RegistryValue::Binary(_) => RegistryValueKind::Binary,
        }
    }
}

/// Key/value store backend (e.g. the Windows registry).
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// `Ok(None)` when the value is absent. The store cannot distinguish
    /// "absent" from "present with an unreadable type"; callers must treat
    /// both conservatively.
    async fn get(&self, key_path: &str, value_name: &str)
        -> AdapterResult<Option<RegistryValue>>;

    /// Returns whether the store accepted the write.
    async fn set(
        &self,
        key_path: &str,
        value_name: &str,
        value: RegistryValue,
    ) -> AdapterResult<bool>;
}

/// INI file backend.
#[async_trait]
pub trait IniStore: Send + Sync {
    async fn get(&self, path: &Path, section: &str, key: &str) -> AdapterResult<Option<String>>;

    async fn set(&self, path: &Path, section: &str, key: &str, value: &str) -> AdapterResult<()>;
}

/// Opaque system setting backend, addressed by id.
#[async_trait]
pub trait SystemSettings: Send + Sync {
    /// `Ok(None)` is a legitimate answer: the setting reports no value.
    async fn get_value(&self, setting_id: &str) -> AdapterResult<Option<Value>>;

    async fn set_value(&self, setting_id: &str, value: Value) -> AdapterResult<()>;
}

/// Process lifecycle backend.
#[async_trait]
pub trait ProcessManager: Send + Sync {
    async fn is_running(&self, exe_path: &str) -> AdapterResult<bool>;

    /// Returns whether the process was started.
    async fn start(&self, exe_path: &str) -> AdapterResult<bool>;

    /// Returns whether the process was stopped.
    async fn stop(&self, exe_path: &str) -> AdapterResult<bool>;
}

/// File system backend used by the file-bundle handler.
#[async_trait]
pub trait FileManager: Send + Sync {
    async fn exists(&self, path: &Path) -> AdapterResult<bool>;

    /// Relative paths of every file under `root`, recursively, with `/`
    /// separators. Errors when `root` does not exist.
    async fn filenames_in_directory(&self, root: &Path) -> AdapterResult<Vec<String>>;

    async fn read_all_bytes(&self, path: &Path) -> AdapterResult<Vec<u8>>;

    /// Writes the file, creating parent directories as needed.
    async fn write_all_bytes(&self, path: &Path, bytes: &[u8]) -> AdapterResult<()>;

    async fn delete(&self, path: &Path) -> AdapterResult<()>;

    async fn create_dir_all(&self, path: &Path) -> AdapterResult<()>;
}

/// System configuration-change broadcast backend for finalizers.
#[async_trait]
pub trait SystemParameters: Send + Sync {
    /// Returns whether the broadcast was accepted.
    async fn system_parameters_info(
        &self,
        action: u32,
        update_user_profile: bool,
        send_change: bool,
    ) -> AdapterResult<bool>;
}

/// Bundle of host-supplied adapters passed into sessions and handler
/// binding.
#[derive(Clone)]
pub struct Adapters {
    pub key_value: Arc<dyn KeyValueStore>,
    pub ini: Arc<dyn IniStore>,
    pub system: Arc<dyn SystemSettings>,
    pub process: Arc<dyn ProcessManager>,
    pub files: Arc<dyn FileManager>,
    pub system_parameters: Arc<dyn SystemParameters>,
}
