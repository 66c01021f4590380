//! In-memory adapter implementations
//!
//! Complete implementations of every backend port, backed by plain maps.
//! Hosts use them for dry runs; tests use them to script backend state,
//! inject failures, and count calls.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::adapters::{
    FileManager, IniStore, KeyValueStore, ProcessManager, RegistryValue, SystemParameters,
    SystemSettings,
};
use crate::error::{AdapterError, AdapterResult};

fn injected() -> AdapterError {
    AdapterError::Backend("injected backend failure".to_string())
}

/// Key/value store over a map keyed by `(key path, value name)`.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    values: Mutex<HashMap<(String, String), RegistryValue>>,
    failing: AtomicBool,
    rejecting_writes: AtomicBool,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key_path: &str, value_name: &str, value: RegistryValue) {
        self.values
            .lock()
            .unwrap()
            .insert((key_path.to_string(), value_name.to_string()), value);
    }

    pub fn value(&self, key_path: &str, value_name: &str) -> Option<RegistryValue> {
        self.values
            .lock()
            .unwrap()
            .get(&(key_path.to_string(), value_name.to_string()))
            .cloned()
    }

    /// Make every call return a backend error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make `set` return `Ok(false)`.
    pub fn set_rejecting_writes(&self, rejecting: bool) {
        self.rejecting_writes.store(rejecting, Ordering::SeqCst);
    }

    fn check(&self) -> AdapterResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(injected())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(
        &self,
        key_path: &str,
        value_name: &str,
    ) -> AdapterResult<Option<RegistryValue>> {
        self.check()?;
        Ok(self.value(key_path, value_name))
    }

    async fn set(
        &self,
        key_path: &str,
        value_name: &str,
        value: RegistryValue,
    ) -> AdapterResult<bool> {
        self.check()?;
        if self.rejecting_writes.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.insert(key_path, value_name, value);
        Ok(true)
    }
}

/// INI store over a map keyed by `(file, section, key)`.
#[derive(Default)]
pub struct MemoryIniStore {
    values: Mutex<HashMap<(PathBuf, String, String), String>>,
    failing: AtomicBool,
}

impl MemoryIniStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: &Path, section: &str, key: &str, value: &str) {
        self.values.lock().unwrap().insert(
            (path.to_path_buf(), section.to_string(), key.to_string()),
            value.to_string(),
        );
    }

    pub fn value(&self, path: &Path, section: &str, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap()
            .get(&(path.to_path_buf(), section.to_string(), key.to_string()))
            .cloned()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> AdapterResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(injected())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl IniStore for MemoryIniStore {
    async fn get(&self, path: &Path, section: &str, key: &str) -> AdapterResult<Option<String>> {
        self.check()?;
        Ok(self.value(path, section, key))
    }

    async fn set(&self, path: &Path, section: &str, key: &str, value: &str) -> AdapterResult<()> {
        self.check()?;
        self.insert(path, section, key, value);
        Ok(())
    }
}

/// System settings over a map keyed by setting id. An unseeded id reports
/// no value, which is a valid capture success.
#[derive(Default)]
pub struct MemorySystemSettings {
    values: Mutex<HashMap<String, Value>>,
    failing: AtomicBool,
}

impl MemorySystemSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, setting_id: &str, value: Value) {
        self.values
            .lock()
            .unwrap()
            .insert(setting_id.to_string(), value);
    }

    pub fn value(&self, setting_id: &str) -> Option<Value> {
        self.values.lock().unwrap().get(setting_id).cloned()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> AdapterResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(injected())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SystemSettings for MemorySystemSettings {
    async fn get_value(&self, setting_id: &str) -> AdapterResult<Option<Value>> {
        self.check()?;
        Ok(self.value(setting_id))
    }

    async fn set_value(&self, setting_id: &str, value: Value) -> AdapterResult<()> {
        self.check()?;
        self.insert(setting_id, value);
        Ok(())
    }
}

/// Process manager tracking running state and counting every lifecycle
/// call.
#[derive(Default)]
pub struct MemoryProcessManager {
    running: Mutex<HashSet<String>>,
    starts: Mutex<HashMap<String, usize>>,
    stops: Mutex<HashMap<String, usize>>,
    failing: AtomicBool,
}

impl MemoryProcessManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_running(&self, exe_path: &str, running: bool) {
        let mut set = self.running.lock().unwrap();
        if running {
            set.insert(exe_path.to_string());
        } else {
            set.remove(exe_path);
        }
    }

    pub fn start_count(&self, exe_path: &str) -> usize {
        self.starts.lock().unwrap().get(exe_path).copied().unwrap_or(0)
    }

    pub fn stop_count(&self, exe_path: &str) -> usize {
        self.stops.lock().unwrap().get(exe_path).copied().unwrap_or(0)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> AdapterResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(injected())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ProcessManager for MemoryProcessManager {
    async fn is_running(&self, exe_path: &str) -> AdapterResult<bool> {
        self.check()?;
        Ok(self.running.lock().unwrap().contains(exe_path))
    }

    async fn start(&self, exe_path: &str) -> AdapterResult<bool> {
        self.check()?;
        *self
            .starts
            .lock()
            .unwrap()
            .entry(exe_path.to_string())
            .or_insert(0) += 1;
        self.running.lock().unwrap().insert(exe_path.to_string());
        Ok(true)
    }

    async fn stop(&self, exe_path: &str) -> AdapterResult<bool> {
        self.check()?;
        *self
            .stops
            .lock()
            .unwrap()
            .entry(exe_path.to_string())
            .or_insert(0) += 1;
        self.running.lock().unwrap().remove(exe_path);
        Ok(true)
    }
}

/// File manager over an in-memory tree of paths to byte vectors.
#[derive(Default)]
pub struct MemoryFileManager {
    files: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
    directories: Mutex<BTreeSet<PathBuf>>,
}

impl MemoryFileManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file, registering its ancestor directories.
    pub fn add_file(&self, path: &Path, bytes: &[u8]) {
        self.register_ancestors(path);
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), bytes.to_vec());
    }

    pub fn add_directory(&self, path: &Path) {
        self.directories.lock().unwrap().insert(path.to_path_buf());
        self.register_ancestors(path);
    }

    pub fn file(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub fn file_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    fn register_ancestors(&self, path: &Path) {
        let mut dirs = self.directories.lock().unwrap();
        let mut current = path.parent();
        while let Some(dir) = current {
            if dir.as_os_str().is_empty() {
                break;
            }
            dirs.insert(dir.to_path_buf());
            current = dir.parent();
        }
    }

    fn directory_exists(&self, path: &Path) -> bool {
        self.directories.lock().unwrap().contains(path)
    }
}

#[async_trait]
impl FileManager for MemoryFileManager {
    async fn exists(&self, path: &Path) -> AdapterResult<bool> {
        Ok(self.files.lock().unwrap().contains_key(path) || self.directory_exists(path))
    }

    async fn filenames_in_directory(&self, root: &Path) -> AdapterResult<Vec<String>> {
        if !self.directory_exists(root) {
            return Err(AdapterError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory not found: {}", root.display()),
            )));
        }
        let files = self.files.lock().unwrap();
        Ok(files
            .keys()
            .filter_map(|path| path.strip_prefix(root).ok())
            .map(|relative| {
                relative
                    .components()
                    .filter_map(|c| match c {
                        Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .collect())
    }

    async fn read_all_bytes(&self, path: &Path) -> AdapterResult<Vec<u8>> {
        self.file(path).ok_or_else(|| {
            AdapterError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {}", path.display()),
            ))
        })
    }

    async fn write_all_bytes(&self, path: &Path, bytes: &[u8]) -> AdapterResult<()> {
        self.add_file(path, bytes);
        Ok(())
    }

    async fn delete(&self, path: &Path) -> AdapterResult<()> {
        self.files.lock().unwrap().remove(path);
        Ok(())
    }

    async fn create_dir_all(&self, path: &Path) -> AdapterResult<()> {
        self.add_directory(path);
        Ok(())
    }
}

/// Records every broadcast for assertion.
#[derive(Default)]
pub struct MemorySystemParameters {
    calls: Mutex<Vec<(u32, bool, bool)>>,
    failing: AtomicBool,
    rejecting: AtomicBool,
}

impl MemorySystemParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(u32, bool, bool)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_rejecting(&self, rejecting: bool) {
        self.rejecting.store(rejecting, Ordering::SeqCst);
    }
}

/// Every memory adapter in one place, with typed access to each for
/// seeding and assertions plus an `Adapters` view for binding.
pub struct MemoryAdapters {
    pub key_value: std::sync::Arc<MemoryKeyValueStore>,
    pub ini: std::sync::Arc<MemoryIniStore>,
    pub system: std::sync::Arc<MemorySystemSettings>,
    pub process: std::sync::Arc<MemoryProcessManager>,
    pub files: std::sync::Arc<MemoryFileManager>,
    pub system_parameters: std::sync::Arc<MemorySystemParameters>,
}

impl MemoryAdapters {
    pub fn new() -> Self {
        Self {
            key_value: std::sync::Arc::new(MemoryKeyValueStore::new()),
            ini: std::sync::Arc::new(MemoryIniStore::new()),
            system: std::sync::Arc::new(MemorySystemSettings::new()),
            process: std::sync::Arc::new(MemoryProcessManager::new()),
            files: std::sync::Arc::new(MemoryFileManager::new()),
            system_parameters: std::sync::Arc::new(MemorySystemParameters::new()),
        }
    }

    pub fn adapters(&self) -> crate::adapters::Adapters {
        crate::adapters::Adapters {
            key_value: self.key_value.clone(),
            ini: self.ini.clone(),
            system: self.system.clone(),
            process: self.process.clone(),
            files: self.files.clone(),
            system_parameters: self.system_parameters.clone(),
        }
    }
}

impl Default for MemoryAdapters {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SystemParameters for MemorySystemParameters {
    async fn system_parameters_info(
        &self,
        action: u32,
        update_user_profile: bool,
        send_change: bool,
    ) -> AdapterResult<bool> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.calls
            .lock()
            .unwrap()
            .push((action, update_user_profile, send_change));
        Ok(!self.rejecting.load(Ordering::SeqCst))
    }
}
