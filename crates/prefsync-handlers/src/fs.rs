//! Filesystem-backed adapters
//!
//! Default implementations of the file and INI ports over the real file
//! system. The INI store is layered on the format-preserving document
//! model, so edits leave comments and spacing intact.

use std::path::Path;

use async_trait::async_trait;
use prefsync_ini::IniDocument;
use tokio::sync::Mutex;
use tracing::debug;

use crate::adapters::{FileManager, IniStore};
use crate::error::AdapterResult;

/// `FileManager` over `tokio::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsFileManager;

impl FsFileManager {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileManager for FsFileManager {
    async fn exists(&self, path: &Path) -> AdapterResult<bool> {
        Ok(tokio::fs::try_exists(path).await?)
    }

    async fn filenames_in_directory(&self, root: &Path) -> AdapterResult<Vec<String>> {
        let mut names = Vec::new();
        let mut pending = vec![root.to_path_buf()];
        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                } else if let Ok(relative) = path.strip_prefix(root) {
                    names.push(
                        relative
                            .components()
                            .map(|c| c.as_os_str().to_string_lossy().into_owned())
                            .collect::<Vec<_>>()
                            .join("/"),
                    );
                }
            }
        }
        names.sort();
        Ok(names)
    }

    async fn read_all_bytes(&self, path: &Path) -> AdapterResult<Vec<u8>> {
        Ok(tokio::fs::read(path).await?)
    }

    async fn write_all_bytes(&self, path: &Path, bytes: &[u8]) -> AdapterResult<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    async fn delete(&self, path: &Path) -> AdapterResult<()> {
        tokio::fs::remove_file(path).await?;
        Ok(())
    }

    async fn create_dir_all(&self, path: &Path) -> AdapterResult<()> {
        tokio::fs::create_dir_all(path).await?;
        Ok(())
    }
}

/// `IniStore` that reads, edits, and rewrites real INI files through the
/// format-preserving document model. Writes to different keys of the same
/// file are serialized by a single store-wide lock, which is sufficient
/// for the sequential sessions that own it.
#[derive(Debug, Default)]
pub struct FsIniStore {
    write_lock: Mutex<()>,
}

impl FsIniStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn load(&self, path: &Path) -> AdapterResult<IniDocument> {
        let text = tokio::fs::read_to_string(path).await?;
        Ok(IniDocument::parse(&text))
    }
}

#[async_trait]
impl IniStore for FsIniStore {
    async fn get(&self, path: &Path, section: &str, key: &str) -> AdapterResult<Option<String>> {
        Ok(self.load(path).await?.get(section, key))
    }

    async fn set(&self, path: &Path, section: &str, key: &str, value: &str) -> AdapterResult<()> {
        let _guard = self.write_lock.lock().await;
        // A missing file is created from scratch.
        let mut document = match tokio::fs::read_to_string(path).await {
            Ok(text) => IniDocument::parse(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => IniDocument::parse(""),
            Err(e) => return Err(e.into()),
        };
        document.set(section, key, value);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, document.to_text()).await?;
        debug!(file = %path.display(), section, key, "Updated INI value");
        Ok(())
    }
}
