//! File-bundle handler
//!
//! Captures a set of files under a root directory as gzip+base64 payloads
//! and applies by synchronizing the directory to exactly the incoming set,
//! restricted to the configured patterns.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::adapters::FileManager;
use crate::error::{AdapterError, ApplyError, CaptureError, Captured};

/// One captured file: path relative to the configured root, contents as
/// base64 of the gzip-compressed raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePayload {
    pub relative_path: String,
    pub b64gzip: String,
}

impl FilePayload {
    pub fn encode(relative_path: impl Into<String>, bytes: &[u8]) -> std::io::Result<Self> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes)?;
        let compressed = encoder.finish()?;
        Ok(Self {
            relative_path: relative_path.into(),
            b64gzip: BASE64.encode(compressed),
        })
    }

    pub fn decode(&self) -> Result<Vec<u8>, ApplyError> {
        let compressed = BASE64
            .decode(&self.b64gzip)
            .map_err(|e| ApplyError::InvalidPayload(format!("{}: {e}", self.relative_path)))?;
        let mut bytes = Vec::new();
        GzDecoder::new(compressed.as_slice())
            .read_to_end(&mut bytes)
            .map_err(|e| ApplyError::InvalidPayload(format!("{}: {e}", self.relative_path)))?;
        Ok(bytes)
    }
}

pub struct FilesHandler {
    files: Arc<dyn FileManager>,
    root_path: PathBuf,
    patterns: Vec<String>,
}

impl FilesHandler {
    pub fn new(files: Arc<dyn FileManager>, root_path: PathBuf, patterns: Vec<String>) -> Self {
        Self {
            files,
            root_path,
            patterns,
        }
    }

    /// A missing root directory fails the capture for this setting; an
    /// individually missing file simply never matches and is skipped.
    pub async fn capture(&self) -> Result<Captured, CaptureError> {
        let names = self
            .files
            .filenames_in_directory(&self.root_path)
            .await
            .map_err(CaptureError::Backend)?;
        let matched = match_patterns(&self.patterns, &names);

        let mut payloads = Vec::with_capacity(matched.len());
        for name in matched {
            let bytes = self
                .files
                .read_all_bytes(&self.root_path.join(&name))
                .await
                .map_err(CaptureError::Backend)?;
            let payload = FilePayload::encode(name, &bytes)
                .map_err(|e| CaptureError::Backend(AdapterError::Io(e)))?;
            payloads.push(payload);
        }
        debug!(root = %self.root_path.display(), files = payloads.len(), "Captured file bundle");

        let value = serde_json::to_value(payloads)
            .map_err(|e| CaptureError::Backend(AdapterError::Backend(e.to_string())))?;
        Ok(Captured::Value(value))
    }

    /// Synchronizes the root directory to the incoming set: every
    /// pattern-matched file missing from the payload is deleted, every
    /// payload entry is written (creating parent directories as needed).
    pub async fn apply(&self, value: &Value) -> Result<(), ApplyError> {
        let payloads: Vec<FilePayload> = serde_json::from_value(value.clone())
            .map_err(|e| ApplyError::InvalidPayload(e.to_string()))?;
        let incoming: Vec<String> = payloads
            .iter()
            .map(|p| normalize(&p.relative_path))
            .collect();

        // A root that does not exist yet simply has nothing to delete.
        let existing = if self
            .files
            .exists(&self.root_path)
            .await
            .map_err(ApplyError::Backend)?
        {
            self.files
                .filenames_in_directory(&self.root_path)
                .await
                .map_err(ApplyError::Backend)?
        } else {
            Vec::new()
        };

        for name in match_patterns(&self.patterns, &existing) {
            if !incoming.contains(&name) {
                debug!(root = %self.root_path.display(), file = %name, "Deleting file absent from payload");
                self.files
                    .delete(&self.root_path.join(&name))
                    .await
                    .map_err(ApplyError::Backend)?;
            }
        }

        for payload in &payloads {
            let bytes = payload.decode()?;
            let target = self.root_path.join(normalize(&payload.relative_path));
            if let Some(parent) = target.parent() {
                self.files
                    .create_dir_all(parent)
                    .await
                    .map_err(ApplyError::Backend)?;
            }
            self.files
                .write_all_bytes(&target, &bytes)
                .await
                .map_err(ApplyError::Backend)?;
        }
        Ok(())
    }
}

/// Backslash separators come from Windows-authored documents.
fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

/// Relative names matching any configured literal name or `*` glob
/// pattern, in enumeration order without duplicates. `*` does not cross
/// directory separators, so `*.ini` is top-level only while `sub/*`
/// addresses one subdirectory.
fn match_patterns(patterns: &[String], names: &[String]) -> Vec<String> {
    let options = MatchOptions {
        require_literal_separator: true,
        ..MatchOptions::default()
    };
    let compiled: Vec<(String, Option<Pattern>)> = patterns
        .iter()
        .map(|p| {
            let normalized = normalize(p);
            let pattern = if normalized.contains('*') {
                match Pattern::new(&normalized) {
                    Ok(pattern) => Some(pattern),
                    Err(e) => {
                        warn!(pattern = %normalized, error = %e, "Ignoring unparsable file pattern");
                        None
                    }
                }
            } else {
                None
            };
            (normalized, pattern)
        })
        .collect();

    let mut matched = Vec::new();
    for name in names {
        let name = normalize(name);
        let hit = compiled.iter().any(|(literal, pattern)| match pattern {
            Some(p) => p.matches_with(&name, options),
            None => literal == &name,
        });
        if hit && !matched.contains(&name) {
            matched.push(name);
        }
    }
    matched
}
