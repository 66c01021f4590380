//! File-bundle handler synchronization semantics

use std::path::Path;

use prefsync_handlers::files::FilesHandler;
use prefsync_handlers::fs::FsFileManager;
use prefsync_handlers::memory::MemoryFileManager;
use prefsync_handlers::{CaptureError, Captured, FilePayload};
use serde_json::json;
use std::sync::Arc;

fn payload_value(entries: &[(&str, &[u8])]) -> serde_json::Value {
    let payloads: Vec<FilePayload> = entries
        .iter()
        .map(|(path, bytes)| FilePayload::encode(*path, bytes).unwrap())
        .collect();
    serde_json::to_value(payloads).unwrap()
}

#[tokio::test]
async fn capture_matches_patterns_and_encodes_contents() {
    let files = Arc::new(MemoryFileManager::new());
    let root = Path::new("/profile/app");
    files.add_file(&root.join("a.ini"), b"alpha");
    files.add_file(&root.join("sub/b.ini"), b"beta");
    files.add_file(&root.join("notes.txt"), b"skip");

    let handler = FilesHandler::new(files, root.to_path_buf(), vec!["*.ini".to_string()]);
    let captured = handler.capture().await.unwrap();
    let Captured::Value(value) = captured else {
        panic!("expected a value");
    };
    let payloads: Vec<FilePayload> = serde_json::from_value(value).unwrap();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].relative_path, "a.ini");
    assert_eq!(payloads[0].decode().unwrap(), b"alpha");
}

#[tokio::test]
async fn capture_fails_hard_on_missing_root() {
    let files = Arc::new(MemoryFileManager::new());
    let handler = FilesHandler::new(
        files,
        "/missing/root".into(),
        vec!["*.ini".to_string()],
    );
    assert!(matches!(
        handler.capture().await,
        Err(CaptureError::Backend(_))
    ));
}

#[tokio::test]
async fn apply_synchronizes_to_exactly_the_incoming_set() {
    let files = Arc::new(MemoryFileManager::new());
    let root = Path::new("/profile/app");
    files.add_file(&root.join("a.ini"), b"old-a");
    files.add_file(&root.join("b.ini"), b"old-b");
    files.add_file(&root.join("keep.txt"), b"keep");

    let handler = FilesHandler::new(
        files.clone(),
        root.to_path_buf(),
        vec!["*.ini".to_string()],
    );
    handler
        .apply(&payload_value(&[("c.ini", &b"fresh"[..])]))
        .await
        .unwrap();

    assert_eq!(files.file(&root.join("a.ini")), None);
    assert_eq!(files.file(&root.join("b.ini")), None);
    assert_eq!(files.file(&root.join("c.ini")), Some(b"fresh".to_vec()));
    // Outside the configured patterns: untouched.
    assert_eq!(files.file(&root.join("keep.txt")), Some(b"keep".to_vec()));
}

#[tokio::test]
async fn apply_scopes_deletions_to_pattern_directories() {
    let files = Arc::new(MemoryFileManager::new());
    let root = Path::new("/profile/app");
    files.add_file(&root.join("a.ini"), b"a");
    files.add_file(&root.join("subfolder/b.ini"), b"b");

    // Top-level pattern only: the subfolder file survives the sync.
    let handler = FilesHandler::new(
        files.clone(),
        root.to_path_buf(),
        vec!["*.ini".to_string()],
    );
    handler.apply(&payload_value(&[])).await.unwrap();
    assert_eq!(files.file(&root.join("a.ini")), None);
    assert!(files.file(&root.join("subfolder/b.ini")).is_some());

    // Subfolder pattern, Windows-style separator: now it is deleted.
    let handler = FilesHandler::new(
        files.clone(),
        root.to_path_buf(),
        vec!["subfolder\\*".to_string()],
    );
    handler.apply(&payload_value(&[])).await.unwrap();
    assert_eq!(files.file(&root.join("subfolder/b.ini")), None);
}

#[tokio::test]
async fn apply_rejects_malformed_payloads() {
    let files = Arc::new(MemoryFileManager::new());
    let handler = FilesHandler::new(files, "/profile/app".into(), vec!["*.ini".to_string()]);
    assert!(handler.apply(&json!("not a payload")).await.is_err());
    assert!(handler
        .apply(&json!([{"relative_path": "a.ini", "b64gzip": "!!!"}]))
        .await
        .is_err());
}

#[tokio::test]
async fn roundtrip_over_the_real_filesystem() {
    let source = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    tokio::fs::write(source.path().join("a.ini"), b"[S]\nk = v\n")
        .await
        .unwrap();
    tokio::fs::create_dir_all(source.path().join("sub")).await.unwrap();
    tokio::fs::write(source.path().join("sub/b.ini"), b"nested")
        .await
        .unwrap();

    let manager = Arc::new(FsFileManager::new());
    let patterns = vec!["*.ini".to_string(), "sub/*".to_string()];
    let capture_handler = FilesHandler::new(
        manager.clone(),
        source.path().to_path_buf(),
        patterns.clone(),
    );
    let Captured::Value(value) = capture_handler.capture().await.unwrap() else {
        panic!("expected a value");
    };

    let apply_handler =
        FilesHandler::new(manager, target.path().to_path_buf(), patterns);
    apply_handler.apply(&value).await.unwrap();

    assert_eq!(
        tokio::fs::read(target.path().join("a.ini")).await.unwrap(),
        b"[S]\nk = v\n"
    );
    assert_eq!(
        tokio::fs::read(target.path().join("sub/b.ini"))
            .await
            .unwrap(),
        b"nested"
    );
}
