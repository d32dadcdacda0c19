use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use snapcode::store::{FsObjectStore, MemoryObjectStore};
use snapcode::{Config, Database, ErrorKind, ObjectStore, Service};
use tempfile::TempDir;

fn config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.upload.staging_dir = dir.join("staging");
    config.storage.root = dir.join("objects");
    config
}

fn staged_files(config: &Config) -> usize {
    match std::fs::read_dir(&config.upload.staging_dir) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}

#[tokio::test]
async fn round_trip_through_filesystem_store() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let config = config(dir.path());
    let store = Arc::new(FsObjectStore::new(&config.storage.root)?);
    let service = Service::new(
        Arc::new(config),
        Arc::new(Database::temporary()?),
        store.clone(),
    )?;

    let uploaded = service.upload(&mut &b"png bytes"[..], "photo.PNG").await?;
    assert_eq!(uploaded.link, format!("/{}.png", uploaded.shortcode));

    let stored = dir
        .path()
        .join("objects")
        .join("images")
        .join(&uploaded.record.filename);
    assert_eq!(std::fs::read(&stored)?, b"png bytes");
    assert!(store.exists("images", &uploaded.record.filename).await?);
    assert_eq!(staged_files(&service.config), 0);

    let resolved = service.resolve(&uploaded.link[1..])?;
    assert_eq!(resolved.record, uploaded.record);

    service.delete(&uploaded.shortcode).await?;
    assert!(!stored.exists());
    assert!(service.list()?.is_empty());
    Ok(())
}

#[tokio::test]
async fn invalid_type_touches_nothing() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let config = config(dir.path());
    let store = Arc::new(MemoryObjectStore::default());
    let service = Service::new(
        Arc::new(config),
        Arc::new(Database::temporary()?),
        store.clone(),
    )?;

    let err = service
        .upload(&mut &b"MZ"[..], "malware.exe")
        .await
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidFileType(_)));
    assert_eq!(store.len().await, 0);
    assert!(service.list()?.is_empty());
    assert!(!service.config.upload.staging_dir.exists());
    Ok(())
}

#[tokio::test]
async fn remote_failure_registers_nothing() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let config = config(dir.path());
    let store = Arc::new(MemoryObjectStore::default());
    store.set_unavailable(true);
    let service = Service::new(
        Arc::new(config),
        Arc::new(Database::temporary()?),
        store.clone(),
    )?;

    let err = service
        .upload(&mut &b"gif"[..], "anim.gif")
        .await
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::RemoteUploadFailure(_)));
    assert!(service.list()?.is_empty());
    assert_eq!(staged_files(&service.config), 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_uploads_get_distinct_shortcodes() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let mut config = config(dir.path());
    // small enough for generated codes to collide regularly
    config.shortcode.alphabet = "abcd".to_string();
    config.shortcode.length = 3;
    config.shortcode.commit_retries = 64;
    let service = Service::new(
        Arc::new(config),
        Arc::new(Database::temporary()?),
        Arc::new(MemoryObjectStore::default()),
    )?;

    let mut handles = Vec::new();
    for i in 0..24 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .upload(&mut &b"bytes"[..], &format!("image{i}.jpg"))
                .await
        }));
    }

    let mut codes = HashSet::new();
    for handle in handles {
        let uploaded = handle.await??;
        assert!(codes.insert(uploaded.shortcode));
    }
    assert_eq!(codes.len(), 24);
    assert_eq!(service.list()?.len(), 24);
    assert_eq!(staged_files(&service.config), 0);
    Ok(())
}
