//! Local staging of uploads.
//!
//! Incoming payloads are written to the staging directory before being
//! pushed to the object store. This decouples the remote upload from the
//! inbound request stream.

use std::path::{Path, PathBuf};

use tokio::io::{AsyncRead, AsyncWriteExt};
use uuid::Uuid;

use crate::Result;

/// A staged upload on local disk.
///
/// The file is removed when the value is dropped, so whatever way an upload
/// ends, nothing stays behind in the staging directory.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    size: u64,
    removed: bool,
}

impl StagedFile {
    /// Streams `reader` into `<dir>/<key>`, creating the directory if needed.
    ///
    /// Keys are expected to be unique per upload. An existing file under the
    /// same key is never overwritten.
    pub async fn write<R>(dir: &Path, key: &str, reader: &mut R) -> Result<Self>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(key);
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        // From here on the guard owns the file, a failed copy removes it.
        let mut staged = Self {
            path,
            size: 0,
            removed: false,
        };
        staged.size = tokio::io::copy(reader, &mut file).await?;
        file.flush().await?;

        tracing::trace!(path = %staged.path.display(), size = staged.size, "staged upload");
        Ok(staged)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Removes the staged file right away.
    pub async fn remove(mut self) -> Result<()> {
        self.removed = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), "failed removing staged file: {e}");
            }
        }
    }
}

/// Whether the file name has the shape of a staging key, `<guid>.<ext>`.
pub fn is_staging_key(name: &str) -> bool {
    match name.split_once('.') {
        Some((stem, ext)) => !ext.is_empty() && Uuid::parse_str(stem).is_ok(),
        None => false,
    }
}

/// Removes leftovers of uploads interrupted by a crash. Staged files are
/// never referenced by any record, so all of them can go. Files not named
/// like a staging key are left alone. Returns the number of removed files.
pub fn sweep(dir: &Path) -> Result<usize> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut removed = 0;
    for entry in entries {
        let entry = entry?;
        let is_key = entry.file_name().to_str().is_some_and(is_staging_key);
        if is_key && entry.file_type()?.is_file() {
            std::fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dropping_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedFile::write(dir.path(), "a.png", &mut &b"bytes"[..])
            .await
            .unwrap();
        let path = staged.path().to_path_buf();
        assert_eq!(staged.size(), 5);
        assert_eq!(std::fs::read(&path).unwrap(), b"bytes");

        drop(staged);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn explicit_remove() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedFile::write(dir.path(), "b.png", &mut &b"x"[..])
            .await
            .unwrap();
        let path = staged.path().to_path_buf();
        staged.remove().await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let _first = StagedFile::write(dir.path(), "c.png", &mut &b"one"[..])
            .await
            .unwrap();
        assert!(StagedFile::write(dir.path(), "c.png", &mut &b"two"[..])
            .await
            .is_err());
        assert_eq!(std::fs::read(dir.path().join("c.png")).unwrap(), b"one");
    }

    #[test]
    fn sweep_clears_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let first = format!("{}.png", Uuid::now_v7());
        let second = format!("{}.jpg", Uuid::now_v7());
        std::fs::write(dir.path().join(&first), b"x").unwrap();
        std::fs::write(dir.path().join(&second), b"y").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("operator-notes.txt"), b"keep").unwrap();

        assert_eq!(sweep(dir.path()).unwrap(), 2);
        assert!(!dir.path().join(&first).exists());
        assert!(dir.path().join("nested").exists());
        assert!(dir.path().join("operator-notes.txt").exists());
        assert_eq!(sweep(&dir.path().join("missing")).unwrap(), 0);
    }

    #[test]
    fn recognizes_staging_keys() {
        let guid = Uuid::now_v7();
        assert!(is_staging_key(&format!("{guid}.png")));
        assert!(!is_staging_key(&guid.to_string()));
        assert!(!is_staging_key(&format!("{guid}.")));
        assert!(!is_staging_key("notes.txt"));
    }
}
