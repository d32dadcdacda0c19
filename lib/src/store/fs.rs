use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::config::Backend;
use crate::{ErrorKind, Result};

use super::ObjectStore;

/// Object store backed by a local directory. Objects end up at
/// `<root>/<bucket>/<key>`.
#[derive(Clone, Debug)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Creates the root directory if it doesn't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        tracing::debug!(root = %root.display(), "filesystem object store ready");
        Ok(Self { root })
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        let relative = Path::new(bucket).join(key);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(ErrorKind::ObjectStore(format!("invalid object key: {bucket}/{key}")).into());
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    #[tracing::instrument(skip(self, source))]
    async fn put(&self, bucket: &str, key: &str, source: &Path) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Copy to a temp file first, then rename so that readers never see a
        // partially written object.
        let mut temp = path.clone().into_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);
        tokio::fs::copy(source, &temp).await?;
        tokio::fs::rename(&temp, &path).await?;

        tracing::debug!(path = %path.display(), "object stored");
        Ok(())
    }

    async fn delete(&self, key: &str, bucket: &str) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
        let path = self.object_path(bucket, key)?;
        Ok(tokio::fs::try_exists(path).await?)
    }

    fn backend(&self) -> Backend {
        Backend::Filesystem
    }
}
