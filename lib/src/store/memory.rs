use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::config::Backend;
use crate::{ErrorKind, Result};

use super::ObjectStore;

/// Object store keeping everything in process memory.
///
/// Can be switched into an unavailable state in which every operation fails,
/// which comes in handy for exercising failure paths.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<(String, String), Vec<u8>>>,
    unavailable: AtomicBool,
}

impl MemoryObjectStore {
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn get(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ErrorKind::ObjectStore("object store unavailable".to_string()).into());
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, bucket: &str, key: &str, source: &Path) -> Result<()> {
        self.check_available()?;
        let bytes = tokio::fs::read(source).await?;
        self.objects
            .write()
            .await
            .insert((bucket.to_string(), key.to_string()), bytes);
        Ok(())
    }

    async fn delete(&self, key: &str, bucket: &str) -> Result<()> {
        self.check_available()?;
        self.objects
            .write()
            .await
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
        self.check_available()?;
        Ok(self.get(bucket, key).await.is_some())
    }

    fn backend(&self) -> Backend {
        Backend::Memory
    }
}
