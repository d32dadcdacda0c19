//! Removal of images.

use crate::util::strip_extension;
use crate::{ErrorKind, ImageRecord, Result, Service};

impl Service {
    /// Deletes the image registered under the shortcode.
    ///
    /// The remote object goes first, the record second. If the object store
    /// refuses, the record stays and the image remains fully intact. If the
    /// record can't be removed after the object is gone, the error is
    /// reported and nothing is rolled back.
    ///
    /// Callers are expected to have authorized the operator beforehand.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, shortcode: &str) -> Result<ImageRecord> {
        let record = self.db.find_by_shortcode(strip_extension(shortcode))?;

        self.store
            .delete(&record.filename, &record.bucket)
            .await
            .map_err(|e| {
                tracing::warn!(key = %record.filename, "failed deleting remote object: {e}");
                e
            })?;

        if let Err(e) = self.db.delete(&record) {
            tracing::error!(
                guid = %record.guid,
                key = %record.filename,
                "remote object deleted but record removal failed: {e}"
            );
            return Err(match e.kind {
                ErrorKind::NotFound(code) => ErrorKind::NotFound(code).into(),
                kind => ErrorKind::DbError(format!(
                    "record {} left without remote object: {}",
                    record.guid, kind
                ))
                .into(),
            });
        }

        tracing::info!(shortcode = %record.shortcode, key = %record.filename, "image deleted");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::MemoryObjectStore;
    use crate::{Config, Database};

    fn service(dir: &std::path::Path) -> (Service, Arc<MemoryObjectStore>) {
        let mut config = Config::default();
        config.upload.staging_dir = dir.join("staging");
        let store = Arc::new(MemoryObjectStore::default());
        let service = Service::new(
            Arc::new(config),
            Arc::new(Database::temporary().unwrap()),
            store.clone(),
        )
        .unwrap();
        (service, store)
    }

    #[tokio::test]
    async fn removes_object_and_record() {
        let dir = tempfile::tempdir().unwrap();
        let (service, store) = service(dir.path());
        let uploaded = service.upload(&mut &b"gif"[..], "a.gif").await.unwrap();

        let deleted = service.delete(&uploaded.shortcode).await.unwrap();
        assert_eq!(deleted, uploaded.record);
        assert_eq!(store.len().await, 0);
        let err = service.resolve(&uploaded.shortcode).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn accepts_display_extension() {
        let dir = tempfile::tempdir().unwrap();
        let (service, _) = service(dir.path());
        let uploaded = service.upload(&mut &b"gif"[..], "a.gif").await.unwrap();

        service
            .delete(&format!("{}.png", uploaded.shortcode))
            .await
            .unwrap();
        assert!(service.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_shortcode_mutates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (service, store) = service(dir.path());
        service.upload(&mut &b"png"[..], "keep.png").await.unwrap();

        let err = service.delete("missing").await.unwrap_err();
        assert!(matches!(err.kind, ErrorKind::NotFound(_)));
        assert_eq!(store.len().await, 1);
        assert_eq!(service.list().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn store_outage_keeps_record() {
        let dir = tempfile::tempdir().unwrap();
        let (service, store) = service(dir.path());
        let uploaded = service.upload(&mut &b"png"[..], "keep.png").await.unwrap();

        store.set_unavailable(true);
        assert!(service.delete(&uploaded.shortcode).await.is_err());
        store.set_unavailable(false);

        assert_eq!(service.resolve(&uploaded.shortcode).unwrap().record, uploaded.record);
        assert_eq!(store.len().await, 1);
    }
}
