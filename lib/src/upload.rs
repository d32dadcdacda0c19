//! Upload coordination.
//!
//! An upload goes through the following steps, each of which may fail:
//!
//! 1. the extension of the original file name is checked against the
//!    allow-list, before anything else happens,
//! 2. a fresh guid is minted, the object key becomes `<guid>.<ext>`,
//! 3. the payload is streamed into the local staging directory, an empty
//!    payload is rejected,
//! 4. a shortcode not yet present in the registry is generated,
//! 5. the staged file is pushed to the object store,
//! 6. the record is committed to the registry,
//! 7. the staged file is removed.
//!
//! A record is only ever committed after its object made it to the object
//! store. If the commit fails afterwards, the remote object is left
//! orphaned. No record points to it, so nothing is served from it, but it
//! does take up space until an operator removes it.

use tokio::io::AsyncRead;
use tracing::Span;
use uuid::Uuid;

use crate::staging::StagedFile;
use crate::util::file_extension;
use crate::{routes, ErrorKind, ImageRecord, Result, Service};

/// Outcome of a successful upload.
#[derive(Clone, Debug, Serialize)]
pub struct Uploaded {
    pub shortcode: String,
    /// Public link, `<app_path>/<shortcode>.png`.
    pub link: String,
    pub record: ImageRecord,
}

impl Service {
    /// Returns the lowercased extension if it's on the allow-list.
    pub fn validate_extension(&self, filename: &str) -> Result<String> {
        let allowed = &self.config.upload.allowed_extensions;
        match file_extension(filename) {
            Some(ext) if allowed.iter().any(|a| a.eq_ignore_ascii_case(&ext)) => Ok(ext),
            _ => Err(ErrorKind::InvalidFileType(allowed.clone()).into()),
        }
    }

    /// Public link for the shortcode. The `.png` suffix is for display only,
    /// the stored object keeps its original extension.
    pub fn link(&self, shortcode: &str) -> String {
        format!(
            "{}/{}.png",
            self.config.app_path.trim_end_matches('/'),
            shortcode
        )
    }

    /// Stores the image read from `reader` and registers it under a new
    /// shortcode.
    #[tracing::instrument(skip(self, reader), fields(guid, shortcode))]
    pub async fn upload<R>(&self, reader: &mut R, original_filename: &str) -> Result<Uploaded>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let extension = self.validate_extension(original_filename)?;

        let guid = Uuid::now_v7();
        let key = format!("{}.{}", guid, extension);
        Span::current().record("guid", tracing::field::display(guid));

        let staged = StagedFile::write(&self.config.upload.staging_dir, &key, reader).await?;
        if staged.size() == 0 {
            return Err(ErrorKind::BadInput("no file was provided".to_string()).into());
        }

        let shortcode = self.unique_shortcode()?;

        let storage = &self.config.storage;
        let object_path = storage.object_path(&key);
        let put = self
            .store
            .put(&storage.bucket, &object_path, staged.path())
            .await;
        if let Err(e) = staged.remove().await {
            tracing::warn!("failed removing staged file: {e}");
        }
        if let Err(e) = put {
            tracing::warn!(bucket = %storage.bucket, key = %object_path, "remote upload failed: {e}");
            return Err(ErrorKind::RemoteUploadFailure(e.kind.to_string()).into());
        }

        let record = self.commit(ImageRecord::new(
            guid,
            storage.bucket.clone(),
            object_path,
            shortcode,
        ))?;
        Span::current().record("shortcode", record.shortcode.as_str());
        tracing::info!(key = %record.filename, "image uploaded");

        Ok(Uploaded {
            link: self.link(&record.shortcode),
            shortcode: record.shortcode.clone(),
            record,
        })
    }

    pub(crate) fn unique_shortcode(&self) -> Result<String> {
        let occupied = self.db.len::<ImageRecord>()?;
        self.generator.ensure_unique(occupied, |code| {
            Ok(routes::is_reserved(code) || self.db.exists_by_shortcode(code)?)
        })
    }

    /// Commits the record, regenerating its shortcode whenever a concurrent
    /// upload took it between generation and commit.
    pub(crate) fn commit(&self, mut record: ImageRecord) -> Result<ImageRecord> {
        let mut retries = 0;
        loop {
            let kind = match self.db.create(&record) {
                Ok(()) => return Ok(record),
                Err(e) => e.kind,
            };
            match kind {
                ErrorKind::ShortcodeCollision(code)
                    if retries < self.config.shortcode.commit_retries =>
                {
                    retries += 1;
                    tracing::debug!(shortcode = %code, retries, "shortcode taken at commit, regenerating");
                    match self.unique_shortcode() {
                        Ok(shortcode) => record.shortcode = shortcode,
                        Err(e) => return Err(orphaned(&record, e.kind)),
                    }
                }
                kind => return Err(orphaned(&record, kind)),
            }
        }
    }
}

fn orphaned(record: &ImageRecord, cause: ErrorKind) -> crate::Error {
    tracing::error!(
        guid = %record.guid,
        bucket = %record.bucket,
        key = %record.filename,
        "failed committing record, remote object left orphaned: {cause}"
    );
    ErrorKind::CommitFailure(cause.to_string()).into()
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

    #[test]
    fn validates_extension_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        let (service, _) = service(dir.path());
        assert_eq!(service.validate_extension("Cat.JPG").unwrap(), "jpg");
        assert!(service.validate_extension("malware.exe").is_err());
        assert!(service.validate_extension("README").is_err());
    }

    #[test]
    fn invalid_type_lists_allowed_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let (service, _) = service(dir.path());
        let err = service.validate_extension("x.exe").unwrap_err();
        assert!(err.kind.to_string().contains(".png, .jpg"));
    }

    #[test]
    fn link_uses_app_path() {
        let dir = tempfile::tempdir().unwrap();
        let (service, _) = service(dir.path());
        assert_eq!(service.link("abc123"), "/abc123.png");
    }

    #[test]
    fn commit_regenerates_taken_shortcode() {
        let dir = tempfile::tempdir().unwrap();
        let (service, _) = service(dir.path());

        let winner = ImageRecord::new(Uuid::now_v7(), "images", "img/a.png", "abc123");
        service.db.create(&winner).unwrap();

        // a second upload generated the same code before the first committed
        let loser = ImageRecord::new(Uuid::now_v7(), "images", "img/b.png", "abc123");
        let committed = service.commit(loser.clone()).unwrap();

        assert_ne!(committed.shortcode, "abc123");
        assert_eq!(committed.guid, loser.guid);
        assert_eq!(service.db.find_by_shortcode("abc123").unwrap(), winner);
        assert_eq!(
            service.db.find_by_shortcode(&committed.shortcode).unwrap(),
            committed
        );
    }

    #[test]
    fn commit_gives_up_after_retries() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.upload.staging_dir = dir.path().join("staging");
        // a single-code space leaves nothing to regenerate into
        config.shortcode.alphabet = "a".to_string();
        config.shortcode.length = 1;
        let service = Service::new(
            Arc::new(config),
            Arc::new(Database::temporary().unwrap()),
            Arc::new(MemoryObjectStore::default()),
        )
        .unwrap();

        service
            .db
            .create(&ImageRecord::new(Uuid::now_v7(), "images", "img/a.png", "a"))
            .unwrap();
        let err = service
            .commit(ImageRecord::new(Uuid::now_v7(), "images", "img/b.png", "a"))
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::CommitFailure(_)));
        assert_eq!(service.db.list_all().unwrap().len(), 1);
    }

    #[test]
    fn never_hands_out_route_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.upload.staging_dir = dir.path().join("staging");
        config.shortcode.alphabet = "list".to_string();
        config.shortcode.length = 4;
        let service = Service::new(
            Arc::new(config),
            Arc::new(Database::temporary().unwrap()),
            Arc::new(MemoryObjectStore::default()),
        )
        .unwrap();

        // occupy everything but `list` and `tsil`
        let alphabet = ['i', 'l', 's', 't'];
        for a in alphabet {
            for b in alphabet {
                for c in alphabet {
                    for d in alphabet {
                        let code = [a, b, c, d].iter().collect::<String>();
                        if code == "list" || code == "tsil" {
                            continue;
                        }
                        let record =
                            ImageRecord::new(Uuid::now_v7(), "images", format!("img/{code}.png"), code);
                        service.db.create(&record).unwrap();
                    }
                }
            }
        }

        for _ in 0..20 {
            assert_eq!(service.unique_shortcode().unwrap(), "tsil");
        }
    }

    #[test]
    fn commit_failure_is_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let (service, _) = service(dir.path());

        let guid = Uuid::now_v7();
        let existing = ImageRecord::new(guid, "images", "img/a.png", "taken1");
        service.db.create(&existing).unwrap();

        // same guid under a free shortcode, the registry refuses the write
        let err = service
            .commit(ImageRecord::new(guid, "images", "img/b.png", "fresh1"))
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::CommitFailure(ref cause) if cause.contains("already exists")));

        assert_eq!(service.db.list_all().unwrap(), vec![existing.clone()]);
        assert_eq!(service.db.find_by_shortcode("taken1").unwrap(), existing);
        assert!(!service.db.exists_by_shortcode("fresh1").unwrap());
    }

    #[tokio::test]
    async fn empty_payload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (service, store) = service(dir.path());

        let err = service.upload(&mut &b""[..], "cat.jpg").await.unwrap_err();
        assert!(matches!(err.kind, ErrorKind::BadInput(_)));
        assert_eq!(store.len().await, 0);
        assert!(service.db.list_all().unwrap().is_empty());
        assert_eq!(std::fs::read_dir(dir.path().join("staging")).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn stores_object_under_prefixed_guid_key() {
        let dir = tempfile::tempdir().unwrap();
        let (service, store) = service(dir.path());

        let uploaded = service.upload(&mut &b"jpeg"[..], "cat.jpg").await.unwrap();
        let record = &uploaded.record;
        assert_eq!(record.filename, format!("img/{}.jpg", record.guid));
        assert_eq!(record.bucket, "images");
        assert_eq!(record.passphrase, None);
        assert_eq!(record.accessibility, crate::Accessibility::Public);
        assert_eq!(
            store.get("images", &record.filename).await.unwrap(),
            b"jpeg"
        );
    }
}
