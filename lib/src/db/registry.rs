//! Registry of image records.
//!
//! Next to the `images` collection (guid to record) the registry maintains
//! a `shortcodes` index (shortcode to guid). Both trees are always written
//! within a single transaction, which is what makes shortcode uniqueness a
//! hard constraint even when multiple uploads commit concurrently.

use sled::transaction::ConflictableTransactionError;
use sled::Transactional;
use uuid::Uuid;

use crate::{ErrorKind, ImageRecord, Result};

use super::{decode, encode, Database, Identifiable};

const SHORTCODES: &str = "shortcodes";

impl Database {
    pub fn exists_by_shortcode(&self, shortcode: &str) -> Result<bool> {
        let codes = self.inner.open_tree(SHORTCODES)?;
        Ok(codes.contains_key(shortcode.as_bytes())?)
    }

    pub fn find_by_shortcode(&self, shortcode: &str) -> Result<ImageRecord> {
        let codes = self.inner.open_tree(SHORTCODES)?;
        let guid = match codes.get(shortcode.as_bytes())? {
            Some(bytes) => Uuid::from_slice(&bytes)?,
            None => return Err(ErrorKind::NotFound(shortcode.to_string()).into()),
        };
        // The record may have been deleted since the index lookup.
        match self.tree::<ImageRecord>()?.get(guid.as_bytes())? {
            Some(bytes) => decode(&bytes),
            None => Err(ErrorKind::NotFound(shortcode.to_string()).into()),
        }
    }

    /// Registers a new record.
    ///
    /// Fails with [`ErrorKind::ShortcodeCollision`] if the shortcode is
    /// already taken, in which case nothing is written.
    pub fn create(&self, record: &ImageRecord) -> Result<()> {
        let images = self.tree::<ImageRecord>()?;
        let codes = self.inner.open_tree(SHORTCODES)?;
        let encoded = encode(record)?;
        let id = record.get_id();
        let guid = &id.as_bytes()[..];
        let shortcode = record.shortcode.as_bytes();

        (&images, &codes).transaction(|(images, codes)| {
            if codes.get(shortcode)?.is_some() {
                return Err(ConflictableTransactionError::Abort(
                    ErrorKind::ShortcodeCollision(record.shortcode.clone()),
                ));
            }
            if images.get(guid)?.is_some() {
                return Err(ConflictableTransactionError::Abort(ErrorKind::DbError(
                    format!("image with guid '{}' already exists", record.guid),
                )));
            }
            codes.insert(shortcode, guid)?;
            images.insert(guid, encoded.as_slice())?;
            Ok(())
        })?;

        self.flush()
    }

    /// Removes the record together with its shortcode index entry.
    pub fn delete(&self, record: &ImageRecord) -> Result<()> {
        let images = self.tree::<ImageRecord>()?;
        let codes = self.inner.open_tree(SHORTCODES)?;
        let guid = &record.guid.as_bytes()[..];
        let shortcode = record.shortcode.as_bytes();

        (&images, &codes).transaction(|(images, codes)| {
            if images.remove(guid)?.is_none() {
                return Err(ConflictableTransactionError::Abort(ErrorKind::NotFound(
                    record.shortcode.clone(),
                )));
            }
            codes.remove(shortcode)?;
            Ok(())
        })?;

        self.flush()
    }

    /// Returns all records in no particular order.
    pub fn list_all(&self) -> Result<Vec<ImageRecord>> {
        self.get_collection::<ImageRecord>()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn record(shortcode: &str) -> ImageRecord {
        let guid = Uuid::now_v7();
        ImageRecord::new(guid, "images", format!("img/{guid}.png"), shortcode)
    }

    #[test]
    fn create_then_find() {
        let db = Database::temporary().unwrap();
        let rec = record("abc123");
        db.create(&rec).unwrap();

        assert!(db.exists_by_shortcode("abc123").unwrap());
        assert!(!db.exists_by_shortcode("zzz999").unwrap());
        assert_eq!(db.find_by_shortcode("abc123").unwrap(), rec);
        assert_eq!(db.len::<ImageRecord>().unwrap(), 1);
    }

    #[test]
    fn find_unknown_is_not_found() {
        let db = Database::temporary().unwrap();
        let err = db.find_by_shortcode("nope").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::NotFound(_)));
    }

    #[test]
    fn undecodable_record_is_a_storage_error() {
        let db = Database::temporary().unwrap();
        let guid = Uuid::now_v7();
        db.inner
            .open_tree(SHORTCODES)
            .unwrap()
            .insert("abc123", &guid.as_bytes()[..])
            .unwrap();
        db.tree::<ImageRecord>()
            .unwrap()
            .insert(&guid.as_bytes()[..], &b"garbage"[..])
            .unwrap();

        let err = db.find_by_shortcode("abc123").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::PotError(_)), "{err}");
    }

    #[test]
    fn duplicate_shortcode_is_rejected() {
        let db = Database::temporary().unwrap();
        let first = record("same");
        db.create(&first).unwrap();

        let err = db.create(&record("same")).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::ShortcodeCollision(ref code) if code == "same"));

        // the losing record left no trace
        assert_eq!(db.list_all().unwrap(), vec![first.clone()]);
        assert_eq!(db.find_by_shortcode("same").unwrap(), first);
    }

    #[test]
    fn concurrent_creates_keep_one_winner() {
        let db = Arc::new(Database::temporary().unwrap());
        let handles = (0..8)
            .map(|_| {
                let db = db.clone();
                std::thread::spawn(move || db.create(&record("racy")))
            })
            .collect::<Vec<_>>();

        let results = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        for err in results.into_iter().filter_map(|r| r.err()) {
            assert!(matches!(err.kind, ErrorKind::ShortcodeCollision(_)));
        }
        assert_eq!(db.list_all().unwrap().len(), 1);
    }

    #[test]
    fn delete_frees_shortcode() {
        let db = Database::temporary().unwrap();
        let rec = record("gone");
        db.create(&rec).unwrap();
        db.delete(&rec).unwrap();

        assert!(!db.exists_by_shortcode("gone").unwrap());
        assert!(db.list_all().unwrap().is_empty());

        // the code can be handed out again
        db.create(&record("gone")).unwrap();
    }

    #[test]
    fn delete_missing_record_is_not_found() {
        let db = Database::temporary().unwrap();
        let err = db.delete(&record("ghost")).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::NotFound(_)));
    }
}
