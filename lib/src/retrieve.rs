//! Resolving shortcodes and listing registered images.

use std::cmp::Reverse;

use url::Url;

use crate::store::object_url;
use crate::util::strip_extension;
use crate::{ImageRecord, Result, Service};

/// A shortcode resolved to the remote object it refers to.
#[derive(Clone, Debug, Serialize)]
pub struct Resolved {
    pub remote_url: Url,
    pub record: ImageRecord,
}

/// Single entry of the image listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub remote_url: String,
    pub display_url: String,
    pub shortcode: String,
    pub timestamp: i64,
}

impl Service {
    /// Looks up the image behind a shortcode. A trailing extension is
    /// ignored, `abc123.png` resolves the same as `abc123`.
    pub fn resolve(&self, shortcode: &str) -> Result<Resolved> {
        let record = self.db.find_by_shortcode(strip_extension(shortcode))?;
        let remote_url = self.remote_url(&record)?;
        Ok(Resolved { remote_url, record })
    }

    /// Url under which the object store serves the record's object.
    pub fn remote_url(&self, record: &ImageRecord) -> Result<Url> {
        object_url(
            self.config.storage.public_endpoint(),
            &record.bucket,
            &record.filename,
        )
    }

    /// Lists all images, most recent first.
    ///
    /// Records created within the same second are ordered by guid. Guids are
    /// time-ordered, so the newer record still comes first and the order is
    /// the same across calls.
    pub fn list(&self) -> Result<Vec<Listing>> {
        let mut records = self.db.list_all()?;
        records.sort_by_key(|r| Reverse((r.timestamp, r.guid)));

        let app_path = self.config.app_path.trim_end_matches('/');
        records
            .into_iter()
            .map(|record| {
                Ok(Listing {
                    remote_url: self.remote_url(&record)?.to_string(),
                    display_url: format!("{}/{}", app_path, record.shortcode),
                    shortcode: record.shortcode,
                    timestamp: record.timestamp,
                })
            })
            .collect()
    }
}
