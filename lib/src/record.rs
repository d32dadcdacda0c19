//! Module describing images registered under a shortcode.

use uuid::Uuid;

use crate::db::{Collectable, Identifiable};

pub type ImageId = Uuid;

/// Visibility of a registered image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
pub enum Accessibility {
    Private = 0,
    #[default]
    Public = 1,
}

/// Metadata of an image stored in the object store. Records are never
/// updated after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub guid: ImageId,
    /// Bucket the object lives in.
    pub bucket: String,
    /// Remote object key, including the storage path prefix.
    pub filename: String,
    /// Public lookup key.
    pub shortcode: String,
    pub accessibility: Accessibility,
    /// Reserved for access-gated images.
    pub passphrase: Option<String>,
    /// Creation time in unix seconds.
    pub timestamp: i64,
}

impl ImageRecord {
    pub fn new(
        guid: ImageId,
        bucket: impl Into<String>,
        filename: impl Into<String>,
        shortcode: impl Into<String>,
    ) -> Self {
        Self {
            guid,
            bucket: bucket.into(),
            filename: filename.into(),
            shortcode: shortcode.into(),
            accessibility: Accessibility::default(),
            passphrase: None,
            timestamp: crate::util::unix_timestamp(),
        }
    }
}

impl Collectable for ImageRecord {
    fn get_collection_name() -> &'static str {
        "images"
    }
}

impl Identifiable for ImageRecord {
    fn get_id(&self) -> Uuid {
        self.guid
    }
}
