//! Object store clients.
//!
//! Image payloads live in an external object store addressed by bucket and
//! key. The [`ObjectStore`] trait abstracts over the concrete backend, which
//! gets picked from configuration with [`from_config`].

mod fs;
mod http;
mod memory;

pub use fs::FsObjectStore;
pub use http::HttpObjectStore;
pub use memory::MemoryObjectStore;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::config::{Backend, Storage};
use crate::{ErrorKind, Result};

/// Client of a remote binary-object service.
///
/// Implementations don't retry failed operations, retries are left to the
/// operator or the infrastructure in front of the store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads the file at `source` under `key` in the given bucket.
    async fn put(&self, bucket: &str, key: &str, source: &Path) -> Result<()>;

    /// Removes the object. Removing an object that doesn't exist succeeds.
    async fn delete(&self, key: &str, bucket: &str) -> Result<()>;

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool>;

    fn backend(&self) -> Backend;
}

/// Creates the object store backend selected in the config.
pub fn from_config(config: &Storage) -> Result<Arc<dyn ObjectStore>> {
    let store: Arc<dyn ObjectStore> = match config.backend {
        Backend::Http => Arc::new(HttpObjectStore::new(config)?),
        Backend::Filesystem => Arc::new(FsObjectStore::new(&config.root)?),
        Backend::Memory => Arc::new(MemoryObjectStore::default()),
    };
    tracing::info!(backend = %store.backend(), bucket = %config.bucket, "object store ready");
    Ok(store)
}

/// Builds a path-style object url, `<endpoint>/<bucket>/<key>`.
pub fn object_url(endpoint: &str, bucket: &str, key: &str) -> Result<Url> {
    let mut url = Url::parse(endpoint)?;
    url.path_segments_mut()
        .map_err(|_| ErrorKind::ObjectStore(format!("endpoint can't hold a path: {endpoint}")))?
        .pop_if_empty()
        .push(bucket)
        .extend(key.split('/').filter(|s| !s.is_empty()));
    Ok(url)
}

/// Guesses the content type from the key's extension.
pub fn content_type(key: &str) -> mime::Mime {
    match crate::util::file_extension(key).as_deref() {
        Some("png") => mime::IMAGE_PNG,
        Some("jpg") | Some("jpeg") => mime::IMAGE_JPEG,
        Some("gif") => mime::IMAGE_GIF,
        Some("bmp") => mime::IMAGE_BMP,
        Some("svg") => mime::IMAGE_SVG,
        Some(ext) => format!("image/{ext}")
            .parse()
            .unwrap_or(mime::APPLICATION_OCTET_STREAM),
        None => mime::APPLICATION_OCTET_STREAM,
    }
}
