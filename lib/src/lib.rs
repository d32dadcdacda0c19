//! Image hosting behind short shareable codes.
//!
//! An uploaded image is staged locally, pushed to an object store and
//! registered under a freshly generated shortcode. The shortcode can then be
//! used to resolve, list or delete the image.
//!
//! The [`Service`] ties the individual parts together. It's what both the
//! http surface (see [`axum`]) and the command line tool operate on.

#[macro_use]
extern crate serde_derive;

pub mod auth;
pub mod config;
pub mod db;
pub mod delete;
pub mod error;
pub mod init;
pub mod record;
pub mod retrieve;
pub mod routes;
pub mod shortcode;
pub mod staging;
pub mod store;
pub mod tracing;
pub mod upload;
pub mod util;

#[cfg(feature = "axum")]
pub mod axum;

pub use config::Config;
pub use db::Database;
pub use error::{Error, ErrorKind, Result};
pub use record::{Accessibility, ImageRecord};
pub use retrieve::{Listing, Resolved};
pub use shortcode::Generator;
pub use store::ObjectStore;
pub use upload::Uploaded;

use std::sync::Arc;

/// Shared application state. Cheap to clone, every clone points at the same
/// registry and object store.
#[derive(Clone)]
pub struct Service {
    pub config: Arc<Config>,
    pub db: Arc<Database>,
    pub store: Arc<dyn ObjectStore>,
    pub generator: Generator,
}

impl Service {
    pub fn new(config: Arc<Config>, db: Arc<Database>, store: Arc<dyn ObjectStore>) -> Result<Self> {
        let generator = Generator::from_config(&config.shortcode)?;
        Ok(Self {
            config,
            db,
            store,
            generator,
        })
    }

    /// Builds the service from configuration alone, opening the registry and
    /// constructing the configured object store backend.
    pub fn from_config(config: Config) -> Result<Self> {
        let db = Database::open(&config.registry)?;
        let store = store::from_config(&config.storage)?;
        Self::new(Arc::new(config), Arc::new(db), store)
    }
}
