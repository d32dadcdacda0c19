//! Image registry persistence.
//!
//! Records are pot-encoded and kept in a `sled` database. See
//! [`registry`] for the operations the rest of the crate relies on.

mod registry;
mod sled;

use uuid::Uuid;

use crate::Result;

pub use self::sled::SledDb as Database;

pub trait Identifiable {
    fn get_id(&self) -> Uuid;
}

pub trait Collectable {
    fn get_collection_name() -> &'static str;
}

pub fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let t: T = pot::from_slice(bytes)?;
    Ok(t)
}

pub fn encode<T: serde::Serialize>(item: &T) -> Result<Vec<u8>> {
    let bytes = pot::to_vec(item)?;
    Ok(bytes)
}
