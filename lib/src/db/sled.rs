use serde::de::DeserializeOwned;
use sled::Tree;

use crate::config::Registry;
use crate::Result;

use super::{decode, Collectable};

#[derive(Clone, Debug)]
pub struct SledDb {
    pub(super) inner: sled::Db,
}

impl SledDb {
    /// Opens the database at the configured path. A temporary database gets
    /// a fresh location of its own and is removed when dropped.
    pub fn open(config: &Registry) -> Result<Self> {
        let mut cfg = sled::Config::default().temporary(config.temporary);
        if !config.temporary {
            cfg = cfg.path(&config.path);
        }
        let inner = cfg.open()?;
        Ok(Self { inner })
    }

    /// Opens a throwaway database.
    pub fn temporary() -> Result<Self> {
        Self::open(&Registry {
            temporary: true,
            ..Default::default()
        })
    }

    pub(super) fn tree<T: Collectable>(&self) -> Result<Tree> {
        Ok(self.inner.open_tree(T::get_collection_name())?)
    }

    /// Gets all entries of the collection defined for the item type.
    pub fn get_collection<T: DeserializeOwned + Collectable>(&self) -> Result<Vec<T>> {
        let tree = self.tree::<T>()?;
        let mut out = Vec::new();
        for entry in tree.iter() {
            let (_, value_bytes) = entry?;
            let value: T = decode(&value_bytes)?;
            out.push(value);
        }
        Ok(out)
    }

    /// Returns the length of the collection as defined for the specified type.
    pub fn len<T: Collectable>(&self) -> Result<usize> {
        Ok(self.tree::<T>()?.len())
    }

    /// Makes sure all pending writes reach the disk.
    pub fn flush(&self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }
}
