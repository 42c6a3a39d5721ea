use std::path::Path;

use anyhow::Result;
use bincode::{
    config::{BigEndian, WithOtherEndian},
    DefaultOptions, Options,
};
use serde::{de::DeserializeOwned, Serialize};
use sled::Db as Sled;

/// Thin typed layer over a sled tree: bincode values under string keys.
pub struct Db {
    handle: Sled,
    encoder: WithOtherEndian<DefaultOptions, BigEndian>,
}
impl Db {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let handle = sled::open(path)?;
        let encoder = bincode::options().with_big_endian();
        Ok(Self { handle, encoder })
    }

    // sled ids start at 0, records start at 1
    pub fn next_id(&self) -> Result<u64> {
        let id = self.handle.generate_id()?;
        Ok(id + 1)
    }

    // CRUD
    pub fn insert<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let value = self.encoder.serialize(value)?;
        self.handle.insert(key, value)?;
        Ok(())
    }
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let value = match self.handle.get(key)? {
            Some(value) => value,
            None => return Ok(None),
        };
        let value = self.encoder.deserialize(&value)?;
        Ok(Some(value))
    }
    /// Returns whether the key was present.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let old = self.handle.remove(key)?;
        Ok(old.is_some())
    }

    /// Values under `prefix`, in key order.
    pub fn scan<'a, T: DeserializeOwned + 'a>(
        &'a self,
        prefix: &str,
    ) -> impl Iterator<Item = Result<T>> + 'a {
        self.handle.scan_prefix(prefix).map(move |item| -> Result<T> {
            let (_, value) = item?;
            let value = self.encoder.deserialize(&value)?;
            Ok(value)
        })
    }
}

// Required Debug implementation for `Db`
impl std::fmt::Debug for Db {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Db").finish()
    }
}
