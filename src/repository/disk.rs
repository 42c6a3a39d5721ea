use std::{marker::PhantomData, sync::Arc};

use anyhow::Result;

use crate::db::Db;
use crate::models::Record;

use super::{ListQuery, Repository, StoreError, StoreResult};

/// Collection persisted in sled under `<key>:<zero-padded id>`.
///
/// Zero padding keeps key order equal to id order, which is insertion order.
#[derive(Debug)]
pub struct DiskRepository<T> {
    db: Arc<Db>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> DiskRepository<T> {
    pub fn new(db: Arc<Db>) -> Self {
        Self {
            db,
            _record: PhantomData,
        }
    }

    fn prefix() -> String {
        format!("{}:", T::KEY)
    }

    fn key(id: u64) -> String {
        format!("{}:{:020}", T::KEY, id)
    }

    fn load(&self) -> Result<Vec<T>> {
        self.db.scan::<T>(&Self::prefix()).collect()
    }
}

impl<T: Record> Repository<T> for DiskRepository<T> {
    fn list(&self, query: &ListQuery) -> StoreResult<Vec<T>> {
        Ok(query.apply(self.load()?)?)
    }

    fn get(&self, id: u64) -> StoreResult<T> {
        self.db.get::<T>(&Self::key(id))?.ok_or(StoreError::NotFound)
    }

    fn create(&mut self, fields: T::Fields) -> StoreResult<T> {
        let mut record = T::create(fields)?;
        record.set_id(self.db.next_id()?);
        self.db.insert(&Self::key(record.id()), &record)?;
        Ok(record)
    }

    fn update(&mut self, id: u64, fields: T::Fields) -> StoreResult<T> {
        let changes = T::changes(fields)?;
        let mut record = self.get(id)?;
        record.apply(changes);
        self.db.insert(&Self::key(id), &record)?;
        Ok(record)
    }

    fn delete(&mut self, id: u64) -> StoreResult<()> {
        if self.db.remove(&Self::key(id))? {
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }
}
