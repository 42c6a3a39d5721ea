use crate::models::Record;

use super::{ListQuery, Repository, StoreError, StoreResult};

/// In-memory arena: records in insertion order plus a monotonic id counter.
#[derive(Debug)]
pub struct MemoryRepository<T> {
    records: Vec<T>,
    next_id: u64,
}

impl<T: Record> MemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
        }
    }

    fn position(&self, id: u64) -> StoreResult<usize> {
        self.records
            .iter()
            .position(|r| r.id() == id)
            .ok_or(StoreError::NotFound)
    }
}

impl<T: Record> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> Repository<T> for MemoryRepository<T> {
    fn list(&self, query: &ListQuery) -> StoreResult<Vec<T>> {
        Ok(query.apply(self.records.iter().cloned())?)
    }

    fn get(&self, id: u64) -> StoreResult<T> {
        let index = self.position(id)?;
        Ok(self.records[index].clone())
    }

    fn create(&mut self, fields: T::Fields) -> StoreResult<T> {
        let mut record = T::create(fields)?;
        record.set_id(self.next_id);
        self.next_id += 1;
        self.records.push(record.clone());
        Ok(record)
    }

    fn update(&mut self, id: u64, fields: T::Fields) -> StoreResult<T> {
        let changes = T::changes(fields)?;
        let index = self.position(id)?;
        let record = &mut self.records[index];
        record.apply(changes);
        Ok(record.clone())
    }

    fn delete(&mut self, id: u64) -> StoreResult<()> {
        let index = self.position(id)?;
        self.records.remove(index);
        Ok(())
    }
}
