//! Collection stores for the resource types.

pub mod disk;
pub mod memory;

use anyhow::Result;
use thiserror::Error;

use crate::collate::Collation;
use crate::models::{Record, ValidationError};

pub use disk::DiskRepository;
pub use memory::MemoryRepository;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// CRUD over one collection of records.
///
/// Mutations never leave a half-applied record behind: input is validated
/// before the store is touched.
pub trait Repository<T: Record>: Send + Sync {
    fn list(&self, query: &ListQuery) -> StoreResult<Vec<T>>;
    fn get(&self, id: u64) -> StoreResult<T>;
    fn create(&mut self, fields: T::Fields) -> StoreResult<T>;
    fn update(&mut self, id: u64, fields: T::Fields) -> StoreResult<T>;
    fn delete(&mut self, id: u64) -> StoreResult<()>;
}

/// Query string accepted by `GET /<collection>`.
#[derive(Debug, Default, Clone)]
pub struct ListQuery {
    pub search: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sort {
    Asc,
    Desc,
}

impl ListQuery {
    /// Builds a query from raw key/value pairs. A repeated key joins its
    /// values with `,`, so `sort=asc&sort=asc` asks for no sort at all.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut query = ListQuery::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "search" => &mut query.search,
                "sort" => &mut query.sort,
                _ => continue,
            };
            match slot {
                Some(joined) => {
                    joined.push(',');
                    joined.push_str(&value);
                }
                None => *slot = Some(value),
            }
        }
        query
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.is_empty())
    }

    /// Unknown sort values leave the order untouched.
    pub fn sort(&self) -> Option<Sort> {
        match self.sort.as_deref() {
            Some("asc") => Some(Sort::Asc),
            Some("desc") => Some(Sort::Desc),
            _ => None,
        }
    }

    /// Filters and orders records that are already in insertion order.
    pub fn apply<T: Record>(&self, records: impl IntoIterator<Item = T>) -> Result<Vec<T>> {
        let mut records: Vec<T> = match self.search() {
            Some(term) => records.into_iter().filter(|r| r.matches(term)).collect(),
            None => records.into_iter().collect(),
        };
        if let Some(sort) = self.sort() {
            let collation = Collation::root()?;
            match sort {
                Sort::Asc => records.sort_by(|a, b| collation.compare(a.sort_key(), b.sort_key())),
                Sort::Desc => records.sort_by(|a, b| collation.compare(b.sort_key(), a.sort_key())),
            }
        }
        Ok(records)
    }
}
