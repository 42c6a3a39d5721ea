mod post;
mod todo;

use std::fmt::Debug;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

pub use post::{Post, PostFields};
pub use todo::{Todo, TodoFields};

/// Rejection of a create/update because required input is missing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub &'static str);

/// A record kept in one of the resource collections.
///
/// Both resources share the same lifecycle; what differs is which fields are
/// required, which field `search` looks at and which field `sort` orders by.
pub trait Record: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Request body accepted by create and update.
    type Fields: Debug + DeserializeOwned + Send + 'static;
    /// Validated replacement values for update.
    type Changes: Send;

    /// Display name, e.g. `Todo`.
    const NAME: &'static str;
    /// Singular key: wraps `GET /:id` responses and prefixes disk keys.
    const KEY: &'static str;
    /// Plural name, also the route segment.
    const COLLECTION: &'static str;

    fn id(&self) -> u64;
    fn set_id(&mut self, id: u64);

    /// Builds a new record (id 0) from a create body.
    fn create(fields: Self::Fields) -> Result<Self, ValidationError>;

    /// Checks an update body; every mutable field must be present.
    fn changes(fields: Self::Fields) -> Result<Self::Changes, ValidationError>;

    /// Fully replaces the mutable fields.
    fn apply(&mut self, changes: Self::Changes);

    /// Whether the record passes the `search` filter.
    fn matches(&self, term: &str) -> bool;

    /// Field compared when a sort is requested.
    fn sort_key(&self) -> &str;
}
