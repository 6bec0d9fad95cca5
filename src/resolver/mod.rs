//! Relation resolver boundary
//!
//! The engine does not own storage. The lookup stage and the `Aggregation`
//! entry point reach other collections only through [`RelationResolver`],
//! which the caller injects. [`MemoryCatalog`] is the in-process
//! implementation used by the CLI and tests.

mod errors;
mod memory;
mod relation;

pub use errors::{ResolverError, ResolverResult};
pub use memory::{is_valid_collection_name, FindOptions, MemoryCatalog, MemoryCollection};
pub use relation::Relation;

use crate::query::Criteria;
use crate::value::Document;

/// Finds documents in a named collection
pub trait RelationResolver {
    /// Returns every document in `collection` matching `criteria`, in
    /// collection order.
    fn find_in_collection(
        &self,
        collection: &str,
        criteria: &Criteria,
    ) -> ResolverResult<Vec<Document>>;
}

impl<R: RelationResolver + ?Sized> RelationResolver for &R {
    fn find_in_collection(
        &self,
        collection: &str,
        criteria: &Criteria,
    ) -> ResolverResult<Vec<Document>> {
        (**self).find_in_collection(collection, criteria)
    }
}
