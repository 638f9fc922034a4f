//! Storage backends — the seam between the client and the store.
//!
//! The client only ever talks to a [`DocumentBackend`]. [`MongoBackend`] wraps
//! the MongoDB driver; [`InMemoryBackend`] keeps collections in process and
//! is what the test suite runs against.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;

use crate::{DbError, Document};

pub use memory::InMemoryBackend;
pub use mongo::MongoBackend;

/// Equality-predicate access to named collections.
///
/// A document matches a filter when every field of the filter is present in
/// the document with an equal value. An empty filter matches everything.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// All matching documents, in the store's enumeration order.
    async fn find(&self, collection: &str, filter: &Document) -> Result<Vec<Document>, DbError>;

    /// The first matching document, if any.
    async fn find_first(
        &self,
        collection: &str,
        filter: &Document,
    ) -> Result<Option<Document>, DbError>;

    async fn insert_one(&self, collection: &str, document: Document) -> Result<(), DbError>;

    /// Overwrite the top-level `fields` of the first matching document.
    ///
    /// Returns the number of documents matched (0 or 1).
    async fn update_first(
        &self,
        collection: &str,
        filter: &Document,
        fields: &Document,
    ) -> Result<u64, DbError>;
}
