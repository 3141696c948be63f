//! Driver-level document storage seam.
//!
//! # Responsibility
//! - Name the handful of collection calls the repository and loader need.
//! - Keep MongoDB driver types out of the layers above.
//!
//! # Invariants
//! - Every call is synchronous and blocks until the backend answers.
//! - Filters, projections, updates and pipelines use MongoDB query-language
//!   documents.

use crate::db::DbResult;
use mongodb::bson::{Bson, Document};

mod memory;
mod mongo;
mod pipeline;
mod query;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

pub(crate) use query::case_insensitive;

/// Counts reported by a multi-document update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Documents selected by the filter.
    pub matched: u64,
    /// Documents whose stored values actually changed.
    pub modified: u64,
}

/// Collection operations shared by MongoDB and the in-memory backend.
pub trait DocumentStore {
    /// Inserts one document and returns its `_id`.
    fn insert_one(&self, document: &Document) -> DbResult<Bson>;
    /// Inserts all documents in one ordered bulk call; returns inserted count.
    fn insert_many(&self, documents: &[Document]) -> DbResult<u64>;
    /// Returns every matching document, fully materialized.
    fn find(&self, filter: &Document, projection: Option<&Document>) -> DbResult<Vec<Document>>;
    /// Returns the first matching document in natural order.
    fn find_one(&self, filter: &Document) -> DbResult<Option<Document>>;
    fn count_documents(&self, filter: &Document) -> DbResult<u64>;
    /// Applies an operator update (`{"$set": ...}`) to every match.
    fn update_many(&self, filter: &Document, update: &Document) -> DbResult<UpdateOutcome>;
    /// Removes every match and returns the removed count.
    fn delete_many(&self, filter: &Document) -> DbResult<u64>;
    /// Runs an aggregation pipeline and returns every output document.
    fn aggregate(&self, pipeline: &[Document]) -> DbResult<Vec<Document>>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for &S {
    fn insert_one(&self, document: &Document) -> DbResult<Bson> {
        (**self).insert_one(document)
    }

    fn insert_many(&self, documents: &[Document]) -> DbResult<u64> {
        (**self).insert_many(documents)
    }

    fn find(&self, filter: &Document, projection: Option<&Document>) -> DbResult<Vec<Document>> {
        (**self).find(filter, projection)
    }

    fn find_one(&self, filter: &Document) -> DbResult<Option<Document>> {
        (**self).find_one(filter)
    }

    fn count_documents(&self, filter: &Document) -> DbResult<u64> {
        (**self).count_documents(filter)
    }

    fn update_many(&self, filter: &Document, update: &Document) -> DbResult<UpdateOutcome> {
        (**self).update_many(filter, update)
    }

    fn delete_many(&self, filter: &Document) -> DbResult<u64> {
        (**self).delete_many(filter)
    }

    fn aggregate(&self, pipeline: &[Document]) -> DbResult<Vec<Document>> {
        (**self).aggregate(pipeline)
    }
}
