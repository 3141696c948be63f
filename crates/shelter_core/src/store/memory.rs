//! In-process document store.
//!
//! # Responsibility
//! - Provide a `DocumentStore` without a running server (tests, dry runs).
//! - Mirror the driver-visible behavior the repository relies on.
//!
//! # Invariants
//! - Natural order is insertion order.
//! - Every stored document carries a unique `_id`, generated when absent.
//! - `insert_many` is ordered: documents before a failing one stay inserted.

use super::pipeline::run as run_pipeline;
use super::query::{apply_update, matches, project};
use super::{DocumentStore, UpdateOutcome};
use crate::db::{DbError, DbResult};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document};
use std::cell::RefCell;

/// Single-threaded in-memory collection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RefCell<Vec<Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `documents`, assigning ids as needed.
    pub fn with_documents(documents: impl IntoIterator<Item = Document>) -> DbResult<Self> {
        let store = Self::new();
        for document in documents {
            store.insert_one(&document)?;
        }
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.documents.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.borrow().is_empty()
    }

    /// Snapshot of every stored document in natural order.
    pub fn snapshot(&self) -> Vec<Document> {
        self.documents.borrow().clone()
    }

    fn insert_into(stored: &mut Vec<Document>, document: &Document) -> DbResult<Bson> {
        let (id, record) = match document.get("_id") {
            Some(id) => (id.clone(), document.clone()),
            None => {
                let id = Bson::ObjectId(ObjectId::new());
                let mut record = Document::new();
                record.insert("_id", id.clone());
                for (field, value) in document {
                    record.insert(field.clone(), value.clone());
                }
                (id, record)
            }
        };

        if stored.iter().any(|existing| existing.get("_id") == Some(&id)) {
            return Err(DbError::DuplicateKey(id.to_string()));
        }

        stored.push(record);
        Ok(id)
    }
}

impl DocumentStore for MemoryStore {
    fn insert_one(&self, document: &Document) -> DbResult<Bson> {
        Self::insert_into(&mut self.documents.borrow_mut(), document)
    }

    fn insert_many(&self, documents: &[Document]) -> DbResult<u64> {
        if documents.is_empty() {
            return Err(DbError::InvalidArgument(
                "insert_many requires at least one document".to_string(),
            ));
        }

        let mut stored = self.documents.borrow_mut();
        let mut inserted = 0;
        for document in documents {
            Self::insert_into(&mut stored, document)?;
            inserted += 1;
        }
        Ok(inserted)
    }

    fn find(&self, filter: &Document, projection: Option<&Document>) -> DbResult<Vec<Document>> {
        let stored = self.documents.borrow();
        let mut found = Vec::new();
        for document in stored.iter() {
            if matches(document, filter)? {
                found.push(match projection {
                    Some(projection) => project(document, projection)?,
                    None => document.clone(),
                });
            }
        }
        Ok(found)
    }

    fn find_one(&self, filter: &Document) -> DbResult<Option<Document>> {
        for document in self.documents.borrow().iter() {
            if matches(document, filter)? {
                return Ok(Some(document.clone()));
            }
        }
        Ok(None)
    }

    fn count_documents(&self, filter: &Document) -> DbResult<u64> {
        let mut count = 0;
        for document in self.documents.borrow().iter() {
            if matches(document, filter)? {
                count += 1;
            }
        }
        Ok(count)
    }

    fn update_many(&self, filter: &Document, update: &Document) -> DbResult<UpdateOutcome> {
        let mut stored = self.documents.borrow_mut();

        // Evaluate every match before writing so a rejected update changes nothing.
        let mut staged = Vec::new();
        for (index, document) in stored.iter().enumerate() {
            if matches(document, filter)? {
                let mut updated = document.clone();
                let changed = apply_update(&mut updated, update)?;
                staged.push((index, updated, changed));
            }
        }

        let mut outcome = UpdateOutcome {
            matched: staged.len() as u64,
            modified: 0,
        };
        for (index, updated, changed) in staged {
            if changed {
                stored[index] = updated;
                outcome.modified += 1;
            }
        }
        Ok(outcome)
    }

    fn delete_many(&self, filter: &Document) -> DbResult<u64> {
        let mut stored = self.documents.borrow_mut();
        let mut verdicts = Vec::with_capacity(stored.len());
        for document in stored.iter() {
            verdicts.push(matches(document, filter)?);
        }

        let before = stored.len();
        let mut verdicts = verdicts.into_iter();
        stored.retain(|_| !verdicts.next().unwrap_or(false));
        Ok((before - stored.len()) as u64)
    }
    fn aggregate(&self, pipeline: &[Document]) -> DbResult<Vec<Document>> {
        run_pipeline(&self.documents.borrow(), pipeline)
    }
}
