//! Animal record repository.
//!
//! # Responsibility
//! - Provide create/read/update/delete over one bound collection.
//! - Report failures as `RepoError` instead of sentinel values.
//!
//! # Invariants
//! - Write paths validate their arguments before touching storage.
//! - `update` and `delete` affect every matching document, not just one.
//! - "Nothing matched" is a successful empty result, never an error.

use crate::db::DbError;
use crate::model::document::{
    validate_document, validate_patch, validate_projection, DocumentValidationError,
};
use crate::store::{DocumentStore, UpdateOutcome};
use log::debug;
use mongodb::bson::{doc, Bson, Document};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Breeds shown by the dashboard breed chart.
pub const TOP_BREEDS: usize = 20;

/// Repository error separating caller mistakes from infrastructure failures.
#[derive(Debug)]
pub enum RepoError {
    Validation(DocumentValidationError),
    Db(DbError),
}

impl RepoError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Stable label for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Db(_) => "db",
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
        }
    }
}

impl From<DocumentValidationError> for RepoError {
    fn from(value: DocumentValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

/// CRUD repository bound to one store for its whole lifetime.
pub struct AnimalRepository<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> AnimalRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Inserts one document and returns the identifier storage assigned.
    pub fn create(&self, document: &Document) -> RepoResult<Bson> {
        validate_document(document)?;
        let id = self.store.insert_one(document)?;
        debug!("event=animal_create module=repo status=ok");
        Ok(id)
    }

    /// Returns every document matching `filter` (all documents when `None`).
    ///
    /// `projection` selects included or excluded fields.
    pub fn read(
        &self,
        filter: Option<&Document>,
        projection: Option<&Document>,
    ) -> RepoResult<Vec<Document>> {
        if let Some(projection) = projection {
            validate_projection(projection)?;
        }

        let match_all = Document::new();
        let documents = self
            .store
            .find(filter.unwrap_or(&match_all), projection)?;
        debug!(
            "event=animal_read module=repo status=ok returned={}",
            documents.len()
        );
        Ok(documents)
    }

    /// Sets the fields of `patch` on every document matching `filter`.
    ///
    /// Fields not named in `patch` are left untouched.
    pub fn update(&self, filter: &Document, patch: &Document) -> RepoResult<UpdateOutcome> {
        validate_patch(patch)?;
        let outcome = self
            .store
            .update_many(filter, &doc! { "$set": patch.clone() })?;
        debug!(
            "event=animal_update module=repo status=ok matched={} modified={}",
            outcome.matched, outcome.modified
        );
        Ok(outcome)
    }

    /// Removes every document matching `filter` and returns the removed count.
    pub fn delete(&self, filter: &Document) -> RepoResult<u64> {
        let deleted = self.store.delete_many(filter)?;
        debug!("event=animal_delete module=repo status=ok deleted={deleted}");
        Ok(deleted)
    }

    pub fn count(&self, filter: Option<&Document>) -> RepoResult<u64> {
        let match_all = Document::new();
        Ok(self.store.count_documents(filter.unwrap_or(&match_all))?)
    }

    pub fn find_one(&self, filter: Option<&Document>) -> RepoResult<Option<Document>> {
        let match_all = Document::new();
        Ok(self.store.find_one(filter.unwrap_or(&match_all))?)
    }
    /// Returns the `limit` most common breeds with their document counts.
    ///
    /// Most common first; equal counts are ordered by breed name. Documents
    /// without a `breed` field are counted under `""`.
    pub fn breed_counts(&self, limit: usize) -> RepoResult<Vec<(String, u64)>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let pipeline = [
            doc! { "$group": { "_id": "$breed", "count": { "$sum": 1 } } },
            doc! { "$sort": { "count": -1, "_id": 1 } },
            doc! { "$limit": i64::try_from(limit).unwrap_or(i64::MAX) },
        ];
        let groups = self.store.aggregate(&pipeline)?;

        let mut counts = Vec::with_capacity(groups.len());
        for group in &groups {
            counts.push(breed_count(group)?);
        }
        debug!(
            "event=animal_breed_counts module=repo status=ok limit={} returned={}",
            limit,
            counts.len()
        );
        Ok(counts)
    }
}

fn breed_count(group: &Document) -> RepoResult<(String, u64)> {
    let breed = match group.get("_id") {
        Some(Bson::String(name)) => name.clone(),
        None | Some(Bson::Null) => String::new(),
        Some(other) => other.to_string(),
    };
    let count = match group.get("count") {
        Some(Bson::Int32(count)) => u64::try_from(*count).ok(),
        Some(Bson::Int64(count)) => u64::try_from(*count).ok(),
        Some(Bson::Double(count)) if *count >= 0.0 && count.fract() == 0.0 => Some(*count as u64),
        _ => None,
    }
    .ok_or_else(|| DbError::InvalidArgument(format!("malformed breed group {group}")))?;
    Ok((breed, count))
}

#[cfg(test)]
mod tests {
    use super::{breed_count, AnimalRepository, RepoError};
    use crate::store::MemoryStore;
    use mongodb::bson::doc;

    #[test]
    fn error_kind_labels_are_stable() {
        let repo = AnimalRepository::new(MemoryStore::new());

        let validation = repo.create(&doc! { "$where": "1" }).unwrap_err();
        assert_eq!(validation.kind(), "validation");
        assert!(validation.is_validation());

        let db = repo.read(Some(&doc! { "$text": "x" }), None).unwrap_err();
        assert_eq!(db.kind(), "db");
        assert!(matches!(db, RepoError::Db(_)));
    }

    #[test]
    fn breed_count_reads_server_shapes() {
        assert_eq!(
            breed_count(&doc! { "_id": "Beagle", "count": 3_i64 }).unwrap(),
            ("Beagle".to_string(), 3)
        );
        assert_eq!(
            breed_count(&doc! { "_id": null, "count": 2 }).unwrap(),
            (String::new(), 2)
        );
        assert!(breed_count(&doc! { "_id": "Beagle", "count": "many" }).is_err());
    }

    #[test]
    fn validation_failure_never_reaches_store() {
        let repo = AnimalRepository::new(MemoryStore::new());
        repo.create(&doc! { "name": "Rex" }).unwrap();

        let err = repo
            .update(&doc! {}, &doc! { "$unset": { "name": "" } })
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(repo.store().snapshot()[0].get_str("name").unwrap(), "Rex");
    }
}
