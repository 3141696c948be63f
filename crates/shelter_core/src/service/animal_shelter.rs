//! Dashboard-facing CRUD facade.
//!
//! # Responsibility
//! - Expose create/read/update/delete with "safe default" results.
//! - Log every swallowed failure with its kind.
//!
//! # Invariants
//! - No operation panics or returns an error to the caller once connected.
//! - Failure results are `false`, `0` or an empty list.
//! - Callers needing to tell failures apart use `repository()`.

use crate::db::{Credentials, DbConfig, DbResult};
use crate::model::rescue::RescueType;
use crate::repo::animal_repo::{AnimalRepository, RepoError};
use crate::store::{DocumentStore, MongoStore};
use log::{error, info};
use mongodb::bson::{Bson, Document};

/// CRUD facade over the shelter collection.
pub struct AnimalShelter<S: DocumentStore> {
    repo: AnimalRepository<S>,
    credentials: Option<Credentials>,
}

impl AnimalShelter<MongoStore> {
    /// Connects to the default local collection.
    pub fn connect(credentials: Option<Credentials>) -> DbResult<Self> {
        Self::connect_with(&DbConfig::default(), credentials)
    }

    /// Connects to the collection described by `config`.
    ///
    /// `credentials` are kept for the handle's lifetime but not sent; the
    /// target server runs unauthenticated.
    pub fn connect_with(config: &DbConfig, credentials: Option<Credentials>) -> DbResult<Self> {
        let store = MongoStore::open(config)?;
        info!(
            "event=shelter_connect module=service status=ok namespace={} with_credentials={}",
            config.namespace(),
            credentials.is_some()
        );
        Ok(Self::with_credentials(store, credentials))
    }
}

impl<S: DocumentStore> AnimalShelter<S> {
    pub fn new(store: S) -> Self {
        Self::with_credentials(store, None)
    }

    pub fn with_credentials(store: S, credentials: Option<Credentials>) -> Self {
        Self {
            repo: AnimalRepository::new(store),
            credentials,
        }
    }

    /// Strict repository for callers that must distinguish failures.
    pub fn repository(&self) -> &AnimalRepository<S> {
        &self.repo
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Inserts `document`; `true` when storage assigned an identifier.
    pub fn create(&self, document: &Document) -> bool {
        match self.repo.create(document) {
            Ok(id) => !matches!(id, Bson::Null),
            Err(err) => {
                log_failure("create", &err);
                false
            }
        }
    }

    /// Returns matching documents, or an empty list on any failure.
    pub fn read(&self, filter: Option<&Document>, projection: Option<&Document>) -> Vec<Document> {
        self.repo.read(filter, projection).unwrap_or_else(|err| {
            log_failure("read", &err);
            Vec::new()
        })
    }

    /// Sets `patch` on all matches and returns the modified count.
    pub fn update(&self, filter: &Document, patch: &Document) -> u64 {
        match self.repo.update(filter, patch) {
            Ok(outcome) => outcome.modified,
            Err(err) => {
                log_failure("update", &err);
                0
            }
        }
    }

    /// Removes all matches and returns the deleted count.
    pub fn delete(&self, filter: &Document) -> u64 {
        self.repo.delete(filter).unwrap_or_else(|err| {
            log_failure("delete", &err);
            0
        })
    }

    /// Dogs fitting the given rescue-training profile.
    pub fn rescue_candidates(&self, kind: RescueType) -> Vec<Document> {
        self.read(Some(&kind.filter()), None)
    }

    /// Most common breeds and their counts; empty on any failure.
    pub fn breed_counts(&self, limit: usize) -> Vec<(String, u64)> {
        self.repo.breed_counts(limit).unwrap_or_else(|err| {
            log_failure("breed_counts", &err);
            Vec::new()
        })
    }
}

fn log_failure(operation: &str, err: &RepoError) {
    error!(
        "event=animal_{} module=service status=error error_kind={} error={}",
        operation,
        err.kind(),
        err
    );
}
