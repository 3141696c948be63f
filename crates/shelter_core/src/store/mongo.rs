//! MongoDB-backed document store.

use super::{DocumentStore, UpdateOutcome};
use crate::db::{open_collection, DbConfig, DbError, DbResult};
use mongodb::bson::{Bson, Document};
use mongodb::sync::Collection;

/// Store bound to one MongoDB collection for its whole lifetime.
pub struct MongoStore {
    collection: Collection<Document>,
}

impl MongoStore {
    /// Connects to the configured server and binds the target collection.
    pub fn open(config: &DbConfig) -> DbResult<Self> {
        Ok(Self::from_collection(open_collection(config)?))
    }

    /// Wraps an already-open collection handle.
    pub fn from_collection(collection: Collection<Document>) -> Self {
        Self { collection }
    }

    pub fn namespace(&self) -> String {
        self.collection.namespace().to_string()
    }
}

impl DocumentStore for MongoStore {
    fn insert_one(&self, document: &Document) -> DbResult<Bson> {
        let result = self.collection.insert_one(document).run()?;
        Ok(result.inserted_id)
    }

    fn insert_many(&self, documents: &[Document]) -> DbResult<u64> {
        if documents.is_empty() {
            return Err(DbError::InvalidArgument(
                "insert_many requires at least one document".to_string(),
            ));
        }
        let result = self.collection.insert_many(documents).run()?;
        Ok(result.inserted_ids.len() as u64)
    }

    fn find(&self, filter: &Document, projection: Option<&Document>) -> DbResult<Vec<Document>> {
        let mut action = self.collection.find(filter.clone());
        if let Some(projection) = projection {
            action = action.projection(projection.clone());
        }

        let mut documents = Vec::new();
        for document in action.run()? {
            documents.push(document?);
        }
        Ok(documents)
    }

    fn find_one(&self, filter: &Document) -> DbResult<Option<Document>> {
        Ok(self.collection.find_one(filter.clone()).run()?)
    }

    fn count_documents(&self, filter: &Document) -> DbResult<u64> {
        Ok(self.collection.count_documents(filter.clone()).run()?)
    }

    fn update_many(&self, filter: &Document, update: &Document) -> DbResult<UpdateOutcome> {
        let result = self
            .collection
            .update_many(filter.clone(), update.clone())
            .run()?;
        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    fn delete_many(&self, filter: &Document) -> DbResult<u64> {
        let result = self.collection.delete_many(filter.clone()).run()?;
        Ok(result.deleted_count)
    }

    fn aggregate(&self, pipeline: &[Document]) -> DbResult<Vec<Document>> {
        let mut documents = Vec::new();
        for document in self.collection.aggregate(pipeline.to_vec()).run()? {
            documents.push(document?);
        }
        Ok(documents)
    }
}
