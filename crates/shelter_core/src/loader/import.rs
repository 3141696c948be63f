//! Collection replacement steps of the import.
//!
//! # Invariants
//! - `clear_collection` runs before `insert_table` inside `import_table`.
//! - Reporting (`summarize`) is best-effort and never fails the import.

use super::{LoadResult, Table};
use crate::store::DocumentStore;
use log::{info, warn};
use mongodb::bson::{Bson, Document};
use std::time::Instant;

/// File read when no path is given.
pub const DEFAULT_CSV_FILE: &str = "aac_shelter_outcomes.csv";

/// What an import did to the collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSummary {
    /// Documents removed by the clear step.
    pub cleared: u64,
    pub inserted: u64,
    /// Collection size after the import; `None` when the count failed.
    pub total: Option<u64>,
    /// Any one stored document, for smoke verification.
    pub sample: Option<Document>,
}

/// Deletes every document in the collection. Irreversible.
pub fn clear_collection<S: DocumentStore>(store: &S) -> LoadResult<u64> {
    let cleared = store.delete_many(&Document::new())?;
    info!("event=collection_clear module=loader status=ok cleared={cleared}");
    Ok(cleared)
}

/// Inserts every table row in one bulk call.
///
/// An empty table performs no storage call.
pub fn insert_table<S: DocumentStore>(store: &S, table: &Table) -> LoadResult<u64> {
    let documents = table.to_documents();
    if documents.is_empty() {
        info!("event=table_insert module=loader status=skipped reason=empty_table");
        return Ok(0);
    }

    let started_at = Instant::now();
    let inserted = store.insert_many(&documents)?;
    info!(
        "event=table_insert module=loader status=ok inserted={} duration_ms={}",
        inserted,
        started_at.elapsed().as_millis()
    );
    Ok(inserted)
}

/// Total count and one sample document; failures are logged and skipped.
pub fn summarize<S: DocumentStore>(store: &S) -> (Option<u64>, Option<Document>) {
    let match_all = Document::new();
    let total = store
        .count_documents(&match_all)
        .map_err(|err| {
            warn!("event=import_summary module=loader status=error step=count error={err}");
        })
        .ok();
    let sample = store
        .find_one(&match_all)
        .map_err(|err| {
            warn!("event=import_summary module=loader status=error step=sample error={err}");
        })
        .ok()
        .flatten();
    (total, sample)
}

/// Replaces the collection contents with `table`.
pub fn import_table<S: DocumentStore>(store: &S, table: &Table) -> LoadResult<ImportSummary> {
    let cleared = clear_collection(store)?;
    let inserted = insert_table(store, table)?;
    let (total, sample) = summarize(store);
    Ok(ImportSummary {
        cleared,
        inserted,
        total,
        sample,
    })
}

/// `key: value` lines for a sample document, skipping `_id`.
pub fn format_sample(document: &Document) -> Vec<String> {
    document
        .iter()
        .filter(|(key, _)| key.as_str() != "_id")
        .map(|(key, value)| match value {
            Bson::String(text) => format!("{key}: {text}"),
            other => format!("{key}: {other}"),
        })
        .collect()
}
