//! Connection bootstrap for MongoDB.
//!
//! # Responsibility
//! - Build a synchronous client for the configured location.
//! - Verify the server answers before handing out a collection handle.
//!
//! # Invariants
//! - A returned collection has completed a successful `ping`.

use super::{DbConfig, DbResult};
use log::{error, info};
use mongodb::bson::{doc, Document};
use mongodb::sync::{Client, Collection};
use std::time::Instant;

/// Connects to the configured server and returns the target collection.
///
/// # Side effects
/// - Performs one `ping` round trip.
/// - Emits `db_open` logging events with duration and status.
pub fn open_collection(config: &DbConfig) -> DbResult<Collection<Document>> {
    let started_at = Instant::now();
    info!(
        "event=db_open module=db status=start namespace={}",
        config.namespace()
    );

    let client = match Client::with_uri_str(config.uri()) {
        Ok(client) => client,
        Err(err) => {
            error!(
                "event=db_open module=db status=error duration_ms={} error_code=db_client_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    let database = client.database(&config.database);
    if let Err(err) = database.run_command(doc! { "ping": 1 }).run() {
        error!(
            "event=db_open module=db status=error duration_ms={} error_code=db_ping_failed error={}",
            started_at.elapsed().as_millis(),
            err
        );
        return Err(err.into());
    }

    info!(
        "event=db_open module=db status=ok namespace={} duration_ms={}",
        config.namespace(),
        started_at.elapsed().as_millis()
    );
    Ok(database.collection::<Document>(&config.collection))
}
