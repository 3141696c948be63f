//! Repository layer over the shelter collection.
//!
//! # Responsibility
//! - Define the typed CRUD contract used by every caller.
//! - Isolate storage details behind the `DocumentStore` seam.
//!
//! # Invariants
//! - Arguments are validated before any storage call.
//! - Validation failures and storage failures stay distinguishable.

pub mod animal_repo;
