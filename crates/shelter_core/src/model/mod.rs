//! Shelter record model.
//!
//! # Responsibility
//! - Define what a well-formed document, patch and projection look like.
//! - Provide canned filters used by shelter dashboards.
//!
//! # Invariants
//! - Records are schemaless BSON documents; only their shape is checked.
//! - Identity (`_id`) is assigned by storage, never by validation.

pub mod document;
pub mod rescue;
