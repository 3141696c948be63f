//! Caller-facing services.
//!
//! # Responsibility
//! - Offer the dashboard-style API over the repository.
//! - Keep storage selection out of caller code.

pub mod animal_shelter;
