//! Data access and import for the animal-shelter outcomes collection.
//! This crate owns every read and write made against that collection.

pub mod db;
pub mod loader;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use db::{Credentials, DbConfig, DbError, DbResult};
pub use loader::{
    import_table, read_table, CsvConfig, ImportSummary, LoadError, LoadResult, Table,
    DEFAULT_CSV_FILE,
};
pub use logging::{
    default_log_level, init_console_logging, init_logging, logging_status, LogLevel, LogTarget,
    LoggingError,
};
pub use model::document::DocumentValidationError;
pub use model::rescue::{RescueType, UnknownRescueType};
pub use mongodb::bson::{self, doc, Bson, Document};
pub use repo::animal_repo::{AnimalRepository, RepoError, RepoResult, TOP_BREEDS};
pub use service::animal_shelter::AnimalShelter;
pub use store::{DocumentStore, MemoryStore, MongoStore, UpdateOutcome};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
