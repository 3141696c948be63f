//! MongoDB connection settings and bootstrap entry points.
//!
//! # Responsibility
//! - Describe where the shelter collection lives (`DbConfig`).
//! - Open a verified collection handle for the storage layer.
//!
//! # Invariants
//! - `DbConfig::default()` always points at the local unauthenticated
//!   server: `localhost:27017`, database `AAC`, collection `animals`.
//! - No process-wide client exists; every caller owns its handle.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;

pub use open::open_collection;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 27017;
pub const DEFAULT_DATABASE: &str = "AAC";
pub const DEFAULT_COLLECTION: &str = "animals";

pub type DbResult<T> = Result<T, DbError>;

/// Storage-layer error shared by every `DocumentStore` implementation.
#[derive(Debug)]
pub enum DbError {
    /// Driver, network or server-side failure.
    Mongo(mongodb::error::Error),
    /// The request was rejected before reaching storage.
    InvalidArgument(String),
    /// Query or update operator the in-memory store does not evaluate.
    UnsupportedOperator(String),
    /// Insert collided with an existing `_id`.
    DuplicateKey(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mongo(err) => write!(f, "{err}"),
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::UnsupportedOperator(operator) => {
                write!(f, "unsupported operator `{operator}`")
            }
            Self::DuplicateKey(id) => write!(f, "duplicate key: _id {id} already exists"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Mongo(err) => Some(err),
            Self::InvalidArgument(_) | Self::UnsupportedOperator(_) | Self::DuplicateKey(_) => {
                None
            }
        }
    }
}

impl From<mongodb::error::Error> for DbError {
    fn from(value: mongodb::error::Error) -> Self {
        Self::Mongo(value)
    }
}

/// Location of the shelter collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub collection: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }
}

impl DbConfig {
    /// Connection string understood by the MongoDB driver.
    pub fn uri(&self) -> String {
        format!("mongodb://{}:{}", self.host, self.port)
    }

    /// `database.collection`, as used in log lines.
    pub fn namespace(&self) -> String {
        format!("{}.{}", self.database, self.collection)
    }
}

/// Login placeholder.
///
/// Accepted for API compatibility with authenticated deployments; the local
/// server runs without authentication so the values are never sent.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{Credentials, DbConfig, DbError};

    #[test]
    fn default_config_points_at_local_server() {
        let config = DbConfig::default();
        assert_eq!(config.uri(), "mongodb://localhost:27017");
        assert_eq!(config.namespace(), "AAC.animals");
    }

    #[test]
    fn config_deserializes_with_missing_fields_defaulted() {
        let config: DbConfig = serde_json::from_str(r#"{"port": 27018}"#).unwrap();
        assert_eq!(config.port, 27018);
        assert_eq!(config.host, "localhost");
        assert_eq!(config.collection, "animals");
    }

    #[test]
    fn credentials_debug_hides_password() {
        let credentials = Credentials::new("aacuser", "hunter2");
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("aacuser"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn duplicate_key_message_names_id() {
        let err = DbError::DuplicateKey("42".to_string());
        assert_eq!(err.to_string(), "duplicate key: _id 42 already exists");
    }
}
