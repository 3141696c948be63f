//! One-shot CSV import into the shelter collection.
//!
//! # Responsibility
//! - Parse the outcomes CSV into typed, normalized rows.
//! - Replace the collection contents with those rows.
//!
//! # Invariants
//! - File parsing finishes before any storage call is made.
//! - Missing cells are stored as empty strings, never as `NaN`/`null` tokens.
//! - The collection is cleared unconditionally before inserting.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

mod import;
mod table;

pub use import::{
    clear_collection, format_sample, import_table, insert_table, summarize, ImportSummary,
    DEFAULT_CSV_FILE,
};
pub use table::{read_table, read_table_from_reader, ColumnKind, CsvConfig, Table};

pub type LoadResult<T> = Result<T, LoadError>;

#[derive(Debug)]
pub enum LoadError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Csv(csv::Error),
    /// Input had no header row.
    EmptyInput,
    /// A data row carried more cells than there are headers.
    RaggedRow {
        line: u64,
        expected: usize,
        found: usize,
    },
    Db(DbError),
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read `{}`: {source}", path.display())
            }
            Self::Csv(err) => write!(f, "{err}"),
            Self::EmptyInput => write!(f, "no columns to parse from file"),
            Self::RaggedRow {
                line,
                expected,
                found,
            } => write!(f, "line {line}: expected {expected} fields, saw {found}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv(err) => Some(err),
            Self::EmptyInput | Self::RaggedRow { .. } => None,
            Self::Db(err) => Some(err),
        }
    }
}

impl From<csv::Error> for LoadError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<DbError> for LoadError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}
