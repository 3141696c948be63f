//! Shape validation for documents, patches and projections.
//!
//! # Responsibility
//! - Reject arguments the database would refuse or misinterpret.
//! - Keep validation independent from any storage backend.
//!
//! # Invariants
//! - Validation never mutates its input.
//! - Only top-level field names are inspected.

use mongodb::bson::{Bson, Document};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Shape violation found before a request reaches storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentValidationError {
    EmptyPatch,
    EmptyFieldName,
    /// Field names starting with `$` are reserved for operators.
    ReservedFieldName(String),
    /// `_id` cannot be changed once assigned.
    ImmutableField(String),
    InvalidProjectionValue(String),
}

impl Display for DocumentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPatch => write!(f, "update patch must contain at least one field"),
            Self::EmptyFieldName => write!(f, "field names cannot be empty"),
            Self::ReservedFieldName(name) => {
                write!(f, "field name `{name}` is reserved for operators")
            }
            Self::ImmutableField(name) => write!(f, "field `{name}` cannot be updated"),
            Self::InvalidProjectionValue(name) => {
                write!(f, "projection value for `{name}` must be a number or boolean")
            }
        }
    }
}

impl Error for DocumentValidationError {}

/// Validates a document about to be inserted.
///
/// An empty document is valid; storage assigns it an `_id` like any other.
pub fn validate_document(document: &Document) -> Result<(), DocumentValidationError> {
    validate_field_names(document)
}

/// Validates the field map applied through `$set`.
pub fn validate_patch(patch: &Document) -> Result<(), DocumentValidationError> {
    if patch.is_empty() {
        return Err(DocumentValidationError::EmptyPatch);
    }
    validate_field_names(patch)?;
    if patch.contains_key("_id") {
        return Err(DocumentValidationError::ImmutableField("_id".to_string()));
    }
    Ok(())
}

/// Validates an include/exclude projection.
pub fn validate_projection(projection: &Document) -> Result<(), DocumentValidationError> {
    for (field, flag) in projection {
        if field.is_empty() {
            return Err(DocumentValidationError::EmptyFieldName);
        }
        match flag {
            Bson::Boolean(_) | Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) => {}
            _ => {
                return Err(DocumentValidationError::InvalidProjectionValue(
                    field.clone(),
                ));
            }
        }
    }
    Ok(())
}

fn validate_field_names(document: &Document) -> Result<(), DocumentValidationError> {
    for field in document.keys() {
        if field.is_empty() {
            return Err(DocumentValidationError::EmptyFieldName);
        }
        if field.starts_with('$') {
            return Err(DocumentValidationError::ReservedFieldName(field.clone()));
        }
    }
    Ok(())
}
