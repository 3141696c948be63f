//! Query-language evaluation for the in-memory store.
//!
//! # Responsibility
//! - Match documents against MongoDB-style filter documents.
//! - Apply inclusion/exclusion projections and `$set` updates.
//!
//! # Invariants
//! - Unknown operators are reported, never silently treated as "match".
//! - Numeric values compare across `Int32`/`Int64`/`Double`.
//! - Comparisons across type brackets never match.

use crate::db::{DbError, DbResult};
use mongodb::bson::{Bson, Document, Regex as BsonRegex};
use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;

/// Returns whether `document` satisfies every clause of `filter`.
pub(crate) fn matches(document: &Document, filter: &Document) -> DbResult<bool> {
    for (key, condition) in filter {
        let matched = match key.as_str() {
            "$and" => {
                let mut all = true;
                for clause in clauses(key, condition)? {
                    if !matches(document, clause)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            "$or" => any_clause(document, key, condition)?,
            "$nor" => !any_clause(document, key, condition)?,
            other if other.starts_with('$') => {
                return Err(DbError::UnsupportedOperator(other.to_string()));
            }
            path => field_matches(lookup(document, path), condition)?,
        };

        if !matched {
            return Ok(false);
        }
    }

    Ok(true)
}

fn any_clause(document: &Document, operator: &str, condition: &Bson) -> DbResult<bool> {
    for clause in clauses(operator, condition)? {
        if matches(document, clause)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn clauses<'a>(operator: &str, condition: &'a Bson) -> DbResult<Vec<&'a Document>> {
    let Bson::Array(items) = condition else {
        return Err(DbError::InvalidArgument(format!(
            "{operator} must be an array"
        )));
    };
    if items.is_empty() {
        return Err(DbError::InvalidArgument(format!(
            "{operator} must be a nonempty array"
        )));
    }

    items
        .iter()
        .map(|item| match item {
            Bson::Document(clause) => Ok(clause),
            _ => Err(DbError::InvalidArgument(format!(
                "{operator} entries must be documents"
            ))),
        })
        .collect()
}

/// Resolves a dotted path through embedded documents.
pub(crate) fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;
    for segment in segments {
        match current {
            Bson::Document(inner) => current = inner.get(segment)?,
            _ => return None,
        }
    }
    Some(current)
}

fn field_matches(value: Option<&Bson>, condition: &Bson) -> DbResult<bool> {
    match condition {
        Bson::Document(operators) if is_operator_document(operators)? => {
            for (operator, operand) in operators {
                if !apply_operator(value, operator, operand, operators)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Bson::RegularExpression(pattern) => {
            let regex = compile(&pattern.pattern, &pattern.options)?;
            Ok(regex_matches(value, &regex))
        }
        literal => Ok(equals(value, literal)),
    }
}

fn is_operator_document(candidate: &Document) -> DbResult<bool> {
    let operator_keys = candidate.keys().filter(|key| key.starts_with('$')).count();
    if operator_keys == 0 {
        return Ok(false);
    }
    if operator_keys != candidate.len() {
        return Err(DbError::InvalidArgument(
            "cannot mix operators and literal fields in one condition".to_string(),
        ));
    }
    Ok(true)
}

fn apply_operator(
    value: Option<&Bson>,
    operator: &str,
    operand: &Bson,
    siblings: &Document,
) -> DbResult<bool> {
    match operator {
        "$eq" => Ok(equals(value, operand)),
        "$ne" => Ok(!equals(value, operand)),
        "$gt" => Ok(compares(value, operand, |ord| ord == Ordering::Greater)),
        "$gte" => Ok(compares(value, operand, |ord| ord != Ordering::Less)),
        "$lt" => Ok(compares(value, operand, |ord| ord == Ordering::Less)),
        "$lte" => Ok(compares(value, operand, |ord| ord != Ordering::Greater)),
        "$in" => in_list(value, operator, operand),
        "$nin" => Ok(!in_list(value, operator, operand)?),
        "$exists" => Ok(truthy(operand) == value.is_some()),
        "$regex" => {
            let (pattern, inline_options) = match operand {
                Bson::String(pattern) => (pattern.as_str(), ""),
                Bson::RegularExpression(regex) => (regex.pattern.as_str(), regex.options.as_str()),
                _ => {
                    return Err(DbError::InvalidArgument(
                        "$regex must be a string or regular expression".to_string(),
                    ));
                }
            };
            let options = match siblings.get("$options") {
                Some(Bson::String(options)) => options.as_str(),
                Some(_) => {
                    return Err(DbError::InvalidArgument(
                        "$options must be a string".to_string(),
                    ));
                }
                None => inline_options,
            };
            let regex = compile(pattern, options)?;
            Ok(regex_matches(value, &regex))
        }
        "$options" => {
            if siblings.contains_key("$regex") {
                Ok(true)
            } else {
                Err(DbError::InvalidArgument(
                    "$options needs a $regex".to_string(),
                ))
            }
        }
        other => Err(DbError::UnsupportedOperator(other.to_string())),
    }
}

fn in_list(value: Option<&Bson>, operator: &str, operand: &Bson) -> DbResult<bool> {
    let Bson::Array(candidates) = operand else {
        return Err(DbError::InvalidArgument(format!("{operator} needs an array")));
    };

    for candidate in candidates {
        let hit = match candidate {
            Bson::RegularExpression(pattern) => {
                regex_matches(value, &compile(&pattern.pattern, &pattern.options)?)
            }
            literal => equals(value, literal),
        };
        if hit {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Equality with MongoDB array semantics: an array field matches when the
/// whole array or any element equals the operand. A missing field equals
/// `null`.
fn equals(value: Option<&Bson>, operand: &Bson) -> bool {
    match value {
        None => matches!(operand, Bson::Null),
        Some(stored @ Bson::Array(items)) => {
            values_equal(stored, operand) || items.iter().any(|item| values_equal(item, operand))
        }
        Some(stored) => values_equal(stored, operand),
    }
}

fn values_equal(left: &Bson, right: &Bson) -> bool {
    match (as_number(left), as_number(right)) {
        (Some(l), Some(r)) => l == r,
        _ => left == right,
    }
}

fn compares(value: Option<&Bson>, operand: &Bson, accept: impl Fn(Ordering) -> bool) -> bool {
    match value {
        None => false,
        Some(Bson::Array(items)) => items
            .iter()
            .any(|item| compare(item, operand).is_some_and(&accept)),
        Some(stored) => compare(stored, operand).is_some_and(accept),
    }
}

pub(crate) fn compare(left: &Bson, right: &Bson) -> Option<Ordering> {
    if let (Some(l), Some(r)) = (as_number(left), as_number(right)) {
        return l.partial_cmp(&r);
    }
    match (left, right) {
        (Bson::String(l), Bson::String(r)) => Some(l.cmp(r)),
        (Bson::Boolean(l), Bson::Boolean(r)) => Some(l.cmp(r)),
        (Bson::DateTime(l), Bson::DateTime(r)) => Some(l.cmp(r)),
        (Bson::ObjectId(l), Bson::ObjectId(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(number) => Some(f64::from(*number)),
        Bson::Int64(number) => Some(*number as f64),
        Bson::Double(number) => Some(*number),
        _ => None,
    }
}

fn truthy(value: &Bson) -> bool {
    match value {
        Bson::Boolean(flag) => *flag,
        Bson::Null | Bson::Undefined => false,
        other => as_number(other).map_or(true, |number| number != 0.0),
    }
}

fn compile(pattern: &str, options: &str) -> DbResult<Regex> {
    let mut builder = RegexBuilder::new(pattern);
    for option in options.chars() {
        match option {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            other => {
                return Err(DbError::InvalidArgument(format!(
                    "unsupported regex option `{other}`"
                )));
            }
        };
    }
    builder
        .build()
        .map_err(|err| DbError::InvalidArgument(format!("invalid regex `{pattern}`: {err}")))
}

fn regex_matches(value: Option<&Bson>, regex: &Regex) -> bool {
    match value {
        Some(Bson::String(text)) => regex.is_match(text),
        Some(Bson::Array(items)) => items
            .iter()
            .any(|item| matches!(item, Bson::String(text) if regex.is_match(text))),
        _ => false,
    }
}

/// Shapes a stored document according to a projection.
///
/// Only top-level fields are addressed. `_id` is kept unless explicitly
/// excluded.
pub(crate) fn project(document: &Document, projection: &Document) -> DbResult<Document> {
    if projection.is_empty() {
        return Ok(document.clone());
    }

    let mut keep_id = true;
    let mut included: Vec<&str> = Vec::new();
    let mut excluded: Vec<&str> = Vec::new();
    for (field, flag) in projection {
        let include = projection_flag(field, flag)?;
        if field == "_id" {
            keep_id = include;
        } else if include {
            included.push(field);
        } else {
            excluded.push(field);
        }
    }

    if !included.is_empty() && !excluded.is_empty() {
        return Err(DbError::InvalidArgument(
            "projection cannot mix inclusion and exclusion".to_string(),
        ));
    }

    let mut shaped = Document::new();
    for (field, value) in document {
        let keep = if field == "_id" {
            keep_id
        } else if included.is_empty() {
            !excluded.contains(&field.as_str())
        } else {
            included.contains(&field.as_str())
        };
        if keep {
            shaped.insert(field.clone(), value.clone());
        }
    }
    Ok(shaped)
}

fn projection_flag(field: &str, flag: &Bson) -> DbResult<bool> {
    match flag {
        Bson::Boolean(include) => Ok(*include),
        other => as_number(other).map(|number| number != 0.0).ok_or_else(|| {
            DbError::InvalidArgument(format!(
                "projection value for `{field}` must be a number or boolean"
            ))
        }),
    }
}

/// Applies an operator update to `document` in place.
///
/// Returns whether any stored value changed. The document is left untouched
/// when the update is rejected.
pub(crate) fn apply_update(document: &mut Document, update: &Document) -> DbResult<bool> {
    if update.is_empty() {
        return Err(DbError::InvalidArgument(
            "update document must not be empty".to_string(),
        ));
    }

    let mut staged = document.clone();
    let mut changed = false;
    for (operator, fields) in update {
        match operator.as_str() {
            "$set" => {
                let Bson::Document(fields) = fields else {
                    return Err(DbError::InvalidArgument(
                        "$set must be a document".to_string(),
                    ));
                };
                for (path, value) in fields {
                    if path == "_id" && document.get("_id") != Some(value) {
                        return Err(DbError::InvalidArgument(
                            "field `_id` is immutable".to_string(),
                        ));
                    }
                    changed |= set_path(&mut staged, path, value.clone())?;
                }
            }
            other if other.starts_with('$') => {
                return Err(DbError::UnsupportedOperator(other.to_string()));
            }
            other => {
                return Err(DbError::InvalidArgument(format!(
                    "update requires operators, found field `{other}`"
                )));
            }
        }
    }

    *document = staged;
    Ok(changed)
}

fn set_path(document: &mut Document, path: &str, value: Bson) -> DbResult<bool> {
    match path.split_once('.') {
        None => {
            if document.get(path) == Some(&value) {
                return Ok(false);
            }
            document.insert(path, value);
            Ok(true)
        }
        Some((head, rest)) => {
            if !document.contains_key(head) {
                document.insert(head, Document::new());
            }
            match document.get_mut(head) {
                Some(Bson::Document(inner)) => set_path(inner, rest, value),
                _ => Err(DbError::InvalidArgument(format!(
                    "cannot create field `{rest}` in non-document `{head}`"
                ))),
            }
        }
    }
}

/// Case-insensitive regex literal, as used by filter presets.
pub(crate) fn case_insensitive(pattern: impl Into<String>) -> Bson {
    Bson::RegularExpression(BsonRegex {
        pattern: pattern.into(),
        options: "i".to_string(),
    })
}
