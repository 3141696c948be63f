//! Aggregation pipelines for the in-memory store.
//!
//! Stages: `$match`, `$group` (`$sum` accumulator), `$sort`, `$skip`,
//! `$limit` and `$project`. Any other stage or accumulator is reported as
//! unsupported.

use super::query::{compare, lookup, matches, project};
use crate::db::{DbError, DbResult};
use mongodb::bson::{Bson, Document};
use std::cmp::Ordering;

/// Runs `pipeline` over `documents` and returns the final stage output.
pub(crate) fn run(documents: &[Document], pipeline: &[Document]) -> DbResult<Vec<Document>> {
    let mut current = documents.to_vec();
    for stage in pipeline {
        let (name, body) = single_stage(stage)?;
        current = match name {
            "$match" => {
                let filter = stage_document(name, body)?;
                let mut kept = Vec::with_capacity(current.len());
                for document in current {
                    if matches(&document, filter)? {
                        kept.push(document);
                    }
                }
                kept
            }
            "$group" => group(&current, stage_document(name, body)?)?,
            "$sort" => sort(current, stage_document(name, body)?)?,
            "$skip" => {
                let skip = stage_count(name, body, 0)?;
                current.into_iter().skip(skip).collect()
            }
            "$limit" => {
                let limit = stage_count(name, body, 1)?;
                current.truncate(limit);
                current
            }
            "$project" => {
                let projection = stage_document(name, body)?;
                current
                    .iter()
                    .map(|document| project(document, projection))
                    .collect::<DbResult<Vec<_>>>()?
            }
            other => return Err(DbError::UnsupportedOperator(other.to_string())),
        };
    }
    Ok(current)
}

fn single_stage(stage: &Document) -> DbResult<(&str, &Bson)> {
    match (stage.len(), stage.iter().next()) {
        (1, Some((name, body))) => Ok((name.as_str(), body)),
        _ => Err(DbError::InvalidArgument(
            "a pipeline stage must hold exactly one operator".to_string(),
        )),
    }
}

fn stage_document<'a>(stage: &str, body: &'a Bson) -> DbResult<&'a Document> {
    match body {
        Bson::Document(document) => Ok(document),
        _ => Err(DbError::InvalidArgument(format!(
            "{stage} takes a document"
        ))),
    }
}

fn stage_count(stage: &str, body: &Bson, minimum: i64) -> DbResult<usize> {
    let value = match body {
        Bson::Int32(number) => i64::from(*number),
        Bson::Int64(number) => *number,
        Bson::Double(number) if number.fract() == 0.0 => *number as i64,
        _ => {
            return Err(DbError::InvalidArgument(format!(
                "{stage} takes an integer"
            )));
        }
    };
    if value < minimum {
        return Err(DbError::InvalidArgument(format!(
            "{stage} must be at least {minimum}, got {value}"
        )));
    }
    usize::try_from(value)
        .map_err(|_| DbError::InvalidArgument(format!("{stage} value {value} is too large")))
}

/// Running `$sum`. Integer totals stay integral until a double is added.
#[derive(Debug, Clone, Copy, Default)]
struct Sum {
    integer: i64,
    float: f64,
    saw_float: bool,
}

impl Sum {
    fn add(&mut self, value: &Bson) {
        match value {
            Bson::Int32(number) => self.integer = self.integer.saturating_add(i64::from(*number)),
            Bson::Int64(number) => self.integer = self.integer.saturating_add(*number),
            Bson::Double(number) => {
                self.float += number;
                self.saw_float = true;
            }
            // Non-numeric operands are ignored, as the server does.
            _ => {}
        }
    }

    fn into_bson(self) -> Bson {
        if self.saw_float {
            return Bson::Double(self.integer as f64 + self.float);
        }
        match i32::try_from(self.integer) {
            Ok(small) => Bson::Int32(small),
            Err(_) => Bson::Int64(self.integer),
        }
    }
}

/// Groups in first-seen order.
fn group(documents: &[Document], body: &Document) -> DbResult<Vec<Document>> {
    let key_expression = body.get("_id").ok_or_else(|| {
        DbError::InvalidArgument("$group requires an _id expression".to_string())
    })?;

    let mut accumulators: Vec<(&str, &Bson)> = Vec::new();
    for (field, accumulator) in body {
        if field == "_id" {
            continue;
        }
        let Bson::Document(accumulator) = accumulator else {
            return Err(DbError::InvalidArgument(format!(
                "accumulator `{field}` must be a document"
            )));
        };
        match (accumulator.len(), accumulator.iter().next()) {
            (1, Some((operator, operand))) if operator == "$sum" => {
                accumulators.push((field.as_str(), operand));
            }
            (1, Some((operator, _))) => {
                return Err(DbError::UnsupportedOperator(operator.clone()));
            }
            _ => {
                return Err(DbError::InvalidArgument(format!(
                    "accumulator `{field}` must hold exactly one operator"
                )));
            }
        }
    }

    let mut groups: Vec<(Bson, Vec<Sum>)> = Vec::new();
    for document in documents {
        let key = evaluate(document, key_expression);
        let index = match groups.iter().position(|(existing, _)| *existing == key) {
            Some(index) => index,
            None => {
                groups.push((key, vec![Sum::default(); accumulators.len()]));
                groups.len() - 1
            }
        };
        for ((_, operand), sum) in accumulators.iter().zip(groups[index].1.iter_mut()) {
            sum.add(&evaluate(document, operand));
        }
    }

    Ok(groups
        .into_iter()
        .map(|(key, sums)| {
            let mut output = Document::new();
            output.insert("_id", key);
            for ((field, _), sum) in accumulators.iter().zip(sums) {
                output.insert(*field, sum.into_bson());
            }
            output
        })
        .collect())
}

/// `"$path"` reads a field (missing reads as null); documents evaluate
/// field by field; anything else is a literal.
fn evaluate(document: &Document, expression: &Bson) -> Bson {
    match expression {
        Bson::String(path) if path.starts_with('$') => lookup(document, &path[1..])
            .cloned()
            .unwrap_or(Bson::Null),
        Bson::Document(fields) => Bson::Document(
            fields
                .iter()
                .map(|(field, inner)| (field.clone(), evaluate(document, inner)))
                .collect(),
        ),
        literal => literal.clone(),
    }
}

/// Stable multi-key sort; missing fields sort as null.
fn sort(mut documents: Vec<Document>, body: &Document) -> DbResult<Vec<Document>> {
    if body.is_empty() {
        return Err(DbError::InvalidArgument(
            "$sort needs at least one field".to_string(),
        ));
    }

    let mut keys: Vec<(&str, bool)> = Vec::with_capacity(body.len());
    for (field, direction) in body {
        let descending = match direction {
            Bson::Int32(1) | Bson::Int64(1) => false,
            Bson::Int32(-1) | Bson::Int64(-1) => true,
            Bson::Double(value) if *value == 1.0 => false,
            Bson::Double(value) if *value == -1.0 => true,
            _ => {
                return Err(DbError::InvalidArgument(format!(
                    "$sort direction for `{field}` must be 1 or -1"
                )));
            }
        };
        keys.push((field.as_str(), descending));
    }

    documents.sort_by(|left, right| {
        for (field, descending) in &keys {
            let ordering = sort_order(lookup(left, field), lookup(right, field));
            if ordering != Ordering::Equal {
                return if *descending {
                    ordering.reverse()
                } else {
                    ordering
                };
            }
        }
        Ordering::Equal
    });
    Ok(documents)
}

fn sort_order(left: Option<&Bson>, right: Option<&Bson>) -> Ordering {
    let left = left.unwrap_or(&Bson::Null);
    let right = right.unwrap_or(&Bson::Null);
    type_rank(left)
        .cmp(&type_rank(right))
        .then_with(|| compare(left, right).unwrap_or(Ordering::Equal))
}

/// Cross-type ordering used by the server's sort.
fn type_rank(value: &Bson) -> u8 {
    match value {
        Bson::Null | Bson::Undefined => 0,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) => 1,
        Bson::String(_) | Bson::Symbol(_) => 2,
        Bson::Document(_) => 3,
        Bson::Array(_) => 4,
        Bson::Binary(_) => 5,
        Bson::ObjectId(_) => 6,
        Bson::Boolean(_) => 7,
        Bson::DateTime(_) => 8,
        Bson::Timestamp(_) => 9,
        Bson::RegularExpression(_) => 10,
        _ => 11,
    }
}
