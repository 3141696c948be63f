//! CSV parsing into a typed, normalized in-memory table.
//!
//! # Invariants
//! - Every row has exactly one cell per header.
//! - A column is numeric only when all of its present cells parse as such.
//! - An integer column with any missing cell is stored as `Double`.
//! - Missing cells become `""` regardless of column type.

use super::{LoadError, LoadResult};
use csv::{ReaderBuilder, StringRecord};
use log::info;
use mongodb::bson::{Bson, Document};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Cell spellings read as "no value".
const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// CSV parser configuration.
#[derive(Debug, Clone)]
pub struct CsvConfig {
    /// Field delimiter (default: b',').
    pub delimiter: u8,
    /// Whether the first row names the columns.
    pub has_headers: bool,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_headers: true,
        }
    }
}

/// Value type inferred for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    Text,
}

/// Parsed CSV contents.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    kinds: Vec<ColumnKind>,
    rows: Vec<Vec<Bson>>,
}

impl Table {
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn column_kinds(&self) -> &[ColumnKind] {
        &self.kinds
    }

    pub fn rows(&self) -> &[Vec<Bson>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One document per row, fields in header order.
    pub fn to_documents(&self) -> Vec<Document> {
        self.rows
            .iter()
            .map(|row| {
                let mut document = Document::new();
                for (header, value) in self.headers.iter().zip(row) {
                    document.insert(header.clone(), value.clone());
                }
                document
            })
            .collect()
    }
}

/// Reads and normalizes the CSV file at `path`.
pub fn read_table(path: impl AsRef<Path>, config: &CsvConfig) -> LoadResult<Table> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let table = read_table_from_reader(file, config)?;
    info!(
        "event=table_read module=loader status=ok rows={} columns={}",
        table.len(),
        table.headers().len()
    );
    Ok(table)
}

/// Reads and normalizes CSV data from any reader.
pub fn read_table_from_reader<R: Read>(reader: R, config: &CsvConfig) -> LoadResult<Table> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(config.delimiter)
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    for record in csv_reader.records() {
        records.push(record?);
    }

    let mut records = records.into_iter();
    let headers = if config.has_headers {
        let first = records.next().ok_or(LoadError::EmptyInput)?;
        unique_headers(&first)
    } else {
        let width = records
            .as_slice()
            .iter()
            .map(StringRecord::len)
            .max()
            .ok_or(LoadError::EmptyInput)?;
        (0..width).map(|index| index.to_string()).collect()
    };

    let mut cells: Vec<Vec<Option<String>>> = Vec::new();
    for record in records {
        if record.len() > headers.len() {
            return Err(LoadError::RaggedRow {
                line: record.position().map_or(0, |position| position.line()),
                expected: headers.len(),
                found: record.len(),
            });
        }
        let mut row: Vec<Option<String>> = record
            .iter()
            .map(|cell| (!is_missing(cell)).then(|| cell.to_string()))
            .collect();
        row.resize(headers.len(), None);
        cells.push(row);
    }

    let kinds: Vec<ColumnKind> = (0..headers.len())
        .map(|column| {
            let kind = infer_kind(cells.iter().filter_map(|row| row[column].as_deref()));
            // An integer column with a gap widens to floats.
            if kind == ColumnKind::Integer && cells.iter().any(|row| row[column].is_none()) {
                ColumnKind::Float
            } else {
                kind
            }
        })
        .collect();

    let rows = cells
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&kinds)
                .map(|(cell, kind)| typed_value(cell, *kind))
                .collect()
        })
        .collect();

    Ok(Table {
        headers,
        kinds,
        rows,
    })
}

/// Whether a raw cell stands for "no value".
pub(crate) fn is_missing(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell)
}

fn unique_headers(record: &StringRecord) -> Vec<String> {
    let mut headers: Vec<String> = Vec::with_capacity(record.len());
    for (index, raw) in record.iter().enumerate() {
        let raw = if index == 0 {
            raw.trim_start_matches('\u{feff}')
        } else {
            raw
        };
        let base = if raw.is_empty() {
            format!("Unnamed: {index}")
        } else {
            raw.to_string()
        };

        let mut name = base.clone();
        let mut suffix = 1;
        while headers.contains(&name) {
            name = format!("{base}.{suffix}");
            suffix += 1;
        }
        headers.push(name);
    }
    headers
}

fn infer_kind<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut kind = ColumnKind::Integer;
    let mut seen_value = false;
    for cell in cells {
        seen_value = true;
        let trimmed = cell.trim();
        if kind == ColumnKind::Integer && trimmed.parse::<i64>().is_ok() {
            continue;
        }
        if is_float(trimmed) {
            kind = ColumnKind::Float;
            continue;
        }
        return ColumnKind::Text;
    }

    if seen_value {
        kind
    } else {
        ColumnKind::Text
    }
}

fn is_float(value: &str) -> bool {
    value.bytes().any(|byte| byte.is_ascii_digit()) && value.parse::<f64>().is_ok()
}

fn typed_value(cell: Option<String>, kind: ColumnKind) -> Bson {
    let Some(raw) = cell else {
        return Bson::String(String::new());
    };
    match kind {
        ColumnKind::Integer => raw
            .trim()
            .parse::<i64>()
            .map_or_else(|_| Bson::String(raw.clone()), Bson::Int64),
        ColumnKind::Float => raw
            .trim()
            .parse::<f64>()
            .map_or_else(|_| Bson::String(raw.clone()), Bson::Double),
        ColumnKind::Text => Bson::String(raw),
    }
}
