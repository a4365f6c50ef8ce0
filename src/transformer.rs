//! Schema reconciliation of extracted tables.
//!
//! Concatenates every extracted table into one, normalizes column names,
//! drops fully empty rows and positional `Unnamed` columns, then resolves
//! each canonical column from its synonyms and keeps only the canonical
//! columns that were found.

use crate::constants::{CANONICAL_SCHEMA, UNNAMED_PREFIX};
use crate::error::{EtlError, Result};
use crate::models::TransformReport;
use crate::table::{TextValues, column_names, frame_from_columns, text_values};

use polars::prelude::DataFrame;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use tracing::{debug, info, warn};
use unicode_normalization::UnicodeNormalization;

static UNNAMED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^{}", UNNAMED_PREFIX)).expect("static pattern is valid")
});

/// Strip diacritics (NFKD, non-ASCII removed), uppercase and trim
pub fn normalize_column_name(name: &str) -> String {
    let ascii: String = name.nfkd().filter(char::is_ascii).collect();
    ascii.to_uppercase().trim().to_string()
}

/// Consolidated table and the report describing it
#[derive(Debug)]
pub struct Transformed {
    pub table: DataFrame,
    pub report: TransformReport,
}

/// One canonical column with its normalized synonyms in priority order
#[derive(Debug, Clone)]
struct CanonicalColumn {
    name: &'static str,
    synonyms: Vec<String>,
}

/// Transformer reconciling source headers onto the canonical schema
#[derive(Debug, Clone)]
pub struct Transformer {
    schema: Vec<CanonicalColumn>,
}

impl Default for Transformer {
    fn default() -> Self {
        Self::new()
    }
}

impl Transformer {
    pub fn new() -> Self {
        let schema = CANONICAL_SCHEMA
            .iter()
            .map(|&(name, synonyms)| CanonicalColumn {
                name,
                synonyms: synonyms.iter().map(|s| normalize_column_name(s)).collect(),
            })
            .collect();
        Self { schema }
    }

    /// Consolidate `tables` into one canonical table
    pub fn transform(&self, tables: &[DataFrame]) -> Result<Transformed> {
        if tables.is_empty() {
            return Err(EtlError::NoInputData);
        }

        let original_rows: usize = tables.iter().map(|t| t.height()).sum();
        let combined = concatenate(tables)?;
        let combined_rows = combined.rows;
        let original_columns = combined.names.clone();

        debug!(
            "Concatenated {} tables: {} rows, {} columns",
            tables.len(),
            combined_rows,
            original_columns.len()
        );

        let mut columns = drop_empty_rows(combined);

        columns
            .names_and_values
            .retain(|(name, _)| !UNNAMED_PATTERN.is_match(name));

        let present: HashSet<&str> = columns
            .names_and_values
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();

        let mut renames: Vec<(String, String)> = Vec::new();
        let mut missing = Vec::new();
        for canonical in &self.schema {
            match canonical
                .synonyms
                .iter()
                .find(|synonym| present.contains(synonym.as_str()))
            {
                Some(source) => renames.push((source.clone(), canonical.name.to_string())),
                None => missing.push(canonical.name.to_string()),
            }
        }

        let mut by_name: HashMap<String, TextValues> =
            columns.names_and_values.into_iter().collect();
        let mut selected = Vec::with_capacity(renames.len());
        for (source, canonical) in &renames {
            if let Some(values) = by_name.remove(source) {
                selected.push((canonical.clone(), values));
            }
        }

        let table = frame_from_columns(selected)?;

        let renamed_sources: HashSet<&str> = renames.iter().map(|(s, _)| s.as_str()).collect();
        let dropped_columns = original_columns
            .iter()
            .filter(|name| !renamed_sources.contains(name.as_str()))
            .cloned()
            .collect();

        let report = TransformReport {
            original_rows,
            final_rows: table.height(),
            kept_columns: column_names(&table),
            missing_columns: missing,
            renamed_columns: renames,
            original_columns,
            dropped_columns,
            rows_removed: combined_rows.saturating_sub(table.height()),
        };

        info!(
            "Transform complete: {} -> {} rows, {} canonical columns",
            report.original_rows,
            report.final_rows,
            report.kept_columns.len()
        );

        Ok(Transformed { table, report })
    }
}

/// Union of all tables' columns under normalized names
struct Combined {
    names: Vec<String>,
    names_and_values: Vec<(String, TextValues)>,
    rows: usize,
}

/// Stack tables in order; columns missing from a table are null for its
/// rows. Names are normalized per table first, so headers that differ only
/// in case, accents or padding share one column.
fn concatenate(tables: &[DataFrame]) -> Result<Combined> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut names_and_values: Vec<(String, TextValues)> = Vec::new();
    let mut rows = 0;

    for table in tables {
        let height = table.height();
        let mut seen_in_table = HashSet::new();

        for source_name in column_names(table) {
            let name = normalize_column_name(&source_name);
            if !seen_in_table.insert(name.clone()) {
                warn!(
                    "Column '{}' duplicates '{}' after normalization; keeping the first",
                    source_name, name
                );
                continue;
            }

            let slot = *index.entry(name.clone()).or_insert_with(|| {
                names_and_values.push((name.clone(), vec![None; rows]));
                names_and_values.len() - 1
            });
            names_and_values[slot]
                .1
                .extend(text_values(table, &source_name)?);
        }

        rows += height;
        for (_, values) in names_and_values.iter_mut() {
            values.resize(rows, None);
        }
    }

    Ok(Combined {
        names: names_and_values.iter().map(|(n, _)| n.clone()).collect(),
        names_and_values,
        rows,
    })
}

/// Remove rows that are null in every column
fn drop_empty_rows(mut combined: Combined) -> Combined {
    let keep: Vec<bool> = (0..combined.rows)
        .map(|row| {
            combined
                .names_and_values
                .iter()
                .any(|(_, values)| values[row].is_some())
        })
        .collect();

    let kept = keep.iter().filter(|&&k| k).count();
    if kept == combined.rows {
        return combined;
    }

    debug!("Dropping {} empty rows", combined.rows - kept);
    for (_, values) in combined.names_and_values.iter_mut() {
        let mut flags = keep.iter();
        values.retain(|_| *flags.next().unwrap_or(&false));
    }
    combined.rows = kept;
    combined
}
