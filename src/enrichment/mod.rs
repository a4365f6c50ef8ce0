//! Best-effort enrichment from reference files.
//!
//! Each enricher left-joins descriptive columns from a reference table onto
//! the consolidated table. Enrichment never fails the pipeline: any error
//! yields [`EnrichmentOutcome::Degraded`], carrying the input table with the
//! enricher's output columns appended as nulls, plus the reason.

pub mod equipment;
pub mod location;

pub use equipment::EquipmentMasterEnricher;
pub use location::TechnicalLocationEnricher;

use crate::config::EtlConfig;
use crate::error::{EtlError, Result};
use crate::reader::{ReadOptions, RowPolicy, read_delimited};
use crate::table::{
    TextValues, column_names, frame_from_columns, has_column, null_column, text_column,
    text_values,
};

use polars::prelude::DataFrame;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, warn};

/// Outcome of one enrichment step
#[derive(Debug)]
pub enum EnrichmentOutcome {
    /// Reference columns were joined onto the table
    Enriched(DataFrame),
    /// The join failed; output columns were appended as nulls unless the
    /// reason says they could not be
    Degraded { table: DataFrame, reason: String },
}

impl EnrichmentOutcome {
    pub fn table(&self) -> &DataFrame {
        match self {
            EnrichmentOutcome::Enriched(table) => table,
            EnrichmentOutcome::Degraded { table, .. } => table,
        }
    }

    pub fn into_table(self) -> DataFrame {
        match self {
            EnrichmentOutcome::Enriched(table) => table,
            EnrichmentOutcome::Degraded { table, .. } => table,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, EnrichmentOutcome::Degraded { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            EnrichmentOutcome::Enriched(_) => None,
            EnrichmentOutcome::Degraded { reason, .. } => Some(reason),
        }
    }
}

/// A best-effort join step over the consolidated table
pub trait Enricher {
    /// Human-readable name for reports
    fn name(&self) -> &'static str;

    /// Columns this step appends, in order
    fn output_columns(&self) -> &'static [&'static str];

    /// Run the join; never mutates `data`
    fn enrich(&self, data: &DataFrame) -> EnrichmentOutcome;
}

/// Read a reference file with the configured fixed encoding and delimiter.
///
/// Headers are renamed through `rename_header`; when two headers map to the
/// same name the first one is kept.
pub(crate) fn load_reference(
    path: &Path,
    config: &EtlConfig,
    rename_header: impl Fn(&str) -> String,
) -> Result<DataFrame> {
    let options = ReadOptions {
        encoding: config.resolve_reference_encoding()?,
        delimiter: config.reference_delimiter_byte()?,
        row_policy: RowPolicy::Strict,
    };
    let parsed = read_delimited(path, &options)?;

    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for name in column_names(&parsed.frame) {
        let renamed = rename_header(&name);
        if !seen.insert(renamed.clone()) {
            warn!(
                "Duplicate reference column '{}' in {}, keeping the first",
                renamed,
                path.display()
            );
            continue;
        }
        columns.push((renamed, text_values(&parsed.frame, &name)?));
    }

    debug!(
        "Loaded reference {}: {} rows, {} columns",
        path.display(),
        parsed.frame.height(),
        columns.len()
    );
    frame_from_columns(columns)
}

/// Fail with `MissingColumns` unless every `required` column is present
pub(crate) fn require_columns(table: &DataFrame, required: &[&str], source_name: &str) -> Result<()> {
    let missing: Vec<String> = required
        .iter()
        .filter(|name| !has_column(table, name))
        .map(|name| name.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(EtlError::MissingColumns {
            source_name: source_name.to_string(),
            columns: missing,
        })
    }
}

/// Reference rows keyed by join key, first occurrence wins
#[derive(Debug, Default)]
pub(crate) struct ReferenceIndex {
    rows: HashMap<String, Vec<Option<String>>>,
    width: usize,
}

impl ReferenceIndex {
    /// Index `value_columns` of `reference` by `keys` (one key per row;
    /// null keys are never matched)
    pub(crate) fn build(
        reference: &DataFrame,
        keys: Vec<Option<String>>,
        value_columns: &[&str],
    ) -> Result<Self> {
        let columns = value_columns
            .iter()
            .map(|name| text_values(reference, name))
            .collect::<Result<Vec<_>>>()?;

        let mut rows = HashMap::new();
        for (row, key) in keys.into_iter().enumerate() {
            let Some(key) = key else { continue };
            rows.entry(key)
                .or_insert_with(|| columns.iter().map(|values| values[row].clone()).collect());
        }

        debug!("Indexed {} distinct reference keys", rows.len());
        Ok(Self {
            rows,
            width: value_columns.len(),
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    fn lookup(&self, key: Option<&str>) -> Option<&Vec<Option<String>>> {
        key.and_then(|key| self.rows.get(key))
    }
}

/// Left join: every row of `data` is kept, matched rows get the indexed
/// values under `output_names`, unmatched rows get nulls
pub(crate) fn left_join(
    data: &DataFrame,
    key_column: &str,
    index: &ReferenceIndex,
    output_names: &[&str],
) -> Result<DataFrame> {
    let keys = text_values(data, key_column)?;
    let mut outputs: Vec<TextValues> = vec![Vec::with_capacity(keys.len()); index.width];
    let mut matched = 0;

    for key in &keys {
        match index.lookup(key.as_deref()) {
            Some(values) => {
                matched += 1;
                for (output, value) in outputs.iter_mut().zip(values) {
                    output.push(value.clone());
                }
            }
            None => {
                for output in outputs.iter_mut() {
                    output.push(None);
                }
            }
        }
    }

    debug!(
        "Left join on {}: {} of {} rows matched",
        key_column,
        matched,
        keys.len()
    );

    let mut joined = data.clone();
    for (name, values) in output_names.iter().zip(outputs) {
        joined.with_column(text_column(name, values))?;
    }
    Ok(joined)
}

/// Input table with `columns` appended as nulls
pub(crate) fn append_null_columns(data: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
    let mut table = data.clone();
    for name in columns {
        table.with_column(null_column(name, data.height()))?;
    }
    Ok(table)
}

/// Build the degraded outcome for a failed enrichment
pub(crate) fn degrade(data: &DataFrame, columns: &[&str], reason: String) -> EnrichmentOutcome {
    warn!("Enrichment failed, adding empty columns: {}", reason);
    degraded_outcome(data, append_null_columns(data, columns), reason)
}

/// If the null columns could not be appended the input table is passed on
/// unchanged and the reason says so
fn degraded_outcome(
    data: &DataFrame,
    appended: Result<DataFrame>,
    reason: String,
) -> EnrichmentOutcome {
    match appended {
        Ok(table) => EnrichmentOutcome::Degraded { table, reason },
        Err(e) => {
            warn!("Could not append empty columns: {}", e);
            EnrichmentOutcome::Degraded {
                table: data.clone(),
                reason: format!("{}; empty columns not added: {}", reason, e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    fn data() -> DataFrame {
        frame_from_columns(vec![(
            "KEY".to_string(),
            vec![some("A"), some("B"), None, some("A")],
        )])
        .unwrap()
    }

    fn reference() -> DataFrame {
        frame_from_columns(vec![
            ("ID".to_string(), vec![some("A"), some("A"), some("C")]),
            ("VALUE".to_string(), vec![some("first"), some("second"), some("c")]),
        ])
        .unwrap()
    }

    #[test]
    fn test_load_reference_renames_and_keeps_first_duplicate() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("ref.csv");
        std::fs::write(&path, b" id ;Estado;ID\nN1;Activo;X\n").unwrap();

        let reference =
            load_reference(&path, &EtlConfig::default(), |h| h.trim().to_uppercase()).unwrap();
        assert_eq!(column_names(&reference), vec!["ID", "ESTADO"]);
        assert_eq!(text_values(&reference, "ID").unwrap(), vec![some("N1")]);
    }

    #[test]
    fn test_require_columns_lists_missing() {
        match require_columns(&data(), &["KEY", "A", "B"], "test").unwrap_err() {
            EtlError::MissingColumns { columns, .. } => assert_eq!(columns, vec!["A", "B"]),
            other => panic!("Expected MissingColumns error, got {other:?}"),
        }
        assert!(require_columns(&data(), &["KEY"], "test").is_ok());
    }

    #[test]
    fn test_index_keeps_first_occurrence() {
        let reference = reference();
        let keys = text_values(&reference, "ID").unwrap();
        let index = ReferenceIndex::build(&reference, keys, &["VALUE"]).unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.lookup(Some("A")), Some(&vec![some("first")]));
        assert_eq!(index.lookup(None), None);
    }

    #[test]
    fn test_left_join_preserves_rows_and_order() {
        let reference = reference();
        let keys = text_values(&reference, "ID").unwrap();
        let index = ReferenceIndex::build(&reference, keys, &["VALUE"]).unwrap();

        let joined = left_join(&data(), "KEY", &index, &["OUT_VALUE"]).unwrap();
        assert_eq!(joined.height(), 4);
        assert_eq!(column_names(&joined), vec!["KEY", "OUT_VALUE"]);
        assert_eq!(
            text_values(&joined, "OUT_VALUE").unwrap(),
            vec![some("first"), None, None, some("first")]
        );
    }

    #[test]
    fn test_degrade_appends_null_columns() {
        let outcome = degrade(&data(), &["X", "Y"], "boom".to_string());

        assert!(outcome.is_degraded());
        assert_eq!(outcome.reason(), Some("boom"));
        let table = outcome.table();
        assert_eq!(table.height(), 4);
        assert_eq!(column_names(table), vec!["KEY", "X", "Y"]);
        assert_eq!(
            text_values(table, "Y").unwrap(),
            vec![None, None, None, None]
        );
    }

    #[test]
    fn test_failed_append_is_named_in_reason() {
        let appended = Err(EtlError::Configuration {
            message: "bad".to_string(),
        });
        let outcome = degraded_outcome(&data(), appended, "boom".to_string());

        assert!(outcome.is_degraded());
        assert_eq!(
            outcome.reason(),
            Some("boom; empty columns not added: Configuration error: bad")
        );
        assert_eq!(column_names(outcome.table()), vec!["KEY"]);
    }

    #[test]
    fn test_join_does_not_mutate_input() {
        let input = data();
        let reference = reference();
        let keys = text_values(&reference, "ID").unwrap();
        let index = ReferenceIndex::build(&reference, keys, &["VALUE"]).unwrap();

        let _ = left_join(&input, "KEY", &index, &["OUT_VALUE"]).unwrap();
        assert_eq!(column_names(&input), vec!["KEY"]);
    }
}
