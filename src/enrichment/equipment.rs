//! Equipment master enrichment.
//!
//! Joins manufacturer, family, reference and technology from the equipment
//! master onto the consolidated table, matching the inventory-type column
//! against the master's cleaned key.

use super::{
    Enricher, EnrichmentOutcome, ReferenceIndex, degrade, left_join, load_reference,
    require_columns,
};
use crate::config::EtlConfig;
use crate::constants::INVENTORY_TYPE_COLUMN;
use crate::constants::equipment::{
    COLUMN_RENAMES, DESCRIPTIVE_COLUMNS, KEY_COLUMN, KEY_MARKER, OUTPUT_COLUMNS,
};
use crate::error::{EtlError, Result};
use crate::table::{has_column, text_values};

use polars::prelude::DataFrame;
use std::path::PathBuf;
use tracing::info;

const SOURCE_NAME: &str = "equipment master";

#[derive(Debug, Clone)]
pub struct EquipmentMasterEnricher {
    path: PathBuf,
    config: EtlConfig,
}

impl EquipmentMasterEnricher {
    pub fn new(path: impl Into<PathBuf>, config: &EtlConfig) -> Self {
        Self {
            path: path.into(),
            config: config.clone(),
        }
    }

    fn try_enrich(&self, data: &DataFrame) -> Result<DataFrame> {
        let reference = load_reference(&self.path, &self.config, rename_header)?;

        let mut required = DESCRIPTIVE_COLUMNS.to_vec();
        required.push(KEY_COLUMN);
        require_columns(&reference, &required, SOURCE_NAME)?;

        if !has_column(data, INVENTORY_TYPE_COLUMN) {
            return Err(EtlError::MissingJoinKey {
                column: INVENTORY_TYPE_COLUMN.to_string(),
            });
        }

        let keys = text_values(&reference, KEY_COLUMN)?
            .into_iter()
            .map(|key| key.and_then(|key| clean_key(&key)))
            .collect();
        let index = ReferenceIndex::build(&reference, keys, DESCRIPTIVE_COLUMNS)?;
        info!(
            "Equipment master {}: {} rows, {} distinct keys",
            self.path.display(),
            reference.height(),
            index.len()
        );

        left_join(data, INVENTORY_TYPE_COLUMN, &index, OUTPUT_COLUMNS)
    }
}

impl Enricher for EquipmentMasterEnricher {
    fn name(&self) -> &'static str {
        "Equipment master"
    }

    fn output_columns(&self) -> &'static [&'static str] {
        OUTPUT_COLUMNS
    }

    fn enrich(&self, data: &DataFrame) -> EnrichmentOutcome {
        match self.try_enrich(data) {
            Ok(table) => EnrichmentOutcome::Enriched(table),
            Err(e) => degrade(data, OUTPUT_COLUMNS, e.to_string()),
        }
    }
}

/// Trim and lowercase a master header, then map the known names
fn rename_header(header: &str) -> String {
    let header = header.trim().to_lowercase();
    COLUMN_RENAMES
        .iter()
        .find(|(source, _)| *source == header)
        .map(|(_, target)| target.to_string())
        .unwrap_or(header)
}

/// Strip the key marker and surrounding whitespace; blank keys never match
fn clean_key(key: &str) -> Option<String> {
    let cleaned = key.replace(KEY_MARKER, "");
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}
