//! Technical location enrichment.
//!
//! Joins status, network topology, operational flag and zoned partner from
//! the technical locations file, matching the node column against the
//! location id.

use super::{
    Enricher, EnrichmentOutcome, ReferenceIndex, degrade, left_join, load_reference,
    require_columns,
};
use crate::config::EtlConfig;
use crate::constants::NODE_COLUMN;
use crate::constants::location::{DESCRIPTIVE_COLUMNS, ID_COLUMN, OUTPUT_COLUMNS};
use crate::error::{EtlError, Result};
use crate::table::{has_column, text_values};

use polars::prelude::DataFrame;
use std::path::PathBuf;
use tracing::info;

const SOURCE_NAME: &str = "technical locations";

#[derive(Debug, Clone)]
pub struct TechnicalLocationEnricher {
    path: PathBuf,
    config: EtlConfig,
}

impl TechnicalLocationEnricher {
    pub fn new(path: impl Into<PathBuf>, config: &EtlConfig) -> Self {
        Self {
            path: path.into(),
            config: config.clone(),
        }
    }

    fn try_enrich(&self, data: &DataFrame) -> Result<DataFrame> {
        let reference = load_reference(&self.path, &self.config, |h| h.trim().to_uppercase())?;

        let mut required = vec![ID_COLUMN];
        required.extend_from_slice(DESCRIPTIVE_COLUMNS);
        require_columns(&reference, &required, SOURCE_NAME)?;

        let keys = text_values(&reference, ID_COLUMN)?;
        let index = ReferenceIndex::build(&reference, keys, DESCRIPTIVE_COLUMNS)?;
        info!(
            "Technical locations {}: {} rows, {} distinct ids",
            self.path.display(),
            reference.height(),
            index.len()
        );

        left_join(data, NODE_COLUMN, &index, OUTPUT_COLUMNS)
    }
}

impl Enricher for TechnicalLocationEnricher {
    fn name(&self) -> &'static str {
        "Technical locations"
    }

    fn output_columns(&self) -> &'static [&'static str] {
        OUTPUT_COLUMNS
    }

    fn enrich(&self, data: &DataFrame) -> EnrichmentOutcome {
        // No node column: skip the reference read entirely
        if !has_column(data, NODE_COLUMN) {
            let reason = EtlError::MissingJoinKey {
                column: NODE_COLUMN.to_string(),
            };
            return degrade(data, OUTPUT_COLUMNS, reason.to_string());
        }

        match self.try_enrich(data) {
            Ok(table) => EnrichmentOutcome::Enriched(table),
            Err(e) => degrade(data, OUTPUT_COLUMNS, e.to_string()),
        }
    }
}
