//! Extract, transform, enrich and load orchestration.
//!
//! Runs the stages in order, prints the console report for each one and
//! returns a [`PipelineSummary`]. Only the hard stops (missing source
//! directory, nothing to transform, nothing to save) and genuine internal
//! failures come back as errors; skipped files and degraded enrichment are
//! reported and the run continues.

#[cfg(test)]
pub mod tests;

use crate::config::EtlConfig;
use crate::enrichment::{
    Enricher, EnrichmentOutcome, EquipmentMasterEnricher, TechnicalLocationEnricher,
};
use crate::error::{EtlError, Result};
use crate::extractor::Extractor;
use crate::loader::{Loader, verify_table_columns};
use crate::models::{FileMetadata, LoadReport, TransformReport};
use crate::transformer::Transformer;

use colored::*;
use polars::prelude::DataFrame;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Paths for one run; reference files are optional
#[derive(Debug, Clone, Default)]
pub struct PipelineInputs {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub equipment_master: Option<PathBuf>,
    pub technical_locations: Option<PathBuf>,
}

/// What happened to one enrichment step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentStatus {
    Enriched,
    Degraded(String),
    /// No reference file was given
    Skipped,
}

#[derive(Debug, Clone)]
pub struct EnrichmentSummary {
    pub name: &'static str,
    pub status: EnrichmentStatus,
}

/// Result of a complete run
#[derive(Debug, Clone)]
pub struct PipelineSummary {
    pub files: Vec<FileMetadata>,
    pub transform: TransformReport,
    pub enrichments: Vec<EnrichmentSummary>,
    pub load: LoadReport,
    /// Stored relational columns match the loaded table
    pub columns_verified: bool,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: EtlConfig,
}

impl Pipeline {
    pub fn new(config: EtlConfig) -> Self {
        Self { config }
    }

    /// Run every stage against `inputs`
    pub fn run(&self, inputs: &PipelineInputs) -> Result<PipelineSummary> {
        let start_time = Instant::now();
        self.config.validate()?;

        println!("{}", "Starting work order consolidation".bright_green().bold());
        println!("  {} {}", "Source:".bright_cyan(), inputs.source_dir.display());
        println!("  {} {}", "Output:".bright_cyan(), inputs.output_dir.display());
        info!("Starting pipeline run: {:?}", inputs);

        // Extract
        println!("\n{}", "Extracting source files...".bright_yellow());
        let extraction = Extractor::new(&self.config)?.extract(&inputs.source_dir)?;
        if extraction.is_empty() {
            return Err(EtlError::NoInputData);
        }
        info!(
            "Extracted {} files, {} rows",
            extraction.files.len(),
            extraction.total_rows()
        );

        // Transform
        println!("\n{}", "Transforming data...".bright_yellow());
        let transformed = Transformer::new().transform(&extraction.tables)?;
        print_transform_report(&transformed.report);

        // Enrich
        let mut table = transformed.table;
        let mut enrichments = Vec::new();

        let equipment = inputs
            .equipment_master
            .as_ref()
            .map(|path| EquipmentMasterEnricher::new(path, &self.config));
        let (next, summary) = run_enricher(table, equipment.as_ref(), "Equipment master");
        table = next;
        enrichments.push(summary);

        let locations = inputs
            .technical_locations
            .as_ref()
            .map(|path| TechnicalLocationEnricher::new(path, &self.config));
        let (next, summary) = run_enricher(table, locations.as_ref(), "Technical locations");
        table = next;
        enrichments.push(summary);

        // Load
        println!("\n{}", "Saving results...".bright_yellow());
        let load = Loader::new(&inputs.output_dir, &self.config).load(&table)?;
        let columns_verified = match verify_table_columns(
            &load.sqlite.path,
            &self.config.table_name,
            &load.sqlite.columns,
        ) {
            Ok(verified) => verified,
            Err(e) => {
                warn!("Could not verify {}: {}", load.sqlite.path.display(), e);
                false
            }
        };
        if !columns_verified {
            println!(
                "  {} stored table columns do not match the consolidated table",
                "Warning:".bright_red()
            );
        }

        let summary = PipelineSummary {
            files: extraction.files,
            transform: transformed.report,
            enrichments,
            load,
            columns_verified,
            elapsed: start_time.elapsed(),
        };
        print_summary(&summary);
        Ok(summary)
    }
}

/// Apply an optional enricher, reporting its outcome
fn run_enricher<E: Enricher>(
    table: DataFrame,
    enricher: Option<&E>,
    name: &'static str,
) -> (DataFrame, EnrichmentSummary) {
    let Some(enricher) = enricher else {
        debug!("{} not provided, skipping enrichment", name);
        let summary = EnrichmentSummary {
            name,
            status: EnrichmentStatus::Skipped,
        };
        return (table, summary);
    };

    println!(
        "\n{} {}",
        "Enriching with".bright_yellow(),
        enricher.name().to_lowercase().bright_yellow()
    );
    let outcome = enricher.enrich(&table);
    let status = match &outcome {
        EnrichmentOutcome::Enriched(enriched) => {
            println!(
                "  {} {} columns added, {} rows",
                "Enriched:".bright_green(),
                enricher.output_columns().len(),
                enriched.height()
            );
            EnrichmentStatus::Enriched
        }
        EnrichmentOutcome::Degraded { reason, .. } => {
            println!("  {} {}", "Enrichment failed:".bright_red(), reason);
            println!(
                "  {} {}",
                "Added empty columns:".bright_cyan(),
                enricher.output_columns().join(", ")
            );
            EnrichmentStatus::Degraded(reason.clone())
        }
    };

    let summary = EnrichmentSummary {
        name: enricher.name(),
        status,
    };
    (outcome.into_table(), summary)
}

fn print_transform_report(report: &TransformReport) {
    println!(
        "  {} {}",
        "Original rows:".bright_cyan(),
        report.original_rows.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Final rows:".bright_cyan(),
        report.final_rows.to_string().bright_white().bold()
    );
    if report.rows_removed > 0 {
        println!(
            "  {} {}",
            "Empty rows removed:".bright_cyan(),
            report.rows_removed
        );
    }
    println!(
        "  {} {}",
        "Columns kept:".bright_cyan(),
        report.kept_columns.join(", ")
    );
    for (source, canonical) in report.renamed_columns.iter().filter(|(s, c)| s != c) {
        println!("    {} -> {}", source, canonical);
    }
    if !report.missing_columns.is_empty() {
        println!(
            "  {} {}",
            "Missing columns:".bright_red(),
            report.missing_columns.join(", ")
        );
    }
    if !report.dropped_columns.is_empty() {
        println!(
            "  {} {}",
            "Dropped columns:".bright_black(),
            report.dropped_columns.join(", ")
        );
    }
}

fn print_summary(summary: &PipelineSummary) {
    println!("\n{}", "Processing Summary".bright_green().bold());
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        summary.elapsed.as_millis().to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Files processed:".bright_cyan(),
        summary.files.len().to_string().bright_white()
    );
    println!("  {} {}", "Run id:".bright_cyan(), summary.load.run_id);

    for (name, sink) in summary.load.sinks() {
        println!("\n  {}", name.bright_green());
        println!("    {} {}", "Path:".bright_cyan(), sink.path.display());
        if let Some(table) = &sink.table {
            println!("    {} {}", "Table:".bright_cyan(), table);
        }
        println!(
            "    {} {}",
            "Rows:".bright_cyan(),
            sink.rows.to_string().bright_white().bold()
        );
        println!("    {} {}", "Columns:".bright_cyan(), sink.columns.len());
    }

    println!();
    for enrichment in &summary.enrichments {
        let status = match &enrichment.status {
            EnrichmentStatus::Enriched => "enriched".bright_green(),
            EnrichmentStatus::Degraded(reason) => format!("degraded ({})", reason).bright_red(),
            EnrichmentStatus::Skipped => "skipped".bright_black(),
        };
        println!("  {} {}", format!("{}:", enrichment.name).bright_cyan(), status);
    }
}
