//! Work Order ETL Library
//!
//! Consolidates heterogeneous CSV exports of field-service work orders into
//! a single normalized table and persists it as a CSV file and a SQLite
//! snapshot.
//!
//! This library provides tools for:
//! - Detecting the encoding and delimiter of each source export
//! - Reconciling inconsistent headers onto a fixed canonical schema
//! - Best-effort enrichment from an equipment master and a technical
//!   locations file, degrading to null columns when a join fails
//! - Writing the consolidated table under a per-run identifier

pub mod cli;
pub mod config;
pub mod constants;
pub mod detector;
pub mod enrichment;
pub mod error;
pub mod extractor;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod reader;
pub mod table;
pub mod transformer;

// Re-export commonly used types
pub use config::EtlConfig;
pub use enrichment::{Enricher, EnrichmentOutcome};
pub use error::{EtlError, Result};
pub use models::{FileMetadata, LoadReport, TransformReport};
pub use pipeline::{Pipeline, PipelineInputs, PipelineSummary};
