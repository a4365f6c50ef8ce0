//! Error handling for the work order ETL pipeline.
//!
//! Hard-stop failures (missing source directory, nothing to transform,
//! transform or load failures) surface as [`EtlError`]. Enrichment never
//! returns these to the caller; see [`crate::enrichment::EnrichmentOutcome`].

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Path not found: {path}")]
    PathNotFound { path: PathBuf },

    #[error("Could not decode {path} as {encoding}")]
    Decode { path: PathBuf, encoding: String },

    #[error("Malformed row at line {line}: expected {expected} fields, found {found}")]
    MalformedRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("Unknown encoding label: {label}")]
    UnknownEncoding { label: String },

    #[error("No valid data found to process")]
    NoInputData,

    #[error("Missing columns in {source_name}: {}", .columns.join(", "))]
    MissingColumns {
        source_name: String,
        columns: Vec<String>,
    },

    #[error("Join key column '{column}' not found in data")]
    MissingJoinKey { column: String },

    #[error("No data to save")]
    EmptyTable,

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl EtlError {
    /// True for the failures the pipeline treats as expected stop conditions,
    /// as opposed to unexpected internal errors.
    pub fn is_hard_stop(&self) -> bool {
        matches!(
            self,
            EtlError::PathNotFound { .. } | EtlError::NoInputData | EtlError::EmptyTable
        )
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
