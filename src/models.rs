//! Core data structures shared across pipeline stages.
//!
//! Detection results, per-file extraction metadata, the transform report and
//! the load report.

use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Encoding and delimiter detected for one source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedFormat {
    /// Candidate label that decoded successfully, e.g. `utf-8`
    pub encoding_label: String,
    pub encoding: &'static Encoding,
    pub delimiter: u8,
}

impl DetectedFormat {
    /// Printable delimiter, with tab spelled out
    pub fn delimiter_display(&self) -> String {
        display_delimiter(self.delimiter)
    }
}

pub fn display_delimiter(delimiter: u8) -> String {
    match delimiter {
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}

/// Metadata collected for each successfully parsed source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub file_name: String,
    pub encoding: String,
    pub delimiter: String,
    pub rows: usize,
    pub skipped_rows: usize,
}

/// Summary of the transform stage
///
/// Only used for reporting; `final_rows` and `kept_columns` always describe
/// the table returned alongside it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformReport {
    /// Sum of the input tables' row counts
    pub original_rows: usize,
    pub final_rows: usize,
    /// Canonical columns present in the output, in canonical order
    pub kept_columns: Vec<String>,
    /// Canonical columns no synonym resolved to
    pub missing_columns: Vec<String>,
    /// Applied renames as (normalized source name, canonical name)
    pub renamed_columns: Vec<(String, String)>,
    /// Normalized names of every concatenated column
    pub original_columns: Vec<String>,
    /// Columns not selected by any rename
    pub dropped_columns: Vec<String>,
    pub rows_removed: usize,
}

/// Result of writing one output sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkReport {
    pub path: PathBuf,
    /// Table name for relational sinks
    pub table: Option<String>,
    pub rows: usize,
    pub columns: Vec<String>,
}

/// Result of the load stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub run_id: String,
    pub csv: SinkReport,
    pub sqlite: SinkReport,
}

impl LoadReport {
    /// Sinks with their display names, in write order
    pub fn sinks(&self) -> [(&'static str, &SinkReport); 2] {
        [("CSV", &self.csv), ("SQLITE", &self.sqlite)]
    }
}
