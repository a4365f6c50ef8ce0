//! Configuration management and validation.
//!
//! Collects the encodings, delimiters and output naming used by every
//! pipeline stage, with builder-style overrides and validation.

use crate::constants::{
    DEFAULT_CANDIDATE_DELIMITERS, DEFAULT_CANDIDATE_ENCODINGS, DEFAULT_OUTPUT_DELIMITER,
    DEFAULT_OUTPUT_PREFIX, DEFAULT_REFERENCE_DELIMITER, DEFAULT_REFERENCE_ENCODING,
    DEFAULT_SAMPLE_LINES, DEFAULT_TABLE_NAME,
};
use crate::error::{EtlError, Result};
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// An encoding label paired with the decoder it resolves to
#[derive(Debug, Clone)]
pub struct CandidateEncoding {
    pub label: String,
    pub encoding: &'static Encoding,
}

/// Global configuration for a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtlConfig {
    /// Encodings tried by the detector, in priority order
    pub candidate_encodings: Vec<String>,

    /// Delimiters counted by the detector; ties go to the earlier entry
    pub candidate_delimiters: Vec<char>,

    /// Number of leading lines sampled for detection
    pub sample_lines: usize,

    /// Fixed encoding of both reference files
    pub reference_encoding: String,

    /// Fixed delimiter of both reference files
    pub reference_delimiter: char,

    /// Delimiter of the consolidated CSV output
    pub output_delimiter: char,

    /// Base name of the output files
    pub output_prefix: String,

    /// Table name inside the SQLite output
    pub table_name: String,

    /// Show a progress bar while extracting
    pub show_progress: bool,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            candidate_encodings: DEFAULT_CANDIDATE_ENCODINGS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            candidate_delimiters: DEFAULT_CANDIDATE_DELIMITERS.to_vec(),
            sample_lines: DEFAULT_SAMPLE_LINES,
            reference_encoding: DEFAULT_REFERENCE_ENCODING.to_string(),
            reference_delimiter: DEFAULT_REFERENCE_DELIMITER,
            output_delimiter: DEFAULT_OUTPUT_DELIMITER,
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            show_progress: true,
        }
    }
}

impl EtlConfig {
    /// Replace the detector's candidate encodings
    pub fn with_candidate_encodings<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.candidate_encodings = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Set the number of lines sampled for detection
    pub fn with_sample_lines(mut self, sample_lines: usize) -> Self {
        self.sample_lines = sample_lines;
        self
    }

    /// Set the encoding used for reference files
    pub fn with_reference_encoding(mut self, label: impl Into<String>) -> Self {
        self.reference_encoding = label.into();
        self
    }

    /// Set the base name of output files
    pub fn with_output_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.output_prefix = prefix.into();
        self
    }

    /// Set the SQLite table name
    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    /// Disable the extraction progress bar
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Resolve candidate encoding labels to decoders, in order
    pub fn resolve_candidate_encodings(&self) -> Result<Vec<CandidateEncoding>> {
        self.candidate_encodings
            .iter()
            .map(|label| resolve_encoding(label))
            .collect()
    }

    /// Resolve the reference-file encoding label
    pub fn resolve_reference_encoding(&self) -> Result<CandidateEncoding> {
        resolve_encoding(&self.reference_encoding)
    }

    /// Candidate delimiters as bytes
    pub fn delimiter_bytes(&self) -> Vec<u8> {
        self.candidate_delimiters
            .iter()
            .filter_map(|&c| ascii_byte(c))
            .collect()
    }

    pub fn reference_delimiter_byte(&self) -> Result<u8> {
        ascii_byte(self.reference_delimiter).ok_or_else(|| non_ascii(self.reference_delimiter))
    }

    pub fn output_delimiter_byte(&self) -> Result<u8> {
        ascii_byte(self.output_delimiter).ok_or_else(|| non_ascii(self.output_delimiter))
    }

    /// Check the configuration before any stage runs
    pub fn validate(&self) -> Result<()> {
        if self.candidate_encodings.is_empty() {
            return Err(EtlError::Configuration {
                message: "At least one candidate encoding is required".to_string(),
            });
        }
        self.resolve_candidate_encodings()?;
        self.resolve_reference_encoding()?;

        if self.candidate_delimiters.is_empty() {
            return Err(EtlError::Configuration {
                message: "At least one candidate delimiter is required".to_string(),
            });
        }
        if let Some(&c) = self.candidate_delimiters.iter().find(|c| !c.is_ascii()) {
            return Err(non_ascii(c));
        }
        self.reference_delimiter_byte()?;
        self.output_delimiter_byte()?;

        if self.sample_lines == 0 {
            return Err(EtlError::Configuration {
                message: "sample_lines must be greater than zero".to_string(),
            });
        }
        if self.output_prefix.trim().is_empty() || self.table_name.trim().is_empty() {
            return Err(EtlError::Configuration {
                message: "Output prefix and table name must not be empty".to_string(),
            });
        }

        debug!("Configuration validated: {:?}", self);
        Ok(())
    }
}

fn resolve_encoding(label: &str) -> Result<CandidateEncoding> {
    let label = label.trim();
    let encoding =
        Encoding::for_label(label.as_bytes()).ok_or_else(|| EtlError::UnknownEncoding {
            label: label.to_string(),
        })?;
    Ok(CandidateEncoding {
        label: label.to_string(),
        encoding,
    })
}

fn ascii_byte(c: char) -> Option<u8> {
    c.is_ascii().then_some(c as u8)
}

fn non_ascii(c: char) -> EtlError {
    EtlError::Configuration {
        message: format!("Delimiter {:?} is not an ASCII character", c),
    }
}
