//! Extraction of source CSV exports.
//!
//! Lists the `.csv` files directly inside a source directory, detects each
//! file's encoding and delimiter, and loads it as an all-text table. Files
//! that cannot be detected or read are skipped with a warning; only a
//! missing directory is an error.

use crate::config::{CandidateEncoding, EtlConfig};
use crate::detector::FormatDetector;
use crate::error::{EtlError, Result};
use crate::models::FileMetadata;
use crate::reader::{ReadOptions, RowPolicy, read_delimited};

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use polars::prelude::DataFrame;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Tables and per-file metadata for every file that parsed
#[derive(Debug, Default)]
pub struct Extraction {
    pub tables: Vec<DataFrame>,
    pub files: Vec<FileMetadata>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn total_rows(&self) -> usize {
        self.files.iter().map(|f| f.rows).sum()
    }
}

/// Source directory extractor
#[derive(Debug)]
pub struct Extractor {
    detector: FormatDetector,
    show_progress: bool,
}

impl Extractor {
    pub fn new(config: &EtlConfig) -> Result<Self> {
        Ok(Self {
            detector: FormatDetector::from_config(config)?,
            show_progress: config.show_progress,
        })
    }

    /// List the CSV files directly inside `source_dir`, sorted by name
    pub fn discover_csv_files(&self, source_dir: &Path) -> Result<Vec<PathBuf>> {
        if !source_dir.is_dir() {
            return Err(EtlError::PathNotFound {
                path: source_dir.to_path_buf(),
            });
        }

        debug!("Searching for CSV files in: {}", source_dir.display());

        let mut files = Vec::new();
        for entry in fs::read_dir(source_dir)? {
            let path = entry?.path();
            if path.is_file() && is_csv_file(&path) {
                files.push(path);
            }
        }
        files.sort();

        debug!("Found {} CSV files", files.len());
        Ok(files)
    }

    /// Extract every parseable CSV file in `source_dir`
    pub fn extract(&self, source_dir: &Path) -> Result<Extraction> {
        let files = self.discover_csv_files(source_dir)?;
        println!(
            "  {} {} CSV files",
            "Found".bright_green(),
            files.len().to_string().bright_white().bold()
        );

        let mut extraction = Extraction::default();
        if files.is_empty() {
            return Ok(extraction);
        }

        let progress = self.progress_bar(files.len());
        for path in &files {
            let file_name = file_name(path);
            progress.set_message(file_name.clone());

            if let Some((table, metadata)) = self.extract_file(path, &file_name, &progress) {
                extraction.tables.push(table);
                extraction.files.push(metadata);
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        debug!(
            "Extracted {} of {} files, {} rows",
            extraction.files.len(),
            files.len(),
            extraction.total_rows()
        );
        Ok(extraction)
    }

    fn extract_file(
        &self,
        path: &Path,
        file_name: &str,
        progress: &ProgressBar,
    ) -> Option<(DataFrame, FileMetadata)> {
        progress.suspend(|| println!("\n  {} {}", "Processing:".bright_cyan(), file_name));

        let Some(format) = self.detector.detect(path) else {
            warn!("Could not determine encoding/delimiter for {}", path.display());
            progress.suspend(|| {
                println!("    {}", "Could not determine encoding/delimiter".bright_red())
            });
            return None;
        };

        progress.suspend(|| {
            println!("    - Encoding: {}", format.encoding_label);
            println!("    - Delimiter: '{}'", format.delimiter_display());
        });

        let options = ReadOptions {
            encoding: CandidateEncoding {
                label: format.encoding_label.clone(),
                encoding: format.encoding,
            },
            delimiter: format.delimiter,
            row_policy: RowPolicy::SkipMalformed,
        };

        match read_delimited(path, &options) {
            Ok(parsed) => {
                let rows = parsed.frame.height();
                progress.suspend(|| println!("    Loaded - Rows: {}", rows));
                if parsed.skipped_rows > 0 {
                    warn!(
                        "Skipped {} malformed rows in {}",
                        parsed.skipped_rows,
                        path.display()
                    );
                }
                let metadata = FileMetadata {
                    file_name: file_name.to_string(),
                    encoding: format.encoding_label.clone(),
                    delimiter: format.delimiter_display(),
                    rows,
                    skipped_rows: parsed.skipped_rows,
                };
                Some((parsed.frame, metadata))
            }
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                progress.suspend(|| {
                    println!("    {} {}", "Error reading file:".bright_red(), e)
                });
                None
            }
        }
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let progress = ProgressBar::new(len as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        progress
    }
}

/// Check if a path is a CSV file (case-sensitive extension)
fn is_csv_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "csv")
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
