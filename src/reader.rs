//! Delimited text reader producing all-text tables.
//!
//! Source exports are read leniently (malformed rows are skipped and
//! counted); reference files are read strictly (the first malformed row is
//! an error). Either way every cell stays text and empty cells become null.

use crate::config::CandidateEncoding;
use crate::detector::decode_strict;
use crate::error::{EtlError, Result};
use crate::table::{TextValues, frame_from_columns};
use polars::prelude::DataFrame;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

/// How to treat rows that do not fit the header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowPolicy {
    /// Skip and count malformed rows
    SkipMalformed,
    /// Fail on the first malformed row
    Strict,
}

#[derive(Debug, Clone)]
pub struct ReadOptions {
    pub encoding: CandidateEncoding,
    pub delimiter: u8,
    pub row_policy: RowPolicy,
}

/// A parsed file and the number of rows dropped while parsing it
#[derive(Debug)]
pub struct ParsedTable {
    pub frame: DataFrame,
    pub skipped_rows: usize,
}

/// Read and decode a delimited file
pub fn read_delimited(path: &Path, options: &ReadOptions) -> Result<ParsedTable> {
    let bytes = fs::read(path)?;
    let text = decode_strict(&bytes, options.encoding.encoding).ok_or_else(|| EtlError::Decode {
        path: path.to_path_buf(),
        encoding: options.encoding.label.clone(),
    })?;

    let parsed = parse_delimited(&text, options.delimiter, options.row_policy)?;
    debug!(
        "Read {}: {} rows, {} columns, {} skipped",
        path.display(),
        parsed.frame.height(),
        parsed.frame.width(),
        parsed.skipped_rows
    );
    Ok(parsed)
}

/// Parse decoded delimited text; the first record is the header.
///
/// Blank lines never reach the record loop. A line holding only `""` is a
/// row whose single field is empty.
pub fn parse_delimited(text: &str, delimiter: u8, row_policy: RowPolicy) -> Result<ParsedTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let headers = match records.next() {
        Some(header) => header_names(&header?),
        None => {
            return Ok(ParsedTable {
                frame: DataFrame::empty(),
                skipped_rows: 0,
            });
        }
    };

    let mut columns: Vec<TextValues> = vec![Vec::new(); headers.len()];
    let mut skipped_rows = 0;

    for record in records {
        let record = match record {
            Ok(record) => record,
            Err(e) if row_policy == RowPolicy::SkipMalformed => {
                debug!("Skipping unparseable row: {}", e);
                skipped_rows += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if record.len() > headers.len() {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            if row_policy == RowPolicy::Strict {
                return Err(EtlError::MalformedRow {
                    line,
                    expected: headers.len(),
                    found: record.len(),
                });
            }
            debug!(
                "Skipping line {}: expected {} fields, found {}",
                line,
                headers.len(),
                record.len()
            );
            skipped_rows += 1;
            continue;
        }

        for (idx, values) in columns.iter_mut().enumerate() {
            let cell = record.get(idx).filter(|cell| !cell.is_empty());
            values.push(cell.map(str::to_owned));
        }
    }

    let frame = frame_from_columns(headers.into_iter().zip(columns).collect())?;
    Ok(ParsedTable {
        frame,
        skipped_rows,
    })
}

/// Header names with blanks named `Unnamed: <index>` and repeats suffixed
/// `.<n>`
fn header_names(header: &csv::StringRecord) -> Vec<String> {
    let mut seen = HashSet::new();
    header
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let base = if name.trim().is_empty() {
                format!("Unnamed: {}", idx)
            } else {
                name.to_string()
            };
            let mut candidate = base.clone();
            let mut suffix = 1;
            while !seen.insert(candidate.clone()) {
                candidate = format!("{}.{}", base, suffix);
                suffix += 1;
            }
            candidate
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{column_names, text_values};
    use encoding_rs::{UTF_8, WINDOWS_1252};
    use tempfile::TempDir;

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn test_parse_keeps_cells_as_text() {
        let parsed = parse_delimited(
            "OT;FECHA_RUTA;CIUDAD\n0012;2024-01-05;Cali\n",
            b';',
            RowPolicy::SkipMalformed,
        )
        .unwrap();

        assert_eq!(column_names(&parsed.frame), vec!["OT", "FECHA_RUTA", "CIUDAD"]);
        assert_eq!(text_values(&parsed.frame, "OT").unwrap(), vec![some("0012")]);
        assert_eq!(parsed.skipped_rows, 0);
    }

    #[test]
    fn test_short_rows_padded_long_rows_skipped() {
        let text = "A,B,C\n1,2,3\n4,5\n6,7,8,9\n10,,12\n";
        let parsed = parse_delimited(text, b',', RowPolicy::SkipMalformed).unwrap();

        assert_eq!(parsed.frame.height(), 3);
        assert_eq!(parsed.skipped_rows, 1);
        assert_eq!(
            text_values(&parsed.frame, "C").unwrap(),
            vec![some("3"), None, some("12")]
        );
        assert_eq!(
            text_values(&parsed.frame, "B").unwrap(),
            vec![some("2"), some("5"), None]
        );
    }

    #[test]
    fn test_strict_policy_rejects_long_rows() {
        let text = "A;B\n1;2\n3;4;5\n";
        match parse_delimited(text, b';', RowPolicy::Strict).unwrap_err() {
            EtlError::MalformedRow {
                expected, found, ..
            } => {
                assert_eq!(expected, 2);
                assert_eq!(found, 3);
            }
            other => panic!("Expected MalformedRow error, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_and_duplicate_headers() {
        let parsed =
            parse_delimited(",NODO,NODO,\n1,a,b,c\n", b',', RowPolicy::SkipMalformed).unwrap();
        assert_eq!(
            column_names(&parsed.frame),
            vec!["Unnamed: 0", "NODO", "NODO.1", "Unnamed: 3"]
        );
    }

    #[test]
    fn test_quoted_delimiters_survive() {
        let parsed = parse_delimited(
            "A,B\n\"x, y\",z\n",
            b',',
            RowPolicy::SkipMalformed,
        )
        .unwrap();
        assert_eq!(text_values(&parsed.frame, "A").unwrap(), vec![some("x, y")]);
    }

    #[test]
    fn test_quoted_empty_line_is_a_row() {
        let parsed =
            parse_delimited("NODO\nN1\n\n\"\"\nN3\n", b';', RowPolicy::Strict).unwrap();
        assert_eq!(
            text_values(&parsed.frame, "NODO").unwrap(),
            vec![some("N1"), None, some("N3")]
        );
        assert_eq!(parsed.skipped_rows, 0);
    }

    #[test]
    fn test_empty_input_gives_empty_table() {
        let parsed = parse_delimited("", b',', RowPolicy::SkipMalformed).unwrap();
        assert_eq!(parsed.frame.width(), 0);
        assert_eq!(parsed.frame.height(), 0);
    }

    #[test]
    fn test_read_delimited_decodes_latin1() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ref.csv");
        std::fs::write(&path, b"ID;ESTADO\nN1;Cr\xEDtico\n").unwrap();

        let options = ReadOptions {
            encoding: CandidateEncoding {
                label: "latin1".to_string(),
                encoding: WINDOWS_1252,
            },
            delimiter: b';',
            row_policy: RowPolicy::Strict,
        };
        let parsed = read_delimited(&path, &options).unwrap();
        assert_eq!(
            text_values(&parsed.frame, "ESTADO").unwrap(),
            vec![some("Crítico")]
        );
    }

    #[test]
    fn test_read_delimited_reports_decode_failure() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.csv");
        std::fs::write(&path, b"A,B\n\xFF,1\n").unwrap();

        let options = ReadOptions {
            encoding: CandidateEncoding {
                label: "utf-8".to_string(),
                encoding: UTF_8,
            },
            delimiter: b',',
            row_policy: RowPolicy::SkipMalformed,
        };
        match read_delimited(&path, &options).unwrap_err() {
            EtlError::Decode { encoding, .. } => assert_eq!(encoding, "utf-8"),
            other => panic!("Expected Decode error, got {other:?}"),
        }
    }
}
