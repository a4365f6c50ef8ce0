//! Encoding and delimiter detection for source CSV files.
//!
//! Samples the first lines of a file under each candidate encoding in
//! priority order. The first encoding that decodes the sample wins, and the
//! delimiter is the candidate character with the highest count across the
//! sample (ties go to the earlier candidate).

use crate::config::{CandidateEncoding, EtlConfig};
use crate::error::Result;
use crate::models::DetectedFormat;
use encoding_rs::{Encoding, UTF_8};
use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use tracing::debug;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Detector for source file encoding and delimiter
#[derive(Debug, Clone)]
pub struct FormatDetector {
    candidates: Vec<CandidateEncoding>,
    delimiters: Vec<u8>,
    sample_lines: usize,
}

impl FormatDetector {
    pub fn new(candidates: Vec<CandidateEncoding>, delimiters: Vec<u8>, sample_lines: usize) -> Self {
        Self {
            candidates,
            delimiters,
            sample_lines,
        }
    }

    pub fn from_config(config: &EtlConfig) -> Result<Self> {
        Ok(Self::new(
            config.resolve_candidate_encodings()?,
            config.delimiter_bytes(),
            config.sample_lines,
        ))
    }

    /// Detect the format of a file, or `None` when no candidate encoding
    /// decodes its leading lines (an unreadable file counts as undecodable).
    /// Only the sampled lines are read.
    pub fn detect(&self, path: &Path) -> Option<DetectedFormat> {
        let sample = match read_leading_lines(path, self.sample_lines) {
            Ok(sample) => sample,
            Err(e) => {
                debug!("Could not read {} for detection: {}", path.display(), e);
                return None;
            }
        };

        self.detect_bytes(&sample)
    }

    /// Detect the format of in-memory file contents
    pub fn detect_bytes(&self, bytes: &[u8]) -> Option<DetectedFormat> {
        let sample = leading_lines(bytes, self.sample_lines);

        for candidate in &self.candidates {
            let Some(text) = decode_strict(sample, candidate.encoding) else {
                debug!("Sample does not decode as {}", candidate.label);
                continue;
            };

            let delimiter = self.most_frequent_delimiter(&text)?;
            return Some(DetectedFormat {
                encoding_label: candidate.label.clone(),
                encoding: candidate.encoding,
                delimiter,
            });
        }

        None
    }

    fn most_frequent_delimiter(&self, text: &str) -> Option<u8> {
        let mut best: Option<(u8, usize)> = None;
        for &delimiter in &self.delimiters {
            let count = text.bytes().filter(|&b| b == delimiter).count();
            match best {
                Some((_, best_count)) if count <= best_count => {}
                _ => best = Some((delimiter, count)),
            }
        }
        best.map(|(delimiter, _)| delimiter)
    }
}

/// Read at most `count` lines from the start of a file
fn read_leading_lines(path: &Path, count: usize) -> io::Result<Vec<u8>> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut sample = Vec::new();
    for _ in 0..count {
        if reader.read_until(b'\n', &mut sample)? == 0 {
            break;
        }
    }
    Ok(sample)
}

/// Prefix of `bytes` covering at most `count` lines
fn leading_lines(bytes: &[u8], count: usize) -> &[u8] {
    let mut end = 0;
    for line in bytes.split_inclusive(|&b| b == b'\n').take(count) {
        end += line.len();
    }
    &bytes[..end]
}

/// Decode without replacement characters; `None` on malformed input.
/// A UTF-8 byte order mark is dropped.
pub fn decode_strict<'a>(bytes: &'a [u8], encoding: &'static Encoding) -> Option<Cow<'a, str>> {
    let bytes = if encoding == UTF_8 {
        bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
    } else {
        bytes
    };
    encoding.decode_without_bom_handling_and_without_replacement(bytes)
}
