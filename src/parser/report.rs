//! exiftool report reader
//!
//! `exiftool -ee` prints one `Label<padding>: Value` line per tag. The
//! separator column is dropped and a handful of per-file identification tags
//! are filtered out because they interrupt the per-sample block layout.

use crate::error::{Result, SyncError};
use crate::types::RawRow;
use std::path::Path;

/// Whole-row labels that are not part of the per-sample schema
pub const FILTERED_LABELS: [&str; 6] = [
    "Protocol",
    "Serial Number",
    "Model",
    "Frame Width",
    "Frame Height",
    "Frame Rate",
];

/// Split one report line into a row; `None` for lines without a separator
pub fn parse_report_line(line: &str) -> Option<RawRow> {
    let (label, value) = line.split_once(':')?;
    let label = label.trim();
    if label.is_empty() {
        return None;
    }
    Some(RawRow::new(label, value.trim()))
}

/// Parse report text into rows, keeping report order
pub fn parse_report_text(text: &str) -> Vec<RawRow> {
    text.lines()
        .filter_map(parse_report_line)
        .filter(|row| !FILTERED_LABELS.contains(&row.label.as_str()))
        .collect()
}

/// Read and parse a report file
pub fn read_report(path: &Path) -> Result<Vec<RawRow>> {
    if !path.is_file() {
        return Err(SyncError::NotFound(path.to_path_buf()));
    }
    let raw = std::fs::read(path)?;
    // exiftool passes binary-ish tag values through verbatim
    Ok(parse_report_text(&String::from_utf8_lossy(&raw)))
}
