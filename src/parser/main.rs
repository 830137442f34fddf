use crate::parser::block::parse_blocks;
use crate::parser::report::{parse_report_text, read_report};
use crate::types::ParsedTelemetry;
use crate::error::Result;
use log::debug;
use std::path::Path;

/// Parse an exiftool telemetry report file into ordered samples
pub fn parse_report_file(report_path: &Path) -> Result<ParsedTelemetry> {
    let rows = read_report(report_path)?;
    debug!("Read {} rows from {:?}", rows.len(), report_path);
    parse_blocks(&rows)
}

/// Parse report text already held in memory
pub fn parse_report(text: &str) -> Result<ParsedTelemetry> {
    parse_blocks(&parse_report_text(text))
}
