//! Data conversion utilities for DJI telemetry values
//!
//! Contains the coordinate and timestamp conversions applied to the raw
//! text values of the exiftool report.

use crate::error::{Result, SyncError};
use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::OnceLock;

fn dms_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"^(\d+)\s*deg\s*(\d+)'\s*([\d.]+)"\s*([NSEW])"#)
            .expect("DMS pattern is a valid regex")
    })
}

/// Convert a DMS coordinate such as `53 deg 24' 29.32" N` to signed decimal degrees
///
/// South and west coordinates are negated.
pub fn dms_to_decimal(dms: &str) -> Result<f64> {
    let caps = dms_pattern()
        .captures(dms.trim())
        .ok_or_else(|| SyncError::format("DMS coordinate", dms))?;

    let degrees: u32 = caps[1]
        .parse()
        .map_err(|_| SyncError::format("DMS coordinate", dms))?;
    let minutes: u32 = caps[2]
        .parse()
        .map_err(|_| SyncError::format("DMS coordinate", dms))?;
    let seconds: f64 = caps[3]
        .parse()
        .map_err(|_| SyncError::format("DMS coordinate", dms))?;

    let decimal = degrees as f64 + minutes as f64 / 60.0 + seconds / 3600.0;

    match &caps[4] {
        "S" | "W" => Ok(-decimal),
        _ => Ok(decimal),
    }
}

/// Convert a latitude/longitude DMS pair; the two are not cross-checked
pub fn dms_pair_to_decimal(latitude: &str, longitude: &str) -> Result<(f64, f64)> {
    Ok((dms_to_decimal(latitude)?, dms_to_decimal(longitude)?))
}

/// Parse a DJI GPS timestamp `YYYY:MM:DD HH:MM:SS.sss` with an optional trailing `Z`
///
/// The zone marker is stripped, not interpreted.
pub fn parse_gps_timestamp(timestamp: &str) -> Result<NaiveDateTime> {
    let trimmed = timestamp.trim();
    let naive = trimmed.strip_suffix('Z').unwrap_or(trimmed);

    // Fractional seconds are part of the fixed format
    let has_fraction = naive
        .rsplit(':')
        .next()
        .map(|secs| secs.contains('.'))
        .unwrap_or(false);
    if !has_fraction {
        return Err(SyncError::format("GPS timestamp", timestamp));
    }

    NaiveDateTime::parse_from_str(naive, "%Y:%m:%d %H:%M:%S%.f")
        .map_err(|_| SyncError::format("GPS timestamp", timestamp))
}

/// Signed seconds (with fractional part) from `reference` to `target`
pub fn elapsed_seconds(reference: &str, target: &str) -> Result<f64> {
    let reference = parse_gps_timestamp(reference)?;
    let target = parse_gps_timestamp(target)?;
    let delta = target - reference;

    match delta.num_microseconds() {
        Some(us) => Ok(us as f64 / 1_000_000.0),
        None => Ok(delta.num_milliseconds() as f64 / 1_000.0),
    }
}

/// Parse a numeric report value such as a roll angle
pub fn parse_angle(value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| SyncError::format("angle", value))
}

/// Parse a numeric report value that may carry a trailing unit, e.g. `101.2 m`
pub fn parse_leading_number(value: &str) -> Option<f64> {
    value.split_whitespace().next()?.parse().ok()
}
