//! Export functionality for synchronized telemetry
//!
//! Contains functions for writing synchronized records to CSV, JSON and a
//! GeoJSON flight track.

use crate::conversion::parse_leading_number;
use crate::error::{Result, SyncError};
use crate::types::*;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

/// Export options for controlling output formats
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub csv: bool,
    pub json: bool,
    pub geojson: bool,
    pub output_dir: Option<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            csv: true,
            json: false,
            geojson: false,
            output_dir: None,
        }
    }
}

/// Output locations for one video
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPaths {
    pub output_dir: PathBuf,
    pub csv_path: PathBuf,
    pub json_path: PathBuf,
    pub geojson_path: PathBuf,
}

/// Paths of the files an export actually wrote
#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    pub csv_path: Option<PathBuf>,
    pub json_path: Option<PathBuf>,
    pub geojson_path: Option<PathBuf>,
}

/// Compute output paths for a video
///
/// Without an explicit output directory, results go to a folder named after
/// the video next to it (`flights/DJI_0001.MP4` -> `flights/DJI_0001/`).
pub fn compute_export_paths(video: &Path, export_options: &ExportOptions) -> ExportPaths {
    let output_dir = match export_options.output_dir {
        Some(ref dir) => PathBuf::from(dir),
        None => {
            let stem = video
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("video");
            video.parent().unwrap_or(Path::new(".")).join(stem)
        }
    };

    ExportPaths {
        csv_path: output_dir.join("frames.csv"),
        json_path: output_dir.join("frames.json"),
        geojson_path: output_dir.join("track.geojson"),
        output_dir,
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Write records to CSV, one row per record in `RECORD_COLUMNS` order
#[cfg(feature = "csv")]
pub fn export_to_csv(records: &[SyncRecord], output_path: &Path) -> Result<()> {
    ensure_parent_dir(output_path)?;

    let mut writer = csv::Writer::from_path(output_path).map_err(|e| {
        SyncError::Export(format!("Failed to create CSV file {:?}: {}", output_path, e))
    })?;

    writer
        .write_record(RECORD_COLUMNS)
        .map_err(|e| SyncError::Export(e.to_string()))?;

    for record in records {
        writer
            .write_record(record.to_row())
            .map_err(|e| SyncError::Export(e.to_string()))?;
    }

    writer.flush()?;
    Ok(())
}

/// Write records as a pretty-printed JSON array
#[cfg(feature = "json")]
pub fn export_to_json(records: &[SyncRecord], output_path: &Path) -> Result<()> {
    ensure_parent_dir(output_path)?;
    let text = serde_json::to_string_pretty(records)
        .map_err(|e| SyncError::Export(format!("Failed to serialize records: {}", e)))?;
    std::fs::write(output_path, text)?;
    Ok(())
}

/// Build a GeoJSON FeatureCollection with one point per record
pub fn track_feature_collection(records: &[SyncRecord]) -> Value {
    let features: Vec<Value> = records
        .iter()
        .map(|record| {
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [record.longitude, record.latitude],
                },
                "properties": {
                    "image_name": record.image_name,
                    "sample_time": record.elapsed,
                    "absolute_altitude": parse_leading_number(&record.sample.absolute_altitude),
                    "relative_altitude": parse_leading_number(&record.sample.relative_altitude),
                    "gimbal_pitch": record.sample.gimbal_pitch,
                    "gimbal_yaw": record.sample.gimbal_yaw,
                    "gps_date_time": record.sample.gps_date_time,
                },
            })
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

/// Write the flight track of the records as GeoJSON (EPSG:4326)
pub fn export_track_geojson(records: &[SyncRecord], output_path: &Path) -> Result<()> {
    ensure_parent_dir(output_path)?;
    let text = serde_json::to_string_pretty(&track_feature_collection(records))
        .map_err(|e| SyncError::Export(format!("Failed to serialize track: {}", e)))?;
    std::fs::write(output_path, text)?;
    Ok(())
}

/// Run every export enabled in `export_options`
pub fn export_records(
    records: &[SyncRecord],
    paths: &ExportPaths,
    export_options: &ExportOptions,
) -> Result<ExportReport> {
    let mut report = ExportReport::default();

    if export_options.csv {
        #[cfg(feature = "csv")]
        {
            export_to_csv(records, &paths.csv_path)?;
            report.csv_path = Some(paths.csv_path.clone());
        }
        #[cfg(not(feature = "csv"))]
        return Err(SyncError::Export(
            "CSV export requires the 'csv' feature".to_string(),
        ));
    }

    if export_options.json {
        #[cfg(feature = "json")]
        {
            export_to_json(records, &paths.json_path)?;
            report.json_path = Some(paths.json_path.clone());
        }
        #[cfg(not(feature = "json"))]
        return Err(SyncError::Export(
            "JSON export requires the 'json' feature".to_string(),
        ));
    }

    if export_options.geojson {
        export_track_geojson(records, &paths.geojson_path)?;
        report.geojson_path = Some(paths.geojson_path.clone());
    }

    Ok(report)
}
