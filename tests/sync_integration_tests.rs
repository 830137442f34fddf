//! Integration tests for the report -> records -> export path
//!
//! Covers:
//! - Parsing a padded exiftool report with identification rows mixed in
//! - One record per whole second and the CSV column order
//! - Structural failures leaving no table behind
//! - Missing inputs reported as `NotFound`
//! - GeoJSON track and survey exports

use dji_video_sync::{
    export_records, export_survey_geojson, export_to_csv, parse_report, process_video,
    survey_to_points, synchronize, ExportOptions, ExportPaths, Projection, SyncError, SyncOptions,
    RECORD_COLUMNS,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn report_block(roll: Option<&str>, time: &str) -> String {
    let mut lines = vec![
        "Sample Time                     : 0 s".to_string(),
        "Sample Duration                 : 0.03 s".to_string(),
        "ISO                             : 100".to_string(),
        "Shutter Speed                   : 1/1000".to_string(),
        "F Number                        : 2.8".to_string(),
        "Digital Zoom                    : 1".to_string(),
    ];
    if let Some(roll) = roll {
        lines.push(format!("Drone Roll                      : {roll}"));
    }
    lines.extend([
        "Drone Pitch                     : -2.1".to_string(),
        "Drone Yaw                       : 87.4".to_string(),
        "GPS Latitude                    : 53 deg 24' 29.32\" N".to_string(),
        "GPS Longitude                   : 113 deg 58' 50.36\" W".to_string(),
        "Absolute Altitude               : +712.30".to_string(),
        "Relative Altitude               : +60.10".to_string(),
        "Gimbal Pitch                    : -90.0".to_string(),
        "Gimbal Yaw                      : 87.0".to_string(),
        format!("GPS Date/Time                   : {time}"),
    ]);
    lines.join("\n")
}

/// Three blocks at 0.0 s, 0.9 s and 1.1 s, with a per-file header in front
fn three_block_report() -> String {
    [
        "ExifTool Version Number         : 12.76".to_string(),
        "File Name                       : DJI_0001.MP4".to_string(),
        "Model                           : FC3582".to_string(),
        "Serial Number                   : 1581F5FHD".to_string(),
        report_block(Some("1.0"), "2024:06:01 17:22:37.000Z"),
        report_block(Some("2.0"), "2024:06:01 17:22:37.900Z"),
        report_block(Some("3.0"), "2024:06:01 17:22:38.100Z"),
    ]
    .join("\n")
}

#[test]
fn test_report_to_csv_keeps_one_row_per_second() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let csv_path = temp_dir.path().join("frames.csv");

    let telemetry = parse_report(&three_block_report()).expect("report should parse");
    assert_eq!(telemetry.samples.len(), 3);

    let records = synchronize(&telemetry, "jpg").expect("synchronize should succeed");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].image_name, "frame_00000.jpg");
    assert_eq!(records[1].image_name, "frame_00001.jpg");
    assert!((records[1].elapsed - 1.1).abs() < 1e-9);

    export_to_csv(&records, &csv_path).expect("CSV export should succeed");

    let mut reader = csv::Reader::from_path(&csv_path).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers, RECORD_COLUMNS);

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], "frame_00000.jpg");
    // Third block's roll survives deduplication, second block's is dropped
    assert_eq!(&rows[1][7], "3");
    let latitude: f64 = rows[0][10].parse().unwrap();
    let longitude: f64 = rows[0][11].parse().unwrap();
    assert!((latitude - 53.408144).abs() < 1e-5);
    assert!((longitude + 113.980656).abs() < 1e-5);
}

#[test]
fn test_structural_failure_writes_no_table() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let video = temp_dir.path().join("DJI_0002.MP4");
    fs::write(&video, b"not really a video").unwrap();

    // Block cut short after Digital Zoom
    let broken = three_block_report().replace("Drone Pitch                     : -2.1\n", "");
    let report = temp_dir.path().join("DJI_0002.txt");
    fs::write(&report, broken).unwrap();

    let output_dir = temp_dir.path().join("out");
    let options = SyncOptions {
        report_path: Some(report),
        extract_frames: false,
        export: ExportOptions {
            output_dir: Some(output_dir.to_string_lossy().into_owned()),
            ..ExportOptions::default()
        },
        ..SyncOptions::default()
    };

    let err = process_video(&video, &options).expect_err("broken report must fail");
    match err.downcast_ref::<SyncError>() {
        Some(SyncError::StructuralParse { expected, .. }) => assert_eq!(expected, "Drone Pitch"),
        other => panic!("expected a structural parse error, got {other:?}"),
    }
    assert!(!output_dir.join("frames.csv").exists());
}

#[test]
fn test_process_video_with_existing_report() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let video = temp_dir.path().join("DJI_0003.MP4");
    fs::write(&video, b"placeholder").unwrap();
    let report = temp_dir.path().join("DJI_0003.txt");
    fs::write(&report, three_block_report()).unwrap();

    let options = SyncOptions {
        report_path: Some(report.clone()),
        extract_frames: false,
        export: ExportOptions {
            geojson: true,
            ..ExportOptions::default()
        },
        ..SyncOptions::default()
    };

    let result = process_video(&video, &options).expect("processing should succeed");
    assert_eq!(result.output_dir, temp_dir.path().join("DJI_0003"));
    assert_eq!(result.report_path, report);
    assert!(result.frames.is_none());
    assert_eq!(result.parsed_samples, 3);
    assert_eq!(result.records.len(), 2);
    assert!(result.exports.csv_path.as_ref().unwrap().exists());
    assert!(result.exports.geojson_path.as_ref().unwrap().exists());
}

#[test]
fn test_missing_video_is_not_found() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let video = temp_dir.path().join("missing.MP4");

    let err = process_video(&video, &SyncOptions::default()).expect_err("missing video");
    assert!(matches!(
        err.downcast_ref::<SyncError>(),
        Some(SyncError::NotFound(path)) if path == &video
    ));
}

#[test]
fn test_track_geojson_creates_output_directory() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let nested = temp_dir.path().join("nested").join("output");

    let telemetry = parse_report(&three_block_report()).unwrap();
    let records = synchronize(&telemetry, "png").unwrap();
    let paths = ExportPaths {
        output_dir: nested.clone(),
        csv_path: nested.join("frames.csv"),
        json_path: nested.join("frames.json"),
        geojson_path: nested.join("track.geojson"),
    };
    let options = ExportOptions {
        csv: false,
        geojson: true,
        ..ExportOptions::default()
    };

    let report = export_records(&records, &paths, &options).expect("export should succeed");
    assert!(report.csv_path.is_none());
    assert!(!paths.csv_path.exists());

    let text = fs::read_to_string(&paths.geojson_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["type"], "FeatureCollection");
    assert_eq!(value["features"].as_array().unwrap().len(), 2);
    assert_eq!(value["features"][1]["properties"]["image_name"], "frame_00001.png");
    assert_eq!(value["features"][0]["properties"]["relative_altitude"], 60.1);
}

fn write_fake_still(dir: &Path, name: &str, latitude: &str, longitude: &str) {
    let xmp = format!(
        r#"<x:xmpmeta xmlns:x="adobe:ns:meta/"><rdf:Description
   drone-dji:AbsoluteAltitude="+712.35"
   drone-dji:RelativeAltitude="+60.10"
   drone-dji:GpsLatitude="{latitude}"
   drone-dji:GpsLongitude="{longitude}"/></x:xmpmeta>"#
    );
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE1, 0x01, 0x00];
    data.extend_from_slice(xmp.as_bytes());
    data.extend_from_slice(&[0xFF, 0xD9]);
    fs::write(dir.join(name), data).unwrap();
}

#[test]
fn test_survey_folder_to_geojson() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let survey = temp_dir.path().join("survey");
    fs::create_dir_all(&survey).unwrap();
    write_fake_still(&survey, "DJI_0002.JPG", "53.408200", "-113.980700");
    write_fake_still(&survey, "DJI_0001.jpg", "53.408144", "-113.980656");
    fs::write(survey.join("notes.txt"), "ignored").unwrap();

    let projection = Projection::from_epsg("EPSG:32612").unwrap();
    let points = survey_to_points(&survey, projection).expect("survey should map");
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].filename, "DJI_0001.jpg");
    assert_eq!(points[0].flight_height, 60.1);
    // Zone 12 is centred on -111, so these points sit west of the false easting
    assert!(points[0].x < 500_000.0 && points[0].x > 250_000.0);
    assert!(points[0].y > 5_900_000.0 && points[0].y < 6_000_000.0);

    let output = temp_dir.path().join("maps").join("survey.geojson");
    export_survey_geojson(&points, projection, &output).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(value["crs"]["properties"]["name"], "urn:ogc:def:crs:EPSG::32612");
    assert_eq!(value["features"][1]["properties"]["filename"], "DJI_0002.JPG");
}
