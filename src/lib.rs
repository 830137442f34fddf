//! DJI Video Sync Library
//!
//! A Rust library for pairing the telemetry embedded in DJI drone videos with
//! still frames sampled from the same video at a fixed interval.
//!
//! # Features
//!
//! - **`csv`** (default): Enable CSV export of synchronized records
//! - **`cli`** (default): Build the command-line interface binary
//! - **`json`**: Enable JSON export of synchronized records
//! - **`serde`**: Enable serialization/deserialization of types
//!
//! # Quick Start
//!
//! Parse an exiftool report and synchronize it to one record per second:
//! ```rust,no_run
//! use dji_video_sync::{parse_report_file, synchronize};
//! use std::path::Path;
//!
//! let telemetry = parse_report_file(Path::new("DJI_0001.txt")).unwrap();
//! let records = synchronize(&telemetry, "jpg").unwrap();
//! println!("{} telemetry blocks -> {} records", telemetry.samples.len(), records.len());
//! ```
//!
//! Process a whole video (needs `ffmpeg`, `ffprobe` and `exiftool` on `PATH`):
//! ```rust,no_run
//! use dji_video_sync::{process_video, SyncOptions};
//! use std::path::Path;
//!
//! let report = process_video(Path::new("DJI_0001.MP4"), &SyncOptions::default()).unwrap();
//! if let Some(path) = report.exports.csv_path {
//!     println!("Exported to: {}", path.display());
//! }
//! ```
//!
//! # Public API
//!
//! ## Parsing Functions
//! - [`parse_report_file`] - Parse an exiftool `-ee` report file
//! - [`parse_report`] - Parse report text held in memory
//! - [`parse_blocks`] - Segment report rows into telemetry samples
//! - [`parse_block`] - Low-level single block parse with explicit state
//!
//! ## Synchronization
//! - [`elapsed_seconds`] - Seconds between two DJI GPS timestamps
//! - [`dedupe`] - Keep one sample per whole second
//! - [`check_alignment`] - Compare frame and telemetry counts
//! - [`synchronize`] - Key, deduplicate and convert in one call
//!
//! ## Frames
//! - [`FrameSampler`] - Write every Nth decoded frame as an image
//! - [`FrameSource`] - Decoder seam; [`FfmpegSource`] is the ffmpeg implementation
//!
//! ## Export Functions
//! - [`export_to_csv`] - Write synchronized records to CSV
//! - [`export_track_geojson`] - Write the flight track as GeoJSON
//! - [`compute_export_paths`] - Helper for consistent path computation
//!
//! ## Survey Images
//! - [`read_xmp_metadata`] - Position tags of a DJI still
//! - [`survey_to_points`] - Project a folder of stills
//! - [`Projection`] - EPSG:4326 and WGS84 UTM zones

// Module declarations
pub mod conversion;
pub mod error;
pub mod exiftool;
pub mod export;
pub mod geodesy;
pub mod parser;
pub mod pipeline;
pub mod survey;
pub mod sync;
pub mod types;
pub mod video;

// Re-export everything from modules for convenience
pub use conversion::*;
pub use error::*;
pub use exiftool::*;
pub use export::*;
pub use geodesy::*;
pub use parser::*;
pub use pipeline::*;
pub use survey::*;
pub use sync::*;
pub use types::*;
pub use video::*;
