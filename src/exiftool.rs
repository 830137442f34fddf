//! exiftool wrapper producing the telemetry report
//!
//! `exiftool -ee` dumps the embedded per-frame metadata track of a DJI video
//! as plain `Label : Value` text, which is what the block parser consumes.

use crate::error::{Result, SyncError};
use log::debug;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

pub struct ExifTool {
    exiftool_path: String,
}

impl ExifTool {
    pub fn new(exiftool_path: impl Into<String>) -> Self {
        Self {
            exiftool_path: exiftool_path.into(),
        }
    }

    /// Report file name for a video: `DJI_0001.MP4` -> `DJI_0001.txt`
    pub fn report_path_for(video: &Path, output_dir: &Path) -> PathBuf {
        let stem = video
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("telemetry");
        output_dir.join(format!("{stem}.txt"))
    }

    /// Dump the embedded telemetry of `video` into `output_dir`, returning the report path
    pub fn generate_report(&self, video: &Path, output_dir: &Path) -> Result<PathBuf> {
        if !video.is_file() {
            return Err(SyncError::NotFound(video.to_path_buf()));
        }
        std::fs::create_dir_all(output_dir)?;

        let report_path = Self::report_path_for(video, output_dir);
        let report_file = File::create(&report_path)?;

        debug!(
            "Running {} -ee {:?} > {:?}",
            self.exiftool_path, video, report_path
        );

        let output = Command::new(&self.exiftool_path)
            .arg("-ee")
            .arg(video)
            .stdout(Stdio::from(report_file))
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                SyncError::External(format!("Failed to execute {}: {}", self.exiftool_path, e))
            })?;

        if !output.status.success() {
            return Err(SyncError::External(format!(
                "exiftool failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        Ok(report_path)
    }
}

impl Default for ExifTool {
    fn default() -> Self {
        Self::new("exiftool")
    }
}
