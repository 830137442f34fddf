//! Video processing pipeline
//!
//! Runs frame sampling and telemetry parsing for one video and writes the
//! synchronized records. The two halves are independent: frames written
//! before a telemetry failure stay on disk.

use crate::error::SyncError;
use crate::exiftool::ExifTool;
use crate::export::{compute_export_paths, export_records, ExportOptions, ExportReport};
use crate::parser::parse_report_file;
use crate::sync::{build_records, check_alignment, dedupe, key_by_elapsed};
use crate::types::{SampledFrames, SyncRecord};
use crate::video::{FfmpegSource, FrameSampler};
use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

/// Options for processing one video
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub interval_seconds: f64,
    pub image_extension: String,
    /// Pre-generated exiftool report; generated next to the outputs when `None`
    pub report_path: Option<PathBuf>,
    pub extract_frames: bool,
    /// Fail when frame and telemetry counts differ instead of warning
    pub strict_alignment: bool,
    pub export: ExportOptions,
    pub exiftool_path: String,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            interval_seconds: 1.0,
            image_extension: "jpg".to_string(),
            report_path: None,
            extract_frames: true,
            strict_alignment: true,
            export: ExportOptions::default(),
            exiftool_path: "exiftool".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
        }
    }
}

/// Outcome of processing one video
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub output_dir: PathBuf,
    pub report_path: PathBuf,
    pub frames: Option<SampledFrames>,
    pub parsed_samples: usize,
    pub records: Vec<SyncRecord>,
    pub exports: ExportReport,
}

/// Extract frames and synchronized telemetry from a DJI video
pub fn process_video(video: &Path, options: &SyncOptions) -> Result<SyncReport> {
    if !video.is_file() {
        return Err(SyncError::NotFound(video.to_path_buf()).into());
    }
    if let Some(ref report) = options.report_path {
        if !report.is_file() {
            return Err(SyncError::NotFound(report.clone()).into());
        }
    }

    let paths = compute_export_paths(video, &options.export);
    std::fs::create_dir_all(&paths.output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", paths.output_dir))?;

    let frames = if options.extract_frames {
        let mut source = FfmpegSource::open(video, &options.ffmpeg_path, &options.ffprobe_path)
            .with_context(|| format!("Failed to open video: {:?}", video))?;
        let sampler = FrameSampler::new(options.interval_seconds, options.image_extension.clone());
        let sampled = sampler
            .sample(&mut source, &paths.output_dir)
            .with_context(|| format!("Failed to sample frames from {:?}", video))?;
        Some(sampled)
    } else {
        None
    };

    let report_path = match options.report_path {
        Some(ref report) => report.clone(),
        None => ExifTool::new(options.exiftool_path.clone())
            .generate_report(video, &paths.output_dir)
            .with_context(|| format!("Failed to extract telemetry from {:?}", video))?,
    };

    let (records, parsed_samples) = synchronize_report(&report_path, frames.as_ref(), options)?;

    let exports = export_records(&records, &paths, &options.export)
        .with_context(|| format!("Failed to export records to {:?}", paths.output_dir))?;

    Ok(SyncReport {
        output_dir: paths.output_dir,
        report_path,
        frames,
        parsed_samples,
        records,
        exports,
    })
}

/// Parse a report and produce aligned records; returns the records and the parsed sample count
pub fn synchronize_report(
    report_path: &Path,
    frames: Option<&SampledFrames>,
    options: &SyncOptions,
) -> Result<(Vec<SyncRecord>, usize)> {
    let telemetry = parse_report_file(report_path)
        .with_context(|| format!("Failed to parse telemetry report: {:?}", report_path))?;

    let keyed = key_by_elapsed(&telemetry)?;
    let deduped = dedupe(keyed);

    info!(
        "{} telemetry samples, {} after one-per-second deduplication",
        telemetry.samples.len(),
        deduped.len()
    );

    if let Some(frames) = frames {
        check_alignment(frames.len(), deduped.len(), options.strict_alignment)?;
    }

    let records = build_records(&deduped, &options.image_extension)?;
    Ok((records, telemetry.samples.len()))
}
