//! Fixed-interval frame sampling
//!
//! Decodes a video front to back and writes every `round(fps * interval)`-th
//! frame as `frame_NNNNN.<ext>`, numbered from 0 in decode order. The stride
//! is fixed from the frame rate reported when the source is opened.

use crate::error::{Result, SyncError};
use crate::types::{frame_file_name, SampledFrames, VideoFrame};
use log::{debug, info};
use std::path::Path;

/// A sequential decoder of video frames
pub trait FrameSource {
    /// Frame rate reported by the container
    fn frame_rate(&self) -> f64;

    /// Next frame in decode order, `None` at end of stream
    fn read_next(&mut self) -> Result<Option<VideoFrame>>;
}

/// Number of decoded frames between two saved frames
pub fn sampling_stride(frame_rate: f64, interval_seconds: f64) -> Result<u64> {
    if !frame_rate.is_finite() || frame_rate <= 0.0 {
        return Err(SyncError::InvalidSource(format!(
            "frame rate must be positive, got {}",
            frame_rate
        )));
    }
    if !interval_seconds.is_finite() || interval_seconds <= 0.0 {
        return Err(SyncError::InvalidSource(format!(
            "sampling interval must be positive, got {}",
            interval_seconds
        )));
    }
    Ok(((frame_rate * interval_seconds).round() as u64).max(1))
}

#[derive(Debug, Clone)]
pub struct FrameSampler {
    pub interval_seconds: f64,
    pub image_extension: String,
}

impl Default for FrameSampler {
    fn default() -> Self {
        Self {
            interval_seconds: 1.0,
            image_extension: "jpg".to_string(),
        }
    }
}

impl FrameSampler {
    pub fn new(interval_seconds: f64, image_extension: impl Into<String>) -> Self {
        Self {
            interval_seconds,
            image_extension: image_extension.into(),
        }
    }

    /// Decode `source` to the end, writing sampled frames into `output_dir`
    pub fn sample<S: FrameSource + ?Sized>(
        &self,
        source: &mut S,
        output_dir: &Path,
    ) -> Result<SampledFrames> {
        let source_fps = source.frame_rate();
        let stride = sampling_stride(source_fps, self.interval_seconds)?;

        std::fs::create_dir_all(output_dir)?;

        debug!(
            "Sampling every {} frames ({} fps, {} s interval) into {:?}",
            stride, source_fps, self.interval_seconds, output_dir
        );

        let mut summary = SampledFrames {
            source_fps,
            stride,
            ..SampledFrames::default()
        };

        while let Some(frame) = source.read_next()? {
            if summary.decoded_frames % stride == 0 {
                let name = frame_file_name(summary.paths.len(), &self.image_extension);
                let path = output_dir.join(name);
                write_frame(&frame, &path)?;
                summary.paths.push(path);
            }
            summary.decoded_frames += 1;
        }

        info!(
            "Wrote {} of {} decoded frames to {:?}",
            summary.paths.len(),
            summary.decoded_frames,
            output_dir
        );

        Ok(summary)
    }
}

fn write_frame(frame: &VideoFrame, path: &Path) -> Result<()> {
    let image = image::RgbImage::from_raw(frame.width, frame.height, frame.data.clone())
        .ok_or_else(|| {
            SyncError::InvalidSource(format!(
                "frame buffer of {} bytes does not match {}x{} RGB",
                frame.data.len(),
                frame.width,
                frame.height
            ))
        })?;
    image
        .save(path)
        .map_err(|e| SyncError::Export(format!("Failed to write frame {:?}: {}", path, e)))
}
