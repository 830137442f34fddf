use std::path::PathBuf;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One decoded video frame as packed RGB24 bytes
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl VideoFrame {
    pub fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 3
    }
}

/// Result of one frame sampling run
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SampledFrames {
    pub source_fps: f64,
    pub stride: u64,
    pub decoded_frames: u64,
    pub paths: Vec<PathBuf>,
}

impl SampledFrames {
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// File name of the `index`-th sampled frame, e.g. `frame_00042.jpg`
pub fn frame_file_name(index: usize, extension: &str) -> String {
    format!("frame_{index:05}.{extension}")
}
