use std::fmt;
use std::path::PathBuf;

/// Marker used as the observed label when a block runs past the last row
pub const END_OF_REPORT: &str = "<end of report>";

/// Error types for telemetry parsing, frame sampling and synchronization
#[derive(Debug)]
pub enum SyncError {
    /// Input video, report or image directory is missing
    NotFound(PathBuf),
    /// The video source reported an unusable frame rate or sampling setup
    InvalidSource(String),
    /// A report row does not carry the label the block schema expects
    StructuralParse {
        position: usize,
        expected: String,
        observed: String,
    },
    /// A timestamp, coordinate or numeric value does not match its textual pattern
    Format { kind: &'static str, value: String },
    /// Extracted frame count and deduplicated telemetry count disagree
    Misaligned { frames: usize, samples: usize },
    /// I/O errors
    Io(std::io::Error),
    /// An external collaborator process (exiftool, ffmpeg, ffprobe) failed
    External(String),
    /// Export format error
    Export(String),
}

impl SyncError {
    pub fn format(kind: &'static str, value: impl Into<String>) -> Self {
        SyncError::Format {
            kind,
            value: value.into(),
        }
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::NotFound(path) => write!(f, "Not found: {}", path.display()),
            SyncError::InvalidSource(msg) => write!(f, "Invalid source: {}", msg),
            SyncError::StructuralParse {
                position,
                expected,
                observed,
            } => write!(
                f,
                "Structural parse error at row {}: expected '{}' but got '{}'",
                position, expected, observed
            ),
            SyncError::Format { kind, value } => write!(f, "Invalid {} format: {:?}", kind, value),
            SyncError::Misaligned { frames, samples } => write!(
                f,
                "Frame/telemetry misalignment: {} extracted frames vs {} telemetry samples",
                frames, samples
            ),
            SyncError::Io(err) => write!(f, "I/O error: {}", err),
            SyncError::External(msg) => write!(f, "External tool error: {}", msg),
            SyncError::Export(msg) => write!(f, "Export error: {}", msg),
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Io(err)
    }
}

impl From<anyhow::Error> for SyncError {
    fn from(err: anyhow::Error) -> Self {
        SyncError::External(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
