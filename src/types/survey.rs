#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Position data read from the XMP packet of a DJI still image
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct XmpMetadata {
    pub latitude: f64,
    pub longitude: f64,
    pub absolute_altitude: Option<f64>,
    /// Height above the takeoff point in metres
    pub relative_altitude: f64,
}

/// One survey image projected into the output coordinate system
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SurveyPoint {
    pub filename: String,
    pub x: f64,
    pub y: f64,
    pub flight_height: f64,
}
