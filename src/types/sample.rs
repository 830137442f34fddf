#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One (label, value) row of the exiftool telemetry report, in report order
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RawRow {
    pub label: String,
    pub value: String,
}

impl RawRow {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// One decoded telemetry sample anchored by a "Sample Time" row.
///
/// Values are kept as the raw report text except `drone_roll`, which is numeric
/// because a missing roll is interpolated from its neighbours.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TelemetrySample {
    pub sample_duration: String,
    pub iso: String,
    pub shutter_speed: String,
    pub f_number: String,
    pub digital_zoom: String,
    pub drone_roll: f64,
    pub drone_pitch: String,
    pub drone_yaw: String,
    /// Raw DMS string, e.g. `53 deg 24' 29.32" N`
    pub gps_latitude: String,
    /// Raw DMS string, e.g. `113 deg 58' 50.36" W`
    pub gps_longitude: String,
    pub absolute_altitude: String,
    pub relative_altitude: String,
    pub gimbal_pitch: String,
    pub gimbal_yaw: String,
    /// Raw `YYYY:MM:DD HH:MM:SS.sss[Z]` timestamp
    pub gps_date_time: String,
}

/// Carried between consecutive block parses
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ParserState {
    /// Last stored roll, explicit or interpolated
    pub previous_block_roll: f64,
}

/// All samples of one report plus the synchronization reference
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParsedTelemetry {
    pub samples: Vec<TelemetrySample>,
    /// `gps_date_time` of the first anchored block, `None` when the report has no blocks
    pub reference_time: Option<String>,
}

impl ParsedTelemetry {
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// A sample keyed by seconds elapsed since the reference timestamp
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ElapsedKeyedSample {
    pub elapsed: f64,
    pub sample: TelemetrySample,
}

impl ElapsedKeyedSample {
    /// Whole second this sample falls into (truncated toward zero)
    pub fn whole_second(&self) -> i64 {
        self.elapsed.trunc() as i64
    }

    /// Deduplication key: the whole second plus the sign of the offset
    ///
    /// Samples just before the reference (`-0.4`) and just after it (`0.4`)
    /// truncate to the same second but are kept apart.
    pub fn second_key(&self) -> (bool, i64) {
        (self.elapsed < 0.0, self.whole_second())
    }
}
