use crate::types::TelemetrySample;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Column order of the synchronized tabular output
pub const RECORD_COLUMNS: [&str; 17] = [
    "Image Name",
    "Sample Time",
    "Sample Duration",
    "ISO",
    "Shutter Speed",
    "F Number",
    "Digital Zoom",
    "Drone Roll",
    "Drone Pitch",
    "Drone Yaw",
    "GPS Latitude",
    "GPS Longitude",
    "Absolute Altitude",
    "Relative Altitude",
    "Gimbal Pitch",
    "Gimbal Yaw",
    "GPS Date/Time",
];

/// One synchronized output row: a frame name paired with its telemetry
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SyncRecord {
    pub image_name: String,
    pub elapsed: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub sample: TelemetrySample,
}

impl SyncRecord {
    /// Field values in `RECORD_COLUMNS` order
    pub fn to_row(&self) -> Vec<String> {
        let s = &self.sample;
        vec![
            self.image_name.clone(),
            self.elapsed.to_string(),
            s.sample_duration.clone(),
            s.iso.clone(),
            s.shutter_speed.clone(),
            s.f_number.clone(),
            s.digital_zoom.clone(),
            s.drone_roll.to_string(),
            s.drone_pitch.clone(),
            s.drone_yaw.clone(),
            self.latitude.to_string(),
            self.longitude.to_string(),
            s.absolute_altitude.clone(),
            s.relative_altitude.clone(),
            s.gimbal_pitch.clone(),
            s.gimbal_yaw.clone(),
            s.gps_date_time.clone(),
        ]
    }
}
