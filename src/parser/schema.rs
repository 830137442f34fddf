//! Positional schema of one DJI telemetry block
//!
//! exiftool `-ee` prints each embedded sample as a run of labelled rows that
//! starts with `Sample Time`. The rows follow a fixed order; the only
//! deviations observed on DJI firmware are a missing `Drone Roll` row and an
//! occasional `Gimbal Roll` or `Warning` row wedged in before the next field.

/// Label that opens every telemetry block
pub const SAMPLE_ANCHOR: &str = "Sample Time";

/// Fields of a `TelemetrySample`, in block order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleField {
    SampleDuration,
    Iso,
    ShutterSpeed,
    FNumber,
    DigitalZoom,
    DroneRoll,
    DronePitch,
    DroneYaw,
    GpsLatitude,
    GpsLongitude,
    AbsoluteAltitude,
    RelativeAltitude,
    GimbalPitch,
    GimbalYaw,
    GpsDateTime,
}

/// How a descriptor treats the row under the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// The row must carry the descriptor's label
    Required,
    /// The row may be absent; the value is then the mean of the previous
    /// block's roll and the next roll found further down the report
    InterpolateIfMissing,
    /// A row with this label may sit in front of the field and is skipped
    SkipPreceding(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub label: &'static str,
    pub field: SampleField,
    pub rule: FieldRule,
}

const fn required(label: &'static str, field: SampleField) -> FieldDescriptor {
    FieldDescriptor {
        label,
        field,
        rule: FieldRule::Required,
    }
}

/// Rows following the `Sample Time` anchor
pub const SAMPLE_SCHEMA: [FieldDescriptor; 15] = [
    required("Sample Duration", SampleField::SampleDuration),
    required("ISO", SampleField::Iso),
    required("Shutter Speed", SampleField::ShutterSpeed),
    required("F Number", SampleField::FNumber),
    required("Digital Zoom", SampleField::DigitalZoom),
    FieldDescriptor {
        label: "Drone Roll",
        field: SampleField::DroneRoll,
        rule: FieldRule::InterpolateIfMissing,
    },
    required("Drone Pitch", SampleField::DronePitch),
    required("Drone Yaw", SampleField::DroneYaw),
    required("GPS Latitude", SampleField::GpsLatitude),
    required("GPS Longitude", SampleField::GpsLongitude),
    required("Absolute Altitude", SampleField::AbsoluteAltitude),
    required("Relative Altitude", SampleField::RelativeAltitude),
    required("Gimbal Pitch", SampleField::GimbalPitch),
    FieldDescriptor {
        label: "Gimbal Yaw",
        field: SampleField::GimbalYaw,
        rule: FieldRule::SkipPreceding("Gimbal Roll"),
    },
    FieldDescriptor {
        label: "GPS Date/Time",
        field: SampleField::GpsDateTime,
        rule: FieldRule::SkipPreceding("Warning"),
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_has_one_descriptor_per_field() {
        let mut seen = std::collections::HashSet::new();
        for d in SAMPLE_SCHEMA.iter() {
            assert!(seen.insert(d.field), "duplicate field {:?}", d.field);
        }
        assert_eq!(seen.len(), 15);
    }

    #[test]
    fn test_only_documented_fields_relax_the_schema() {
        let relaxed: Vec<_> = SAMPLE_SCHEMA
            .iter()
            .filter(|d| d.rule != FieldRule::Required)
            .map(|d| d.label)
            .collect();
        assert_eq!(relaxed, vec!["Drone Roll", "Gimbal Yaw", "GPS Date/Time"]);
        assert_eq!(SAMPLE_SCHEMA[13].rule, FieldRule::SkipPreceding("Gimbal Roll"));
        assert_eq!(SAMPLE_SCHEMA[14].rule, FieldRule::SkipPreceding("Warning"));
    }
}
