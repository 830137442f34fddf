//! Telemetry block parsing
//!
//! Walks the report rows one schema descriptor at a time. Each call to
//! [`parse_block`] takes the carried [`ParserState`] by value and hands back the
//! updated state with the sample, so nothing is shared between runs.

use crate::conversion::parse_angle;
use crate::error::{Result, SyncError, END_OF_REPORT};
use crate::parser::schema::{FieldRule, SampleField, SAMPLE_ANCHOR, SAMPLE_SCHEMA};
use crate::types::{ParsedTelemetry, ParserState, RawRow, TelemetrySample};
use log::{debug, info};

/// Outcome of a non-consuming label check
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookahead<'a> {
    Present(&'a RawRow),
    Missing,
}

/// Read position within the report rows
#[derive(Debug, Clone)]
pub struct RowCursor<'a> {
    rows: &'a [RawRow],
    position: usize,
}

impl<'a> RowCursor<'a> {
    pub fn new(rows: &'a [RawRow], position: usize) -> Self {
        Self { rows, position }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn peek(&self) -> Option<&'a RawRow> {
        self.rows.get(self.position)
    }

    /// Check the row under the cursor without consuming it
    pub fn lookahead(&self, label: &str) -> Lookahead<'a> {
        match self.peek() {
            Some(row) if row.label == label => Lookahead::Present(row),
            _ => Lookahead::Missing,
        }
    }

    pub fn advance(&mut self) {
        self.position += 1;
    }

    /// Consume the row under the cursor, which must carry `label`
    pub fn expect(&mut self, label: &str) -> Result<&'a RawRow> {
        match self.lookahead(label) {
            Lookahead::Present(row) => {
                self.advance();
                Ok(row)
            }
            Lookahead::Missing => Err(self.mismatch(label)),
        }
    }

    /// Next row labelled `label` at or after `from`; not bounded to the current block
    pub fn find_forward(&self, label: &str, from: usize) -> Option<(usize, &'a RawRow)> {
        self.rows
            .iter()
            .enumerate()
            .skip(from)
            .find(|(_, row)| row.label == label)
    }

    fn mismatch(&self, expected: &str) -> SyncError {
        SyncError::StructuralParse {
            position: self.position,
            expected: expected.to_string(),
            observed: self
                .peek()
                .map(|row| row.label.clone())
                .unwrap_or_else(|| END_OF_REPORT.to_string()),
        }
    }
}

/// Collects field values while the schema is walked
#[derive(Debug, Default)]
struct SampleBuilder {
    sample_duration: String,
    iso: String,
    shutter_speed: String,
    f_number: String,
    digital_zoom: String,
    drone_roll: f64,
    drone_pitch: String,
    drone_yaw: String,
    gps_latitude: String,
    gps_longitude: String,
    absolute_altitude: String,
    relative_altitude: String,
    gimbal_pitch: String,
    gimbal_yaw: String,
    gps_date_time: String,
}

impl SampleBuilder {
    fn set_text(&mut self, field: SampleField, value: &str) {
        let slot = match field {
            SampleField::SampleDuration => &mut self.sample_duration,
            SampleField::Iso => &mut self.iso,
            SampleField::ShutterSpeed => &mut self.shutter_speed,
            SampleField::FNumber => &mut self.f_number,
            SampleField::DigitalZoom => &mut self.digital_zoom,
            SampleField::DronePitch => &mut self.drone_pitch,
            SampleField::DroneYaw => &mut self.drone_yaw,
            SampleField::GpsLatitude => &mut self.gps_latitude,
            SampleField::GpsLongitude => &mut self.gps_longitude,
            SampleField::AbsoluteAltitude => &mut self.absolute_altitude,
            SampleField::RelativeAltitude => &mut self.relative_altitude,
            SampleField::GimbalPitch => &mut self.gimbal_pitch,
            SampleField::GimbalYaw => &mut self.gimbal_yaw,
            SampleField::GpsDateTime => &mut self.gps_date_time,
            SampleField::DroneRoll => return,
        };
        *slot = value.to_string();
    }

    fn build(self) -> TelemetrySample {
        TelemetrySample {
            sample_duration: self.sample_duration,
            iso: self.iso,
            shutter_speed: self.shutter_speed,
            f_number: self.f_number,
            digital_zoom: self.digital_zoom,
            drone_roll: self.drone_roll,
            drone_pitch: self.drone_pitch,
            drone_yaw: self.drone_yaw,
            gps_latitude: self.gps_latitude,
            gps_longitude: self.gps_longitude,
            absolute_altitude: self.absolute_altitude,
            relative_altitude: self.relative_altitude,
            gimbal_pitch: self.gimbal_pitch,
            gimbal_yaw: self.gimbal_yaw,
            gps_date_time: self.gps_date_time,
        }
    }
}

/// Parse the block anchored at `anchor`
///
/// Returns the decoded sample and the state to pass to the next block.
pub fn parse_block(
    rows: &[RawRow],
    anchor: usize,
    state: ParserState,
) -> Result<(TelemetrySample, ParserState)> {
    let mut cursor = RowCursor::new(rows, anchor);
    cursor.expect(SAMPLE_ANCHOR)?;

    let mut builder = SampleBuilder::default();

    for descriptor in SAMPLE_SCHEMA.iter() {
        match descriptor.rule {
            FieldRule::Required => {
                let row = cursor.expect(descriptor.label)?;
                builder.set_text(descriptor.field, &row.value);
            }
            FieldRule::SkipPreceding(extra) => {
                if let Lookahead::Present(row) = cursor.lookahead(extra) {
                    debug!(
                        "Skipping '{}' row at {} before '{}'",
                        row.label,
                        cursor.position(),
                        descriptor.label
                    );
                    cursor.advance();
                }
                let row = cursor.expect(descriptor.label)?;
                builder.set_text(descriptor.field, &row.value);
            }
            FieldRule::InterpolateIfMissing => match cursor.lookahead(descriptor.label) {
                Lookahead::Present(row) => {
                    builder.drone_roll = parse_angle(&row.value)?;
                    cursor.advance();
                }
                Lookahead::Missing => {
                    let (next_position, next_row) = cursor
                        .find_forward(descriptor.label, cursor.position() + 1)
                        .ok_or_else(|| cursor.mismatch(descriptor.label))?;
                    let next_roll = parse_angle(&next_row.value)?;
                    builder.drone_roll = (next_roll + state.previous_block_roll) / 2.0;
                    debug!(
                        "Block at {} has no '{}'; interpolated {} from {} and row {} ({})",
                        anchor,
                        descriptor.label,
                        builder.drone_roll,
                        state.previous_block_roll,
                        next_position,
                        next_roll
                    );
                }
            },
        }
    }

    let next_state = ParserState {
        previous_block_roll: builder.drone_roll,
    };
    Ok((builder.build(), next_state))
}

/// Positions of every `Sample Time` row
pub fn find_block_anchors(rows: &[RawRow]) -> Vec<usize> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| row.label == SAMPLE_ANCHOR)
        .map(|(i, _)| i)
        .collect()
}

/// Parse every block of a report in order
///
/// A schema violation anywhere aborts the whole run.
pub fn parse_blocks(rows: &[RawRow]) -> Result<ParsedTelemetry> {
    let anchors = find_block_anchors(rows);
    let mut samples = Vec::with_capacity(anchors.len());
    let mut state = ParserState::default();

    for &anchor in &anchors {
        let (sample, next_state) = parse_block(rows, anchor, state)?;
        samples.push(sample);
        state = next_state;
    }

    let reference_time = samples.first().map(|s| s.gps_date_time.clone());

    info!(
        "Parsed {} telemetry blocks from {} report rows",
        samples.len(),
        rows.len()
    );

    Ok(ParsedTelemetry {
        samples,
        reference_time,
    })
}
