//! Frame/telemetry synchronization
//!
//! Telemetry arrives at the video frame rate while frames are sampled at
//! roughly 1 Hz. Samples are keyed by elapsed seconds since the first block,
//! thinned to one per whole second and then paired with frames by position.

use crate::conversion::{dms_pair_to_decimal, elapsed_seconds};
use crate::error::{Result, SyncError};
use crate::types::{frame_file_name, ElapsedKeyedSample, ParsedTelemetry, SyncRecord};
use log::{debug, warn};
use std::collections::HashSet;

/// Key every sample by seconds elapsed since `reference`
pub fn key_by_elapsed(telemetry: &ParsedTelemetry) -> Result<Vec<ElapsedKeyedSample>> {
    let reference = match &telemetry.reference_time {
        Some(reference) => reference,
        None => return Ok(Vec::new()),
    };

    telemetry
        .samples
        .iter()
        .map(|sample| {
            Ok(ElapsedKeyedSample {
                elapsed: elapsed_seconds(reference, &sample.gps_date_time)?,
                sample: sample.clone(),
            })
        })
        .collect()
}

/// Keep the first sample of every whole elapsed second, preserving order
pub fn dedupe(samples: Vec<ElapsedKeyedSample>) -> Vec<ElapsedKeyedSample> {
    let mut seen_seconds = HashSet::new();
    let total = samples.len();

    let kept: Vec<_> = samples
        .into_iter()
        .filter(|keyed| seen_seconds.insert(keyed.second_key()))
        .collect();

    debug!("Deduplicated {} samples down to {}", total, kept.len());
    kept
}

/// Compare the extracted frame count with the deduplicated sample count
///
/// A mismatch is an error when `strict`, otherwise it is logged and the
/// records are paired by position anyway.
pub fn check_alignment(frames: usize, samples: usize, strict: bool) -> Result<()> {
    if frames == samples {
        return Ok(());
    }
    if strict {
        return Err(SyncError::Misaligned { frames, samples });
    }
    warn!(
        "{} extracted frames vs {} telemetry samples; pairing by position",
        frames, samples
    );
    Ok(())
}

/// Turn deduplicated samples into output records, re-enumerating frame names from 0
pub fn build_records(
    samples: &[ElapsedKeyedSample],
    image_extension: &str,
) -> Result<Vec<SyncRecord>> {
    samples
        .iter()
        .enumerate()
        .map(|(index, keyed)| {
            let (latitude, longitude) =
                dms_pair_to_decimal(&keyed.sample.gps_latitude, &keyed.sample.gps_longitude)?;
            Ok(SyncRecord {
                image_name: frame_file_name(index, image_extension),
                elapsed: keyed.elapsed,
                latitude,
                longitude,
                sample: keyed.sample.clone(),
            })
        })
        .collect()
}

/// Key, deduplicate and convert parsed telemetry in one pass
pub fn synchronize(telemetry: &ParsedTelemetry, image_extension: &str) -> Result<Vec<SyncRecord>> {
    let keyed = key_by_elapsed(telemetry)?;
    let deduped = dedupe(keyed);
    build_records(&deduped, image_extension)
}
