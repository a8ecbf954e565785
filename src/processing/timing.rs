//! Frame time estimation
//!
//! Times are UT1 seconds since the Unix epoch, kept as `f64` so streams can be
//! compared quickly. Without GPS and fire-pulse data the only estimate is the
//! software one: recording start plus the raw counter times the kinetic
//! period. It can be off by more than a minute in absolute terms but is
//! consistent within a recording.

use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{DmcError, Result};

/// Reference instant for UT1 timestamps.
pub const UT1_EPOCH: DateTime<Utc> = DateTime::UNIX_EPOCH;

/// Seconds from [`UT1_EPOCH`] to `time`.
pub fn to_ut1(time: DateTime<Utc>) -> f64 {
    let delta = time.signed_duration_since(UT1_EPOCH);
    delta.num_seconds() as f64 + f64::from(delta.subsec_nanos()) * 1e-9
}

/// Software-only exposure start estimate. Raw counters start at 1.
pub fn estimate_ut1(start_ut1: f64, kinetic_sec: f64, raw_index: u32) -> f64 {
    start_ut1 + (f64::from(raw_index) - 1.0) * kinetic_sec
}

/// Applies [`estimate_ut1`] to each raw counter.
pub fn frame_times(start_ut1: f64, kinetic_sec: f64, raw_indices: &[u32]) -> Vec<f64> {
    raw_indices
        .iter()
        .map(|&raw| estimate_ut1(start_ut1, kinetic_sec, raw))
        .collect()
}

/// Sub-millisecond timing from GPSDO 1PPS and camera fire feedback. Not implemented.
pub fn fire_pulse_timing(_start_ut1: f64, fire_path: &Path) -> Result<Vec<f64>> {
    Err(DmcError::UnsupportedTiming(format!(
        "GPS/fire-pulse timing is not implemented (fire data {})",
        fire_path.display()
    )))
}

/// Parses a time bound given as UT1 seconds or as a UTC date-time.
///
/// Accepted: `1365929665.5`, `2013-04-14T08:54:25Z`, `2013-04-14T08:54:25+00:00`,
/// and zone-less `2013-04-14T08:54:25` / `2013-04-14 08:54:25.5` read as UTC.
pub fn parse_time_bound(text: &str) -> Result<f64> {
    let text = text.trim();

    if let Ok(seconds) = text.parse::<f64>() {
        if seconds.is_finite() {
            return Ok(seconds);
        }
    }

    if let Ok(time) = DateTime::parse_from_rfc3339(text) {
        return Ok(to_ut1(time.with_timezone(&Utc)));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| to_ut1(naive.and_utc()))
        .ok_or_else(|| DmcError::InvalidTime(text.to_string()))
}
