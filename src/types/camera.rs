//! Per-camera stream configuration

use std::path::Path;

use bon::Builder;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{DmcError, Result};

/// Lower and upper percentiles of the first frame used for auto-contrast.
pub const CONTRAST_PERCENTILES: (f64, f64) = (1.0, 99.9);

/// Geometric corrections applied to every frame of a stream, in field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Builder, Serialize, Deserialize)]
pub struct Orientation {
    #[builder(default)]
    pub transpose: bool,
    /// Counter-clockwise quarter turns, taken modulo 4.
    #[builder(default)]
    pub rotate_steps: i32,
    /// Reverse column order.
    #[builder(default)]
    pub mirror_horizontal: bool,
    /// Reverse row order.
    #[builder(default)]
    pub mirror_vertical: bool,
}

impl Orientation {
    pub fn quarter_turns(&self) -> u8 {
        self.rotate_steps.rem_euclid(4) as u8
    }

    pub fn is_identity(&self) -> bool {
        !self.transpose && self.quarter_turns() == 0 && !self.mirror_horizontal && !self.mirror_vertical
    }
}

/// Parameter group stored alongside a recording.
///
/// Field names follow the archive's parameter group. The flags are stored as
/// integers by some writers, so both `0/1` and `false/true` are accepted.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct CameraParams {
    #[serde(rename = "kineticsec")]
    pub kinetic_sec: f64,
    #[serde(rename = "rotccw", default)]
    #[builder(default)]
    pub rotate_steps: i32,
    #[serde(default, deserialize_with = "bool_like")]
    #[builder(default)]
    pub transpose: bool,
    #[serde(rename = "fliplr", default, deserialize_with = "bool_like")]
    #[builder(default)]
    pub mirror_horizontal: bool,
    #[serde(rename = "flipud", default, deserialize_with = "bool_like")]
    #[builder(default)]
    pub mirror_vertical: bool,
}

fn bool_like<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolLike {
        Bool(bool),
        Int(i64),
        Float(f64),
    }

    Ok(match BoolLike::deserialize(deserializer)? {
        BoolLike::Bool(b) => b,
        BoolLike::Int(i) => i == 1,
        BoolLike::Float(f) => f == 1.0,
    })
}

impl CameraParams {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DmcError::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn orientation(&self) -> Orientation {
        Orientation {
            transpose: self.transpose,
            rotate_steps: self.rotate_steps,
            mirror_horizontal: self.mirror_horizontal,
            mirror_vertical: self.mirror_vertical,
        }
    }
}

/// Display intensity limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContrastRange {
    pub low: f64,
    pub high: f64,
}

/// One recording prepared for playback: orientation, cadence and frame times.
#[derive(Debug, Clone, PartialEq, Builder, Serialize)]
pub struct CameraStream {
    #[builder(into)]
    pub name: String,
    /// Raw frame shape as (rows, columns), before orientation.
    pub frame_shape: (usize, usize),
    #[builder(default)]
    pub orientation: Orientation,
    /// Seconds between exposures.
    pub kinetic_sec: f64,
    /// UT1 seconds of each frame, non-decreasing.
    pub timestamps: Vec<f64>,
    pub contrast: Option<ContrastRange>,
}

impl CameraStream {
    /// Checks the invariants the synchronizer relies on.
    pub fn validate(&self) -> Result<()> {
        if self.timestamps.is_empty() {
            return Err(DmcError::InvalidStream(format!(
                "stream {} has no timestamps",
                self.name
            )));
        }
        if !(self.kinetic_sec.is_finite() && self.kinetic_sec > 0.0) {
            return Err(DmcError::InvalidStream(format!(
                "stream {} has kinetic period {}",
                self.name, self.kinetic_sec
            )));
        }
        if self.timestamps.iter().any(|t| !t.is_finite()) {
            return Err(DmcError::InvalidStream(format!(
                "stream {} has non-finite timestamps",
                self.name
            )));
        }
        if self.timestamps.windows(2).any(|w| w[1] < w[0]) {
            return Err(DmcError::InvalidStream(format!(
                "stream {} timestamps decrease",
                self.name
            )));
        }
        Ok(())
    }

    /// First and last timestamp.
    pub fn coverage(&self) -> Option<(f64, f64)> {
        Some((*self.timestamps.first()?, *self.timestamps.last()?))
    }

    pub fn frame_count(&self) -> usize {
        self.timestamps.len()
    }
}
