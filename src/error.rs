use std::path::PathBuf;

use thiserror::Error;

use crate::types::selection::{IndexRun, describe_runs};

#[derive(Error, Debug)]
pub enum DmcError {
    #[error("Failed to access file {path}: {source}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid frame geometry: {0}")]
    InvalidGeometry(String),

    #[error(
        "Frame {index} is truncated: needed {needed} bytes at offset {offset}, only {available} available"
    )]
    TruncatedFrame {
        index: usize,
        offset: u64,
        needed: usize,
        available: usize,
    },

    #[error(
        "You have requested frames {}, which fall outside the {frame_count} frames in the file",
        describe_runs(.violations)
    )]
    FrameOutOfRange {
        violations: Vec<IndexRun>,
        frame_count: usize,
    },

    #[error("Invalid frame selection: {0}")]
    InvalidSelection(String),

    #[error("Streams share no common time window (latest start {start}, earliest stop {stop})")]
    NoOverlap { start: f64, stop: f64 },

    #[error("Inconsistent frame stack: {0}")]
    InvalidStack(String),

    #[error("Invalid camera stream: {0}")]
    InvalidStream(String),

    #[error("Unsupported timing method: {0}")]
    UnsupportedTiming(String),

    #[error("Could not interpret time {0:?}")]
    InvalidTime(String),

    #[error("Failed to parse camera parameters: {0}")]
    Params(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DmcError>;

/// Conditions that are logged and reported but never stop an operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DmcWarning {
    #[error(
        "File size {file_size} is not a multiple of the {bytes_per_frame} byte frame ({remainder} trailing bytes), check pixel and binning settings"
    )]
    FormatMismatch {
        file_size: u64,
        bytes_per_frame: usize,
        remainder: u64,
    },

    #[error("Extraction will require {bytes} bytes of RAM, above the {threshold} byte threshold")]
    LargeExtraction { bytes: u64, threshold: u64 },
}
