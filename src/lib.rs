//! Reader for packed high-speed camera frame files.
//!
//! A `.DMCdata` file is a bare sequence of frame records, each holding a
//! little-endian `u16` image followed by a 4-byte trailer with the camera's
//! raw frame counter. There is no file header, so the image geometry comes
//! from the caller ([`ReaderConfig`]).
//!
//! [`DmcFile`] memory-maps a file and decodes validated selections, in
//! parallel by default. [`FrameReader`] does the same through a plain
//! `Read + Seek` cursor. Decoded streams from several cameras are aligned in
//! time with [`synchronize`].

pub mod archive;
pub mod dmc_file;
pub mod error;
pub mod logger;
pub mod parser;
pub mod processing;
pub mod reader;
pub mod types;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_utils;

pub use archive::{CameraArchive, RawArchive};
pub use dmc_file::DmcFile;
pub use error::{DmcError, DmcWarning, Result};
pub use processing::{
    ExtractionPlan, SyncPlan, SyncWindow, orient, parse_time_bound, plan_extraction, plan_time_window,
    synchronize,
};
pub use reader::FrameReader;
pub use types::{
    CONTRAST_PERCENTILES, CameraParams, CameraStream, ContrastRange, DecodedFrame, FileLayout,
    FrameGeometry, FrameSelection, FrameStack, IndexRun, Orientation, ReaderConfig,
};
