//! Reader configuration

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::processing::planner::LARGE_EXTRACTION_BYTES;
use crate::types::geometry::FrameGeometry;

/// How to interpret and extract a packed frame file.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Sensor columns before binning.
    #[builder(default = 512)]
    pub pixel_width: usize,
    /// Sensor rows before binning.
    #[builder(default = 512)]
    pub pixel_height: usize,
    #[builder(default = 1)]
    pub bin_width: usize,
    #[builder(default = 1)]
    pub bin_height: usize,
    /// Extractions estimated above this size are logged as a memory warning.
    #[builder(default = LARGE_EXTRACTION_BYTES)]
    pub memory_warning_bytes: u64,
    /// Decode frames on the rayon pool.
    #[builder(default = true)]
    pub parallel: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ReaderConfig {
    pub fn geometry(&self) -> Result<FrameGeometry> {
        FrameGeometry::builder()
            .pixel_width(self.pixel_width)
            .pixel_height(self.pixel_height)
            .bin_width(self.bin_width)
            .bin_height(self.bin_height)
            .build()
    }
}
