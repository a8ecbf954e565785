//! Byte layout of a packed frame file
//!
//! Each frame record is a row-major payload of 16-bit pixels followed by a
//! 4-byte trailer holding the camera's raw frame counter. There is no
//! file-level header, so the frame count follows from the file size alone.

use bon::bon;
use serde::{Deserialize, Serialize};

use crate::error::{DmcError, DmcWarning, Result};

/// Bits per stored pixel sample.
pub const BITS_PER_PIXEL: usize = 16;
/// Size of the per-frame metadata trailer (two u16 words).
pub const TRAILER_BYTES: usize = 4;
/// Number of u16 words in the trailer.
pub const TRAILER_WORDS: usize = TRAILER_BYTES / 2;

/// Binned image geometry and the frame record size it implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameGeometry {
    pub pixel_width: usize,
    pub pixel_height: usize,
    pub bin_width: usize,
    pub bin_height: usize,
    /// Binned image width (columns).
    pub super_width: usize,
    /// Binned image height (rows).
    pub super_height: usize,
}

#[bon]
impl FrameGeometry {
    /// Binning that does not evenly divide the pixel count truncates.
    #[builder]
    pub fn new(
        pixel_width: usize,
        pixel_height: usize,
        #[builder(default = 1)] bin_width: usize,
        #[builder(default = 1)] bin_height: usize,
    ) -> Result<Self> {
        if bin_width == 0 || bin_height == 0 {
            return Err(DmcError::InvalidGeometry(format!(
                "binning must be at least 1, got {bin_width}x{bin_height}"
            )));
        }

        let super_width = pixel_width / bin_width;
        let super_height = pixel_height / bin_height;
        if super_width == 0 || super_height == 0 {
            return Err(DmcError::InvalidGeometry(format!(
                "{pixel_width}x{pixel_height} pixels binned by {bin_width}x{bin_height} leaves an empty image"
            )));
        }

        Ok(Self {
            pixel_width,
            pixel_height,
            bin_width,
            bin_height,
            super_width,
            super_height,
        })
    }

    pub fn pixels_per_image(&self) -> usize {
        self.super_width * self.super_height
    }

    pub fn bytes_per_image(&self) -> usize {
        self.pixels_per_image() * BITS_PER_PIXEL / 8
    }

    pub fn bytes_per_frame(&self) -> usize {
        self.bytes_per_image() + TRAILER_BYTES
    }

    /// Frame shape as (rows, columns).
    pub fn shape(&self) -> (usize, usize) {
        (self.super_height, self.super_width)
    }

    /// Byte offset of a frame record from the start of the file.
    pub fn frame_offset(&self, index: usize) -> u64 {
        index as u64 * self.bytes_per_frame() as u64
    }

    /// Derives the frame count for a file of `file_size` bytes.
    pub fn layout(&self, file_size: u64) -> Result<FileLayout> {
        if file_size < self.bytes_per_image() as u64 {
            return Err(DmcError::InvalidGeometry(format!(
                "file size {file_size} is smaller than a single {} byte image",
                self.bytes_per_image()
            )));
        }

        let bytes_per_frame = self.bytes_per_frame() as u64;
        let frame_count = (file_size / bytes_per_frame) as usize;
        let remainder = file_size % bytes_per_frame;

        let mut warnings = Vec::new();
        if remainder != 0 {
            let warning = DmcWarning::FormatMismatch {
                file_size,
                bytes_per_frame: self.bytes_per_frame(),
                remainder,
            };
            tracing::warn!("{warning}");
            warnings.push(warning);
        }

        Ok(FileLayout {
            geometry: *self,
            file_size,
            frame_count,
            warnings,
        })
    }
}

/// Geometry resolved against a concrete file size.
#[derive(Debug, Clone, PartialEq)]
pub struct FileLayout {
    pub geometry: FrameGeometry,
    pub file_size: u64,
    pub frame_count: usize,
    pub warnings: Vec<DmcWarning>,
}

impl FileLayout {
    pub fn bytes_per_frame(&self) -> usize {
        self.geometry.bytes_per_frame()
    }

    pub fn is_exact(&self) -> bool {
        self.file_size % self.bytes_per_frame() as u64 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(pw: usize, ph: usize, bw: usize, bh: usize) -> FrameGeometry {
        FrameGeometry::builder()
            .pixel_width(pw)
            .pixel_height(ph)
            .bin_width(bw)
            .bin_height(bh)
            .build()
            .unwrap()
    }

    #[test]
    fn test_bytes_per_frame_formula() {
        for &(pw, ph, bw, bh) in &[(512, 512, 1, 1), (512, 512, 2, 2), (640, 480, 4, 1), (7, 5, 2, 2)] {
            let g = geometry(pw, ph, bw, bh);
            assert_eq!(g.bytes_per_frame(), (pw / bw) * (ph / bh) * 2 + 4);
        }
    }

    #[test]
    fn test_non_exact_binning_truncates() {
        let g = geometry(7, 5, 2, 2);
        assert_eq!(g.shape(), (2, 3));
        assert_eq!(g.pixels_per_image(), 6);
    }

    #[test]
    fn test_default_binning_is_one() {
        let g = FrameGeometry::builder()
            .pixel_width(4)
            .pixel_height(3)
            .build()
            .unwrap();
        assert_eq!((g.bin_width, g.bin_height), (1, 1));
        assert_eq!(g.bytes_per_frame(), 28);
    }

    #[test]
    fn test_zero_binning_rejected() {
        let result = FrameGeometry::builder()
            .pixel_width(4)
            .pixel_height(3)
            .bin_width(0)
            .build();
        assert!(matches!(result, Err(DmcError::InvalidGeometry(_))));
    }

    #[test]
    fn test_frame_count_bounds() {
        let g = geometry(4, 3, 1, 1);
        let bpf = g.bytes_per_frame() as u64;
        for file_size in [24u64, 28, 29, 55, 56, 57, 1000] {
            let layout = g.layout(file_size).unwrap();
            let n = layout.frame_count as u64;
            assert!(n * bpf <= file_size);
            assert!(file_size < (n + 1) * bpf);
        }
    }

    #[test]
    fn test_remainder_warns() {
        let g = geometry(4, 3, 1, 1);
        let exact = g.layout(56).unwrap();
        assert!(exact.warnings.is_empty());
        assert!(exact.is_exact());

        let ragged = g.layout(60).unwrap();
        assert_eq!(ragged.frame_count, 2);
        assert_eq!(
            ragged.warnings,
            vec![DmcWarning::FormatMismatch {
                file_size: 60,
                bytes_per_frame: 28,
                remainder: 4
            }]
        );
    }

    #[test]
    fn test_file_smaller_than_image() {
        let g = geometry(4, 3, 1, 1);
        assert!(matches!(g.layout(23), Err(DmcError::InvalidGeometry(_))));
        // one image without its trailer is accepted but holds no complete frame
        assert_eq!(g.layout(24).unwrap().frame_count, 0);
    }

    #[test]
    fn test_frame_offset() {
        let g = geometry(4, 3, 1, 1);
        assert_eq!(g.frame_offset(0), 0);
        assert_eq!(g.frame_offset(3), 84);
    }
}
