//! Synthetic recordings for tests

use ndarray::Array2;
use std::path::Path;
use tempfile::TempDir;

use crate::types::ReaderConfig;

/// A packed frame file written to a temporary directory.
///
/// Pixel values are a deterministic function of frame, row and column, so
/// tests can compare decoded frames against `frame(i)`.
pub struct TestRecording {
    dir: TempDir,
    width: usize,
    height: usize,
}

impl TestRecording {
    pub fn new(width: usize, height: usize, raw_indices: &[u32]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let recording = Self { dir, width, height };
        let bytes = recording.encode(raw_indices);
        std::fs::write(recording.path(), bytes).unwrap();
        recording
    }

    /// Writes the recording and then appends `extra` trailing bytes.
    pub fn with_trailing_bytes(width: usize, height: usize, raw_indices: &[u32], extra: usize) -> Self {
        let recording = Self::new(width, height, raw_indices);
        let mut bytes = std::fs::read(recording.path()).unwrap();
        bytes.extend(std::iter::repeat_n(0xAB, extra));
        std::fs::write(recording.path(), bytes).unwrap();
        recording
    }

    pub fn path(&self) -> std::path::PathBuf {
        self.dir.path().join("recording.DMCdata")
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn frame(&self, index: usize) -> Array2<u16> {
        Array2::from_shape_fn((self.height, self.width), |(r, c)| {
            ((index * 977 + r * 31 + c * 7) % 65_536) as u16
        })
    }

    fn encode(&self, raw_indices: &[u32]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for (index, raw) in raw_indices.iter().enumerate() {
            for pixel in self.frame(index).iter() {
                bytes.extend(pixel.to_le_bytes());
            }
            bytes.extend(((raw >> 16) as u16).to_le_bytes());
            bytes.extend(((raw & 0xFFFF) as u16).to_le_bytes());
        }
        bytes
    }
}

/// Unbinned geometry of the given size, decoded in parallel.
pub fn small_config(width: usize, height: usize) -> ReaderConfig {
    ReaderConfig::builder()
        .pixel_width(width)
        .pixel_height(height)
        .build()
}
