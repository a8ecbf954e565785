//! Decoded frame containers

use ndarray::{Array2, Array3, ArrayView2, Axis};
use serde::Serialize;

use crate::error::{DmcError, Result};

/// One decoded image and its identifiers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedFrame {
    /// Pixel samples, shape (height, width).
    pub pixels: Array2<u16>,
    /// Counter written by the camera into the frame trailer.
    pub raw_index: u32,
    /// Position of the frame in the file.
    pub file_index: usize,
    /// Position of the frame in the requested selection.
    pub relative_index: usize,
}

/// Output buffer of an extraction. Slot `i` holds selection element `i`.
///
/// The frame axis, raw counters and file indices always have the same length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameStack {
    /// Shape (frames, height, width).
    frames: Array3<u16>,
    raw_indices: Vec<u32>,
    file_indices: Vec<usize>,
}

impl FrameStack {
    pub fn new(frames: Array3<u16>, raw_indices: Vec<u32>, file_indices: Vec<usize>) -> Result<Self> {
        let n = frames.len_of(Axis(0));
        if raw_indices.len() != n || file_indices.len() != n {
            return Err(DmcError::InvalidStack(format!(
                "{n} frames with {} raw counters and {} file indices",
                raw_indices.len(),
                file_indices.len()
            )));
        }
        Ok(Self {
            frames,
            raw_indices,
            file_indices,
        })
    }

    pub(crate) fn zeros(file_indices: Vec<usize>, shape: (usize, usize)) -> Self {
        let n = file_indices.len();
        Self {
            frames: Array3::zeros((n, shape.0, shape.1)),
            raw_indices: vec![0; n],
            file_indices,
        }
    }

    /// Pixel buffer and raw counters, for decoders filling the slots.
    pub(crate) fn slots_mut(&mut self) -> (&mut Array3<u16>, &mut [u32]) {
        (&mut self.frames, self.raw_indices.as_mut_slice())
    }

    pub fn frames(&self) -> &Array3<u16> {
        &self.frames
    }

    pub fn raw_indices(&self) -> &[u32] {
        &self.raw_indices
    }

    pub fn file_indices(&self) -> &[usize] {
        &self.file_indices
    }

    pub fn into_frames(self) -> Array3<u16> {
        self.frames
    }

    pub fn len(&self) -> usize {
        self.file_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file_indices.is_empty()
    }

    /// Frame shape as (rows, columns).
    pub fn frame_shape(&self) -> (usize, usize) {
        let (_, h, w) = self.frames.dim();
        (h, w)
    }

    pub fn view(&self, slot: usize) -> Option<ArrayView2<'_, u16>> {
        (slot < self.len()).then(|| self.frames.index_axis(Axis(0), slot))
    }

    /// Copies slot `slot` out as a standalone frame.
    pub fn get(&self, slot: usize) -> Option<DecodedFrame> {
        let pixels = self.view(slot)?.to_owned();
        Some(DecodedFrame {
            pixels,
            raw_index: self.raw_indices[slot],
            file_index: self.file_indices[slot],
            relative_index: slot,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = DecodedFrame> + '_ {
        (0..self.len()).filter_map(move |slot| self.get(slot))
    }

    /// First and last raw counters in the stack.
    pub fn raw_index_span(&self) -> Option<(u32, u32)> {
        Some((*self.raw_indices.first()?, *self.raw_indices.last()?))
    }
}
