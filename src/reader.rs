//! Cursor-based frame reading for any seekable byte source

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

use crate::error::{DmcError, Result};
use crate::parser::parse_frame_into;
use crate::processing::planner::plan_extraction;
use crate::types::{DecodedFrame, FileLayout, FrameGeometry, FrameSelection, FrameStack};

/// Reads frames through its own cursor, one record at a time.
///
/// Unlike [`crate::DmcFile`] this never maps the file, so it also works on
/// in-memory buffers and streams that only support `Read + Seek`.
pub struct FrameReader<R> {
    inner: R,
    layout: FileLayout,
    buffer: Vec<u8>,
}

impl FrameReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>, geometry: FrameGeometry) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DmcError::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(BufReader::new(file), geometry)
    }
}

impl<R: Read + Seek> FrameReader<R> {
    pub fn new(mut inner: R, geometry: FrameGeometry) -> Result<Self> {
        let size = inner.seek(SeekFrom::End(0))?;
        let layout = geometry.layout(size)?;
        let buffer = vec![0; layout.bytes_per_frame()];
        Ok(Self {
            inner,
            layout,
            buffer,
        })
    }

    pub fn layout(&self) -> &FileLayout {
        &self.layout
    }

    pub fn frame_count(&self) -> usize {
        self.layout.frame_count
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn fill_record(&mut self, index: usize) -> Result<()> {
        let geometry = &self.layout.geometry;
        let offset = geometry.frame_offset(index);
        self.inner.seek(SeekFrom::Start(offset))?;
        match self.inner.read_exact(&mut self.buffer) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(DmcError::TruncatedFrame {
                index,
                offset,
                needed: geometry.bytes_per_frame(),
                available: self.layout.file_size.saturating_sub(offset) as usize,
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn decode_into(&mut self, index: usize, out: ndarray::ArrayViewMut2<'_, u16>) -> Result<u32> {
        self.fill_record(index)?;
        let mut record = self.buffer.as_slice();
        parse_frame_into(&mut record, out).map_err(|_| DmcError::TruncatedFrame {
            index,
            offset: self.layout.geometry.frame_offset(index),
            needed: self.layout.bytes_per_frame(),
            available: self.buffer.len(),
        })
    }

    pub fn read_frame(&mut self, index: usize) -> Result<DecodedFrame> {
        let mut pixels = ndarray::Array2::zeros(self.layout.geometry.shape());
        let raw_index = self.decode_into(index, pixels.view_mut())?;
        Ok(DecodedFrame {
            pixels,
            raw_index,
            file_index: index,
            relative_index: 0,
        })
    }

    /// Plans and decodes a selection sequentially through the cursor.
    pub fn read_selection(
        &mut self,
        selection: &FrameSelection,
        warn_above_bytes: u64,
    ) -> Result<FrameStack> {
        let plan = plan_extraction(selection, &self.layout, warn_above_bytes)?;
        let mut stack = FrameStack::zeros(plan.indices.clone(), self.layout.geometry.shape());
        let (frames, raw_indices) = stack.slots_mut();
        for ((frame, raw), &index) in frames
            .axis_iter_mut(ndarray::Axis(0))
            .zip(raw_indices.iter_mut())
            .zip(&plan.indices)
        {
            *raw = self.decode_into(index, frame)?;
        }
        debug!(frames = stack.len(), "Read selection through cursor");
        Ok(stack)
    }
}
