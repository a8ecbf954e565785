use crate::error::{DmcError, DmcWarning, Result};
use crate::parser::{decode_frame_into, frame_record, parse_frame_trailer};
use crate::processing::planner::{ExtractionPlan, plan_extraction, plan_time_window};
use crate::processing::timing::frame_times;
use crate::types::{
    DecodedFrame, FileLayout, FrameGeometry, FrameSelection, FrameStack, ReaderConfig,
};
use crate::utils::file_utils::{file_size, read_binary_file_mmap};
use memmap2::Mmap;
use ndarray::{Array2, ArrayViewMut2, Axis};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

fn decode_slot(
    data: &[u8],
    geometry: &FrameGeometry,
    frame: ArrayViewMut2<'_, u16>,
    raw: &mut u32,
    index: usize,
) -> Result<()> {
    *raw = decode_frame_into(data, geometry, index, frame)?;
    Ok(())
}

/// A memory-mapped packed frame file with its resolved layout.
///
/// The file is never written. Every decode reads from a disjoint region of
/// the shared read-only map, so frames can be decoded from many threads.
pub struct DmcFile {
    path: PathBuf,
    layout: FileLayout,
    config: ReaderConfig,
    raw_index_bounds: Option<(u32, u32)>,
    mmap_data: Mmap,
}

impl DmcFile {
    /// Open a packed frame file and derive its layout from the configured geometry.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, config: ReaderConfig) -> Result<Self> {
        let path = path.as_ref();
        let geometry = config.geometry()?;

        let size = file_size(path)?;
        let layout = geometry.layout(size)?;
        let mmap_data = read_binary_file_mmap(path)?;

        let mut file = Self {
            path: path.to_path_buf(),
            layout,
            config,
            raw_index_bounds: None,
            mmap_data,
        };
        file.raw_index_bounds = file.read_raw_index_bounds()?;

        info!("{} frames in file {}", file.frame_count(), path.display());
        info!("   file size in Bytes: {}", size);
        if let Some((first, last)) = file.raw_index_bounds {
            info!("first / last raw frame #'s: {} / {}", first, last);
        }

        Ok(file)
    }

    fn read_raw_index_bounds(&self) -> Result<Option<(u32, u32)>> {
        match self.frame_count() {
            0 => Ok(None),
            n => Ok(Some((self.raw_index(0)?, self.raw_index(n - 1)?))),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn layout(&self) -> &FileLayout {
        &self.layout
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn geometry(&self) -> &FrameGeometry {
        &self.layout.geometry
    }

    pub fn frame_count(&self) -> usize {
        self.layout.frame_count
    }

    pub fn file_size(&self) -> u64 {
        self.layout.file_size
    }

    pub fn warnings(&self) -> &[DmcWarning] {
        &self.layout.warnings
    }

    /// Raw counters of the first and last frame, if the file holds any frame.
    pub fn raw_index_bounds(&self) -> Option<(u32, u32)> {
        self.raw_index_bounds
    }

    /// Reads only the trailer of frame `index`.
    pub fn raw_index(&self, index: usize) -> Result<u32> {
        let record = frame_record(&self.mmap_data, self.geometry(), index)?;
        let mut trailer = &record[self.geometry().bytes_per_image()..];
        let available = trailer.len();
        parse_frame_trailer(&mut trailer).map_err(|_| DmcError::TruncatedFrame {
            index,
            offset: self.geometry().frame_offset(index),
            needed: self.geometry().bytes_per_frame(),
            available,
        })
    }

    /// Raw counters of every frame in file order.
    pub fn raw_indices(&self) -> Result<Vec<u32>> {
        (0..self.frame_count()).map(|i| self.raw_index(i)).collect()
    }

    /// Decodes a single frame. `relative_index` is 0 since the frame stands alone.
    pub fn read_frame(&self, index: usize) -> Result<DecodedFrame> {
        let mut pixels = Array2::zeros(self.geometry().shape());
        let raw_index = decode_frame_into(&self.mmap_data, self.geometry(), index, pixels.view_mut())?;
        debug!(index, raw_index, "Decoded frame");
        Ok(DecodedFrame {
            pixels,
            raw_index,
            file_index: index,
            relative_index: 0,
        })
    }

    /// Resolves and validates a selection against this file.
    pub fn plan(&self, selection: &FrameSelection) -> Result<ExtractionPlan> {
        plan_extraction(selection, &self.layout, self.config.memory_warning_bytes)
    }

    /// Plans the frames whose estimated UT1 time lies within `window`, bounds included.
    ///
    /// Frame times come from the raw counters, the recording start and the
    /// kinetic period.
    pub fn plan_time_window(
        &self,
        start_ut1: f64,
        kinetic_sec: f64,
        window: (f64, f64),
    ) -> Result<ExtractionPlan> {
        let times = frame_times(start_ut1, kinetic_sec, &self.raw_indices()?);
        plan_time_window(&times, window, &self.layout, self.config.memory_warning_bytes)
    }

    /// Plans, validates and decodes a selection.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn extract(&self, selection: &FrameSelection) -> Result<FrameStack> {
        let plan = self.plan(selection)?;
        self.extract_plan(&plan)
    }

    /// Decodes a validated plan. Slot `i` of the result holds `plan.indices[i]`.
    pub fn extract_plan(&self, plan: &ExtractionPlan) -> Result<FrameStack> {
        info!(
            "Extracting {} frames, totaling {} bytes.",
            plan.len(),
            plan.estimated_bytes
        );

        let mut stack = FrameStack::zeros(plan.indices.clone(), self.geometry().shape());
        let geometry = self.geometry();
        let data: &[u8] = &self.mmap_data;
        let (frames, raw_indices) = stack.slots_mut();

        if self.config.parallel {
            frames
                .axis_iter_mut(Axis(0))
                .into_par_iter()
                .zip(raw_indices.par_iter_mut())
                .zip(plan.indices.par_iter().copied())
                .try_for_each(|((frame, raw), index)| decode_slot(data, geometry, frame, raw, index))?;
        } else {
            for ((frame, raw), index) in frames
                .axis_iter_mut(Axis(0))
                .zip(raw_indices.iter_mut())
                .zip(plan.indices.iter().copied())
            {
                decode_slot(data, geometry, frame, raw, index)?;
            }
        }

        debug!(frames = stack.len(), "Extraction complete");
        Ok(stack)
    }

    /// Get a summary of the file contents
    pub fn summary(&self) -> String {
        let geometry = self.geometry();
        let mut result = String::new();

        result.push_str(&format!("File: {}\n", self.path.display()));
        result.push_str(&format!(
            "  Sensor: {}x{} pixels, binning {}x{}\n",
            geometry.pixel_width, geometry.pixel_height, geometry.bin_width, geometry.bin_height
        ));
        result.push_str(&format!(
            "  Frame size: {}x{} ({} bytes per frame)\n",
            geometry.super_width,
            geometry.super_height,
            geometry.bytes_per_frame()
        ));
        result.push_str(&format!("  Frames: {}\n", self.frame_count()));
        result.push_str(&format!("  File size: {} bytes\n", self.file_size()));
        if let Some((first, last)) = self.raw_index_bounds {
            result.push_str(&format!("  Raw frame counters: {} to {}\n", first, last));
        }
        for warning in self.warnings() {
            result.push_str(&format!("  Warning: {}\n", warning));
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{TestRecording, small_config};

    #[test]
    fn test_open_discovers_layout() {
        let rec = TestRecording::new(4, 3, &[10, 11, 12, 13, 14]);
        let file = DmcFile::open(rec.path(), small_config(4, 3)).unwrap();
        assert_eq!(file.frame_count(), 5);
        assert_eq!(file.file_size(), 5 * 28);
        assert_eq!(file.raw_index_bounds(), Some((10, 14)));
        assert!(file.warnings().is_empty());
        assert!(file.summary().contains("Frames: 5"));
    }

    #[test]
    fn test_read_frame_matches_written() {
        let rec = TestRecording::new(4, 3, &[1, 2, 3]);
        let file = DmcFile::open(rec.path(), small_config(4, 3)).unwrap();
        let frame = file.read_frame(2).unwrap();
        assert_eq!(frame.pixels, rec.frame(2));
        assert_eq!(frame.raw_index, 3);
        assert_eq!(frame.file_index, 2);
    }

    #[test]
    fn test_read_frame_is_idempotent() {
        let rec = TestRecording::new(4, 3, &[7, 8]);
        let file = DmcFile::open(rec.path(), small_config(4, 3)).unwrap();
        assert_eq!(file.read_frame(1).unwrap(), file.read_frame(1).unwrap());
    }

    #[test]
    fn test_read_past_end_is_truncated() {
        let rec = TestRecording::new(4, 3, &[1, 2]);
        let file = DmcFile::open(rec.path(), small_config(4, 3)).unwrap();
        assert!(matches!(
            file.read_frame(2),
            Err(DmcError::TruncatedFrame { index: 2, .. })
        ));
    }

    #[test]
    fn test_large_raw_counter() {
        let rec = TestRecording::new(2, 2, &[0x0001_0002, u32::MAX]);
        let file = DmcFile::open(rec.path(), small_config(2, 2)).unwrap();
        assert_eq!(file.raw_indices().unwrap(), vec![65538, 4_294_967_295]);
    }

    #[test]
    fn test_extract_parallel_and_sequential_agree() {
        let raws: Vec<u32> = (100..140).collect();
        let rec = TestRecording::new(5, 4, &raws);
        let parallel = DmcFile::open(rec.path(), small_config(5, 4)).unwrap();
        let sequential = DmcFile::open(
            rec.path(),
            ReaderConfig {
                parallel: false,
                ..small_config(5, 4)
            },
        )
        .unwrap();

        let selection = FrameSelection::range(30, 2, -3);
        let a = parallel.extract(&selection).unwrap();
        let b = sequential.extract(&selection).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.file_indices(), &[30, 27, 24, 21, 18, 15, 12, 9, 6, 3]);
        assert_eq!(a.raw_indices()[0], 130);
        assert_eq!(a.view(1).unwrap(), rec.frame(27));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = DmcFile::open(dir.path().join("nope.DMCdata"), small_config(4, 3));
        assert!(matches!(result, Err(DmcError::FileAccess { .. })));
    }

    #[test]
    fn test_time_window_selects_by_raw_counter() {
        // Counters skip 4, as when the camera drops a frame
        let rec = TestRecording::new(4, 3, &[1, 2, 3, 5, 6]);
        let file = DmcFile::open(rec.path(), small_config(4, 3)).unwrap();

        let plan = file.plan_time_window(100.0, 0.5, (100.5, 102.0)).unwrap();
        assert_eq!(plan.indices, vec![1, 2, 3]);
        let stack = file.extract_plan(&plan).unwrap();
        assert_eq!(stack.raw_indices(), &[2, 3, 5]);
        assert_eq!(stack.view(2).unwrap(), rec.frame(3));

        let gap = file.plan_time_window(100.0, 0.5, (101.2, 101.4)).unwrap();
        assert!(gap.is_empty());
        assert!(file.extract_plan(&gap).unwrap().is_empty());
    }

    #[test]
    fn test_accessors() {
        let rec = TestRecording::new(4, 3, &[1]);
        let file = DmcFile::open(rec.path(), small_config(4, 3)).unwrap();
        assert_eq!(file.path(), rec.path().as_path());
        assert_eq!(file.layout().frame_count, 1);
        assert!(file.config().parallel);
    }
}
