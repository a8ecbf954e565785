//! Camera archives and stream construction
//!
//! An archive is anything that can hand over a camera's frame times, its
//! first frame and its parameter group. [`RawArchive`] derives all three from
//! a raw frame file, a parameter sidecar and the recording start time.

use std::path::Path;

use ndarray::Array2;
use tracing::{debug, instrument};

use crate::dmc_file::DmcFile;
use crate::error::{DmcError, Result};
use crate::processing::timing::frame_times;
use crate::types::{CameraParams, CameraStream, FrameStack};
use crate::utils::misc::contrast_range;

/// Source of one camera's recording.
pub trait CameraArchive {
    /// UT1 seconds of every frame, in frame order.
    fn ut1_unix(&self) -> Result<Vec<f64>>;

    /// Raw frame shape as (rows, columns).
    fn frame_shape(&self) -> (usize, usize);

    fn first_frame(&self) -> Result<Array2<u16>>;

    fn params(&self) -> Result<CameraParams>;
}

/// A raw frame file treated as an archive, timed from its raw counters.
pub struct RawArchive<'a> {
    file: &'a DmcFile,
    params: CameraParams,
    start_ut1: f64,
}

impl<'a> RawArchive<'a> {
    pub fn new(file: &'a DmcFile, params: CameraParams, start_ut1: f64) -> Self {
        Self {
            file,
            params,
            start_ut1,
        }
    }

    /// Reads the parameter group from a JSON sidecar.
    pub fn with_sidecar(file: &'a DmcFile, params_path: impl AsRef<Path>, start_ut1: f64) -> Result<Self> {
        let params = CameraParams::from_json_file(params_path)?;
        Ok(Self::new(file, params, start_ut1))
    }
}

impl RawArchive<'_> {
    /// Decodes the frames stamped within `[start, stop]` UT1 seconds.
    pub fn extract_window(&self, start: f64, stop: f64) -> Result<FrameStack> {
        let plan = self
            .file
            .plan_time_window(self.start_ut1, self.params.kinetic_sec, (start, stop))?;
        self.file.extract_plan(&plan)
    }
}

impl CameraArchive for RawArchive<'_> {
    fn ut1_unix(&self) -> Result<Vec<f64>> {
        let raw = self.file.raw_indices()?;
        Ok(frame_times(self.start_ut1, self.params.kinetic_sec, &raw))
    }

    fn frame_shape(&self) -> (usize, usize) {
        self.file.geometry().shape()
    }

    fn first_frame(&self) -> Result<Array2<u16>> {
        Ok(self.file.read_frame(0)?.pixels)
    }

    fn params(&self) -> Result<CameraParams> {
        Ok(self.params.clone())
    }
}

impl CameraStream {
    /// Builds a validated stream, deriving contrast from percentiles of the first frame.
    #[instrument(skip(archive))]
    pub fn from_archive(
        name: &str,
        archive: &impl CameraArchive,
        percentiles: (f64, f64),
    ) -> Result<Self> {
        let params = archive.params()?;
        let timestamps = archive.ut1_unix()?;
        let first = archive.first_frame()?;
        let contrast = contrast_range(first.view(), percentiles);
        if contrast.is_none() {
            return Err(DmcError::InvalidStream(format!(
                "stream {name} has an empty first frame"
            )));
        }

        let stream = CameraStream::builder()
            .name(name)
            .frame_shape(archive.frame_shape())
            .orientation(params.orientation())
            .kinetic_sec(params.kinetic_sec)
            .timestamps(timestamps)
            .maybe_contrast(contrast)
            .build();
        stream.validate()?;
        debug!(frames = stream.frame_count(), coverage = ?stream.coverage(), "Built camera stream");
        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{TestRecording, small_config};
    use crate::types::{CONTRAST_PERCENTILES, ContrastRange};

    fn params() -> CameraParams {
        CameraParams::builder()
            .kinetic_sec(0.5)
            .rotate_steps(1)
            .build()
    }

    #[test]
    fn test_raw_archive_timestamps() {
        let rec = TestRecording::new(3, 2, &[1, 2, 4]);
        let file = DmcFile::open(rec.path(), small_config(3, 2)).unwrap();
        let archive = RawArchive::new(&file, params(), 100.0);
        assert_eq!(archive.ut1_unix().unwrap(), vec![100.0, 100.5, 101.5]);
        assert_eq!(archive.frame_shape(), (2, 3));
        assert_eq!(archive.first_frame().unwrap(), rec.frame(0));
    }

    #[test]
    fn test_stream_from_archive() {
        let rec = TestRecording::new(3, 2, &[1, 2, 3]);
        let file = DmcFile::open(rec.path(), small_config(3, 2)).unwrap();
        let archive = RawArchive::new(&file, params(), 0.0);

        let stream = CameraStream::from_archive("cam0", &archive, (0.0, 100.0)).unwrap();
        assert_eq!(stream.name, "cam0");
        assert_eq!(stream.orientation.rotate_steps, 1);
        assert_eq!(stream.coverage(), Some((0.0, 1.0)));
        // First frame holds r * 31 + c * 7 for a 2x3 image
        assert_eq!(stream.contrast, Some(ContrastRange { low: 0.0, high: 45.0 }));

        let default = CameraStream::from_archive("cam0", &archive, CONTRAST_PERCENTILES).unwrap();
        let contrast = default.contrast.unwrap();
        assert!(contrast.low > 0.0 && contrast.high < 45.0);
    }

    #[test]
    fn test_sidecar_params() {
        let rec = TestRecording::new(3, 2, &[1]);
        let sidecar = rec.dir().join("params.json");
        std::fs::write(&sidecar, r#"{"kineticsec": 0.25, "fliplr": 1}"#).unwrap();
        let file = DmcFile::open(rec.path(), small_config(3, 2)).unwrap();

        let archive = RawArchive::with_sidecar(&file, &sidecar, 10.0).unwrap();
        let params = archive.params().unwrap();
        assert_eq!(params.kinetic_sec, 0.25);
        assert!(params.mirror_horizontal);
    }

    #[test]
    fn test_bad_kinetic_period_rejected() {
        let rec = TestRecording::new(3, 2, &[1, 2]);
        let file = DmcFile::open(rec.path(), small_config(3, 2)).unwrap();
        let archive = RawArchive::new(&file, CameraParams::builder().kinetic_sec(0.0).build(), 0.0);
        assert!(matches!(
            CameraStream::from_archive("cam", &archive, CONTRAST_PERCENTILES),
            Err(DmcError::InvalidStream(_))
        ));
    }

    #[test]
    fn test_extract_window() {
        let rec = TestRecording::new(3, 2, &[1, 2, 3, 4, 5]);
        let file = DmcFile::open(rec.path(), small_config(3, 2)).unwrap();
        let archive = RawArchive::new(&file, params(), 100.0);

        let stack = archive.extract_window(100.5, 101.5).unwrap();
        assert_eq!(stack.file_indices(), &[1, 2, 3]);
        assert_eq!(stack.view(0).unwrap(), rec.frame(1));
        assert!(archive.extract_window(90.0, 99.0).unwrap().is_empty());
    }
}
