//! Frame selection planning
//!
//! Turns a [`FrameSelection`] into the concrete list of file indices to
//! decode. Validation is exhaustive and happens before any frame is read, so
//! a bad request never produces a partially filled output.

use itertools::Itertools;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{DmcError, DmcWarning, Result};
use crate::types::geometry::FileLayout;
use crate::types::selection::{FrameSelection, IndexRun};

/// Extractions estimated above this many bytes are logged as a memory warning.
pub const LARGE_EXTRACTION_BYTES: u64 = 2_000_000_000;

/// A validated extraction: indices in selection order plus the memory estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionPlan {
    pub indices: Vec<usize>,
    pub estimated_bytes: u64,
    #[serde(skip)]
    pub warnings: Vec<DmcWarning>,
}

impl ExtractionPlan {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Describes a selection as one arithmetic run, without bounds checking.
///
/// Nothing is allocated, so the size of the request does not matter here.
pub fn selection_run(selection: &FrameSelection, frame_count: usize) -> Result<IndexRun> {
    match *selection {
        FrameSelection::AllFrames => Ok(IndexRun {
            first: 0,
            stride: 1,
            len: frame_count as u64,
        }),
        FrameSelection::FirstN(count) => Ok(IndexRun {
            first: 0,
            stride: 1,
            len: count as u64,
        }),
        FrameSelection::Range {
            start,
            stop,
            stride,
        } => {
            if stride == 0 {
                return Err(DmcError::InvalidSelection(
                    "frame stride must not be zero".to_string(),
                ));
            }
            let span = if stride > 0 {
                i128::from(stop) - i128::from(start)
            } else {
                i128::from(start) - i128::from(stop)
            };
            let step = i128::from(stride).abs();
            let len = if span > 0 { (span + step - 1) / step } else { 0 };
            Ok(IndexRun {
                first: i128::from(start),
                stride,
                len: len as u64,
            })
        }
    }
}

/// Number of leading terms of `run` that lie before `bound` in the run's direction.
///
/// Ascending runs count terms `< bound`; descending runs count terms `>= bound`.
fn terms_before(run: &IndexRun, bound: i128) -> u64 {
    let step = i128::from(run.stride).abs();
    let distance = if run.stride > 0 {
        bound - run.first
    } else {
        run.first - bound + 1
    };
    if distance <= 0 {
        return 0;
    }
    let terms = (distance + step - 1) / step;
    u64::try_from(terms).unwrap_or(u64::MAX).min(run.len)
}

/// Splits `run` into the terms inside `0..frame_count` and the runs outside it.
///
/// A monotonic run crosses each bound at most once, so the valid terms are
/// contiguous and the violations are at most a leading and a trailing run.
fn split_run(run: &IndexRun, frame_count: usize) -> (IndexRun, Vec<IndexRun>) {
    let n = frame_count as i128;
    let (lo, hi) = if run.stride > 0 {
        (terms_before(run, 0), terms_before(run, n))
    } else {
        (terms_before(run, n), terms_before(run, 0))
    };

    let violations = [run.slice(0, lo), run.slice(hi, run.len)]
        .into_iter()
        .filter(|r| !r.is_empty())
        .collect();
    (run.slice(lo, hi), violations)
}

/// Resolves and validates a selection against a file layout.
pub fn plan_extraction(
    selection: &FrameSelection,
    layout: &FileLayout,
    warn_above_bytes: u64,
) -> Result<ExtractionPlan> {
    let frame_count = layout.frame_count;
    let requested = selection_run(selection, frame_count)?;

    let (valid, violations) = split_run(&requested, frame_count);
    if !violations.is_empty() {
        return Err(DmcError::FrameOutOfRange {
            violations,
            frame_count,
        });
    }

    let indices = valid.iter().map(|i| i as usize).collect();
    Ok(finish_plan(indices, layout, warn_above_bytes))
}

/// File indices of the frames stamped within `[start, stop]`, in file order.
pub fn window_indices(times: &[f64], start: f64, stop: f64) -> Result<Vec<usize>> {
    if !(start.is_finite() && stop.is_finite()) || start > stop {
        return Err(DmcError::InvalidSelection(format!(
            "time window {start}..{stop} is not an ordered pair of finite times"
        )));
    }
    Ok(times
        .iter()
        .positions(|t| (start..=stop).contains(t))
        .collect())
}

/// Plans the frames whose UT1 time falls within `window`, bounds included.
///
/// `times` holds one time per frame of the file. A window that catches no
/// frame gives an empty plan.
pub fn plan_time_window(
    times: &[f64],
    window: (f64, f64),
    layout: &FileLayout,
    warn_above_bytes: u64,
) -> Result<ExtractionPlan> {
    if times.len() != layout.frame_count {
        return Err(DmcError::InvalidSelection(format!(
            "{} frame times given for {} frames",
            times.len(),
            layout.frame_count
        )));
    }
    let indices = window_indices(times, window.0, window.1)?;
    if indices.is_empty() {
        warn!("No frames between UT1 {} and {}", window.0, window.1);
    }
    Ok(finish_plan(indices, layout, warn_above_bytes))
}

fn finish_plan(indices: Vec<usize>, layout: &FileLayout, warn_above_bytes: u64) -> ExtractionPlan {
    let estimated_bytes = indices.len() as u64 * layout.bytes_per_frame() as u64;
    debug!(
        frames = indices.len(),
        estimated_bytes, "Planned extraction of {} frames", indices.len()
    );

    let mut warnings = Vec::new();
    if estimated_bytes > warn_above_bytes {
        let warning = DmcWarning::LargeExtraction {
            bytes: estimated_bytes,
            threshold: warn_above_bytes,
        };
        warn!("{warning}");
        warnings.push(warning);
    }

    ExtractionPlan {
        indices,
        estimated_bytes,
        warnings,
    }
}
