//! Multi-camera time alignment
//!
//! Streams are aligned on the window every stream covers. Playback advances
//! at the finest kinetic period among the streams, and at every tick each
//! stream contributes the recorded frame nearest in time. Pixel data is never
//! interpolated.

use itertools::Itertools;
use ndarray::{Array2, ArrayView2};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::error::{DmcError, Result};
use crate::processing::orientation::orient;
use crate::types::camera::CameraStream;
use crate::types::frame::FrameStack;

/// Slack when deciding whether the last tick still falls inside the window.
const TICK_EPSILON: f64 = 1e-9;

/// Shared playback window and its ticks, in UT1 seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncWindow {
    pub start: f64,
    pub stop: f64,
    /// Playback step: the smallest kinetic period among the streams.
    pub tick: f64,
    pub ticks: Vec<f64>,
}

/// Frame choice for every stream at every tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncPlan {
    pub window: SyncWindow,
    pub stream_names: Vec<String>,
    /// One entry per tick, holding one frame index per stream (input order).
    pub alignments: Vec<Vec<usize>>,
}

/// Index of the frame closest in time to `t`; ties go to the earlier frame.
///
/// `timestamps` must be non-empty and non-decreasing.
pub fn nearest_frame(timestamps: &[f64], t: f64) -> usize {
    let after = timestamps.partition_point(|&ts| ts < t);
    let best = if after == 0 {
        0
    } else if after == timestamps.len() {
        timestamps.len() - 1
    } else if timestamps[after] - t < t - timestamps[after - 1] {
        after
    } else {
        after - 1
    };
    // repeated timestamps resolve to their first frame
    timestamps.partition_point(|&ts| ts < timestamps[best])
}

/// Intersects the coverage of every stream and the optional `(start, stop)` clip.
pub fn sync_window(streams: &[CameraStream], clip: Option<(f64, f64)>) -> Result<SyncWindow> {
    if streams.is_empty() {
        return Err(DmcError::InvalidStream("no streams to synchronize".to_string()));
    }
    for stream in streams {
        stream.validate()?;
    }

    let (mut start, mut stop) = streams
        .iter()
        .filter_map(CameraStream::coverage)
        .fold((f64::NEG_INFINITY, f64::INFINITY), |(start, stop), (first, last)| {
            (start.max(first), stop.min(last))
        });

    if let Some((clip_start, clip_stop)) = clip {
        start = start.max(clip_start);
        stop = stop.min(clip_stop);
    }

    if !(start <= stop) {
        return Err(DmcError::NoOverlap { start, stop });
    }

    let tick = streams
        .iter()
        .map(|s| s.kinetic_sec)
        .fold(f64::INFINITY, f64::min);

    let steps = ((stop - start) / tick + TICK_EPSILON).floor() as usize;
    let ticks = (0..=steps).map(|k| start + k as f64 * tick).collect();

    Ok(SyncWindow {
        start,
        stop,
        tick,
        ticks,
    })
}

/// Computes the window and the per-tick frame alignment.
#[instrument(skip(streams), fields(streams = streams.len()))]
pub fn synchronize(streams: &[CameraStream], clip: Option<(f64, f64)>) -> Result<SyncPlan> {
    let window = sync_window(streams, clip)?;

    let alignments = window
        .ticks
        .iter()
        .map(|&t| {
            streams
                .iter()
                .map(|s| nearest_frame(&s.timestamps, t))
                .collect_vec()
        })
        .collect_vec();

    info!(
        start = window.start,
        stop = window.stop,
        tick = window.tick,
        "Synchronized {} streams over {} ticks",
        streams.len(),
        window.ticks.len()
    );

    Ok(SyncPlan {
        window,
        stream_names: streams.iter().map(|s| s.name.clone()).collect(),
        alignments,
    })
}

impl SyncPlan {
    pub fn len(&self) -> usize {
        self.alignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alignments.is_empty()
    }

    /// Per stream, the first and last frame used during playback.
    pub fn frame_spans(&self) -> Vec<(usize, usize)> {
        (0..self.stream_names.len())
            .map(|s| {
                self.alignments
                    .iter()
                    .map(|tuple| tuple[s])
                    .minmax()
                    .into_option()
                    .unwrap_or((0, 0))
            })
            .collect()
    }

    fn check_stacks(&self, stacks: &[FrameStack]) -> Result<()> {
        if stacks.len() != self.stream_names.len() {
            return Err(DmcError::InvalidStream(format!(
                "{} frame stacks given for {} streams",
                stacks.len(),
                self.stream_names.len()
            )));
        }
        for ((name, stack), (_, last)) in self.stream_names.iter().zip(stacks).zip(self.frame_spans()) {
            if !self.is_empty() && last >= stack.len() {
                return Err(DmcError::InvalidStream(format!(
                    "stream {name} needs frame {last} but only {} are loaded",
                    stack.len()
                )));
            }
        }
        Ok(())
    }

    /// Borrows the aligned frames for every tick from per-stream stacks.
    ///
    /// Stack slot `i` must hold the frame stamped `timestamps[i]` of its stream.
    pub fn frame_tuples<'a>(
        &'a self,
        stacks: &'a [FrameStack],
    ) -> Result<impl Iterator<Item = (f64, Vec<ArrayView2<'a, u16>>)> + 'a> {
        self.check_stacks(stacks)?;
        debug!("Gathering {} synchronized frame tuples", self.len());

        Ok(self
            .window
            .ticks
            .iter()
            .zip(&self.alignments)
            .map(move |(&t, tuple)| {
                let frames = tuple
                    .iter()
                    .zip(stacks)
                    .filter_map(|(&slot, stack)| stack.view(slot))
                    .collect();
                (t, frames)
            }))
    }

    /// Like [`SyncPlan::frame_tuples`], with each stream's orientation applied.
    pub fn oriented_tuples<'a>(
        &'a self,
        streams: &'a [CameraStream],
        stacks: &'a [FrameStack],
    ) -> Result<impl Iterator<Item = (f64, Vec<Array2<u16>>)> + 'a> {
        let tuples = self.frame_tuples(stacks)?;
        Ok(tuples.map(move |(t, frames)| {
            let oriented = frames
                .iter()
                .zip(streams)
                .map(|(frame, stream)| orient(frame, &stream.orientation))
                .collect();
            (t, oriented)
        }))
    }
}
