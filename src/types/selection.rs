use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Which frames of a file to extract, in file-relative (not raw counter) indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FrameSelection {
    #[default]
    AllFrames,
    FirstN(usize),
    /// Half-open `start..stop` stepping by `stride`; a negative stride counts down.
    Range { start: i64, stop: i64, stride: i64 },
}

impl FrameSelection {
    pub fn range(start: i64, stop: i64, stride: i64) -> Self {
        Self::Range {
            start,
            stop,
            stride,
        }
    }
}

impl From<usize> for FrameSelection {
    fn from(count: usize) -> Self {
        Self::FirstN(count)
    }
}

impl From<(i64, i64, i64)> for FrameSelection {
    fn from((start, stop, stride): (i64, i64, i64)) -> Self {
        Self::range(start, stop, stride)
    }
}

impl From<Option<FrameSelection>> for FrameSelection {
    fn from(selection: Option<FrameSelection>) -> Self {
        selection.unwrap_or_default()
    }
}

/// An arithmetic run of frame indices: `first`, `first + stride`, ... (`len` terms).
///
/// Indices are `i128` so that every run a [`FrameSelection`] can describe,
/// including `FirstN(usize::MAX)`, is representable without wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRun {
    pub first: i128,
    pub stride: i64,
    pub len: u64,
}

impl IndexRun {
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Term `k` of the run.
    pub fn nth(&self, k: u64) -> i128 {
        self.first + i128::from(k) * i128::from(self.stride)
    }

    pub fn last(&self) -> Option<i128> {
        self.len.checked_sub(1).map(|k| self.nth(k))
    }

    /// Terms `from..to` of the run as a new run.
    pub fn slice(&self, from: u64, to: u64) -> Self {
        Self {
            first: self.nth(from),
            stride: self.stride,
            len: to.saturating_sub(from),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = i128> + '_ {
        (0..self.len).map(move |k| self.nth(k))
    }
}

impl fmt::Display for IndexRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.len, self.last()) {
            (_, None) => write!(f, "none"),
            (1, _) => write!(f, "{}", self.first),
            (_, Some(last)) if self.stride == 1 => write!(f, "{}..={last}", self.first),
            (_, Some(last)) => write!(f, "{}..={last} step {}", self.first, self.stride),
        }
    }
}

/// Human-readable list of runs, e.g. `-2, 6..=8 step 2`.
pub fn describe_runs(runs: &[IndexRun]) -> String {
    runs.iter().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_terms_and_display() {
        let run = IndexRun {
            first: 6,
            stride: 2,
            len: 2,
        };
        assert_eq!(run.iter().collect::<Vec<_>>(), vec![6, 8]);
        assert_eq!(run.to_string(), "6..=8 step 2");

        let single = IndexRun {
            first: -2,
            stride: 2,
            len: 1,
        };
        assert_eq!(describe_runs(&[single, run]), "-2, 6..=8 step 2");
    }

    #[test]
    fn test_run_past_i64() {
        let run = IndexRun {
            first: 5,
            stride: 1,
            len: u64::MAX,
        };
        assert_eq!(run.last(), Some(i128::from(u64::MAX) + 4));
        assert_eq!(run.slice(1, 3).iter().collect::<Vec<_>>(), vec![6, 7]);
    }
}
