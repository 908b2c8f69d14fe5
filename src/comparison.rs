//! Comparison data frozen at run start.
//!
//! A [`ComparisonSnapshot`] copies the PB run's segments, each segment's best
//! ever and the PB total out of the history when a run starts. It owns its
//! values, so runs recorded afterwards (including the one in progress) cannot
//! move the targets shown during the run.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::history::{best_segment, personal_best};
use crate::types::CategoryHistory;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ComparisonSnapshot {
    /// Segment durations of the fastest total run.
    pub pb_segments: BTreeMap<String, f64>,
    /// Minimum duration ever recorded per segment.
    pub best_segments: BTreeMap<String, f64>,
    /// Total of the fastest run, if any run exists.
    pub pb_total: Option<f64>,
}

impl ComparisonSnapshot {
    /// Capture comparisons for `segments` from `history`.
    pub fn capture(segments: &[String], history: &CategoryHistory) -> Self {
        let pb = personal_best(history);
        let mut snapshot = Self { pb_total: pb.map(|p| p.total), ..Self::default() };

        for (i, name) in segments.iter().enumerate() {
            if let Some(best) = best_segment(i, segments, history) {
                snapshot.best_segments.insert(name.clone(), best);
            }
            if let Some(seconds) = pb.and_then(|p| p.run.get(name)) {
                snapshot.pb_segments.insert(name.clone(), seconds);
            }
        }

        snapshot
    }

    /// Sum of best segments, or `None` when no segment has a best.
    pub fn sum_of_best(&self) -> Option<f64> {
        if self.best_segments.is_empty() {
            None
        } else {
            Some(self.best_segments.values().sum())
        }
    }

    pub fn best(&self, segment: &str) -> Option<f64> {
        self.best_segments.get(segment).copied()
    }

    pub fn pb(&self, segment: &str) -> Option<f64> {
        self.pb_segments.get(segment).copied()
    }
}
