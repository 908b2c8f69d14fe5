//! Read-only queries over a category's run history.
//!
//! These work on any [`CategoryHistory`], not just the store's active one, so
//! comparison snapshots and views can be computed from detached copies.

use crate::types::{CategoryHistory, RunRecord};

/// The fastest complete run in a history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PersonalBest<'a> {
    pub key: &'a str,
    pub run: &'a RunRecord,
    pub total: f64,
}

/// Minimum recorded duration for `segments[index]` across all runs.
///
/// Returns `None` when the index is out of range or no run has the segment.
pub fn best_segment(index: usize, segments: &[String], history: &CategoryHistory) -> Option<f64> {
    let name = segments.get(index)?;
    history.values().filter_map(|run| run.get(name)).reduce(f64::min)
}

/// The run with the smallest total.
///
/// Ties keep the earliest run key; keys are timestamps so this is the oldest
/// of the tied runs.
pub fn personal_best(history: &CategoryHistory) -> Option<PersonalBest<'_>> {
    let mut best: Option<PersonalBest<'_>> = None;
    for (key, run) in history {
        let total = run.total();
        if best.is_none_or(|b| total < b.total) {
            best = Some(PersonalBest { key, run, total });
        }
    }
    best
}

/// Sum of each segment's best-ever duration, skipping segments never run.
///
/// Returns `None` when no segment has a recorded best.
pub fn sum_of_best(segments: &[String], history: &CategoryHistory) -> Option<f64> {
    (0..segments.len())
        .filter_map(|i| best_segment(i, segments, history))
        .fold(None, |acc, best| Some(acc.unwrap_or(0.0) + best))
}
