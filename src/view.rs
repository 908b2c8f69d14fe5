//! Display rows derived from engine state.
//!
//! [`SplitsView::build`] is the read contract for overlays: given a borrowed
//! [`EngineView`] it computes per-segment durations, deltas and gold flags,
//! plus PB and sum-of-best totals. While a comparison snapshot exists every
//! comparison comes from it; otherwise one is captured live from history for
//! the call, and no deltas are shown.

use serde::{Deserialize, Serialize};

use crate::comparison::ComparisonSnapshot;
use crate::engine::EngineView;
use crate::types::{GOLD_TOLERANCE, TimeFormat, format_delta, format_time};

/// Live deltas at or below this are hidden; far ahead usually means the
/// comparison is missing segments.
pub const LIVE_DELTA_FLOOR: f64 = -10.0;

/// What cumulative deltas are measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonMode {
    /// Segments of the personal best run.
    #[default]
    Pb,
    /// Best-ever segments.
    Sob,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaMode {
    /// Segment duration against the best-ever segment.
    Segment,
    /// Elapsed time against the comparison's cumulative time.
    #[default]
    Cumulative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewOptions {
    #[serde(default)]
    pub comparison: ComparisonMode,
    #[serde(default)]
    pub delta: DeltaMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowState {
    Pending,
    Active,
    Done,
}

/// One segment line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentRow {
    pub name: String,
    pub state: RowState,
    /// Completed duration, or the live duration of the active segment.
    pub duration: Option<f64>,
    /// Cumulative split time once completed.
    pub split_time: Option<f64>,
    pub best: Option<f64>,
    /// Cumulative comparison time up to and including this segment.
    pub comparison: Option<f64>,
    pub delta: Option<f64>,
    /// Completed at or under the best-ever segment.
    pub gold: bool,
}

impl SegmentRow {
    pub fn duration_text(&self, decimals: u8) -> String {
        format_time(self.duration.unwrap_or(0.0), TimeFormat::with_decimals(decimals))
    }

    pub fn delta_text(&self) -> Option<String> {
        self.delta.map(format_delta)
    }
}

/// Everything an overlay draws for one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitsView {
    pub game: String,
    pub category: String,
    pub rows: Vec<SegmentRow>,
    pub elapsed: f64,
    pub pb_total: Option<f64>,
    pub sum_of_best: Option<f64>,
}

impl SplitsView {
    pub fn build(view: EngineView<'_>, options: ViewOptions) -> Self {
        let segments = &view.definition.segments;
        let run = view.run;
        let elapsed = view.elapsed();

        let captured;
        let snapshot = match view.comparison {
            Some(snapshot) => snapshot,
            None => {
                captured = ComparisonSnapshot::capture(segments, view.history.segment_history());
                &captured
            }
        };

        let rows = segments
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let prev = if i > 0 { run.split_times.get(i - 1).copied() } else { Some(0.0) };
                let best = snapshot.best(name);
                let comparison = cumulative_comparison(snapshot, segments, i, options);

                let mut row = SegmentRow {
                    name: name.clone(),
                    state: RowState::Pending,
                    duration: None,
                    split_time: None,
                    best,
                    comparison,
                    delta: None,
                    gold: false,
                };

                if let (Some(&split), Some(prev)) = (run.split_times.get(i), prev) {
                    let actual = split - prev;
                    row.state = RowState::Done;
                    row.duration = Some(actual);
                    row.split_time = Some(split);
                    row.gold = best.is_some_and(|b| actual <= b + GOLD_TOLERANCE);
                    row.delta = comparison.map(|comp| match (options.delta, best) {
                        (DeltaMode::Segment, Some(b)) => actual - b,
                        _ => split - comp,
                    });
                } else if run.current_index == Some(i) {
                    let live = elapsed - prev.unwrap_or(0.0);
                    row.state = RowState::Active;
                    row.duration = Some(live);
                    if run.running {
                        row.delta = match (options.delta, best) {
                            (DeltaMode::Segment, Some(b)) => Some(live - b),
                            _ => comparison.map(|comp| elapsed - comp),
                        }
                        .filter(|d| *d > LIVE_DELTA_FLOOR);
                    }
                }

                row
            })
            .collect();

        Self {
            game: view.definition.game.clone(),
            category: view.definition.category.clone(),
            rows,
            elapsed,
            pb_total: snapshot.pb_total,
            sum_of_best: snapshot.sum_of_best(),
        }
    }

    /// Whether the current elapsed time is under the PB total.
    pub fn ahead_of_pb(&self) -> Option<bool> {
        self.pb_total.filter(|t| *t > 0.0).map(|t| self.elapsed < t)
    }
}

fn cumulative_comparison(
    snapshot: &ComparisonSnapshot,
    segments: &[String],
    index: usize,
    options: ViewOptions,
) -> Option<f64> {
    segments
        .iter()
        .take(index + 1)
        .filter_map(|name| match options.comparison {
            ComparisonMode::Pb => snapshot.pb(name),
            ComparisonMode::Sob => snapshot.best(name),
        })
        .fold(None, |acc, secs| Some(acc.unwrap_or(0.0) + secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ManualClock, TimingEngine};
    use crate::history::HistoryStore;
    use crate::test_utils::{local_time, names};
    use crate::types::SplitDefinition;
    use std::sync::Arc;

    /// Engine with one recorded run of A=20, B=30 and a best A of 15 from a
    /// slower run.
    fn engine_with_history() -> (TimingEngine, Arc<ManualClock>) {
        let segments = names(&["A", "B"]);
        let mut history = HistoryStore::in_memory("G", "C");
        history.record_run(&segments, &[20.0, 50.0], local_time("2024-01-01 10:00:00")).unwrap();
        history.record_run(&segments, &[15.0, 60.0], local_time("2024-01-02 10:00:00")).unwrap();

        let clock = Arc::new(ManualClock::new(1_000.0));
        let definition = SplitDefinition::new("G", "C", segments).unwrap();
        (TimingEngine::with_clock(definition, history, clock.clone()), clock)
    }

    #[test]
    fn idle_view_uses_live_history() {
        let (engine, _) = engine_with_history();
        let view = engine.view(ViewOptions::default());

        assert_eq!(view.pb_total, Some(50.0));
        assert_eq!(view.sum_of_best, Some(45.0));
        assert!(view.rows.iter().all(|row| row.state == RowState::Pending));
        assert!(view.rows.iter().all(|row| row.delta.is_none()));
        assert_eq!(view.rows[0].best, Some(15.0));
        assert_eq!(view.rows[0].comparison, Some(20.0));
        assert_eq!(view.rows[1].comparison, Some(50.0));

        let sob =
            engine.view(ViewOptions { comparison: ComparisonMode::Sob, ..Default::default() });
        assert_eq!(sob.rows[0].comparison, Some(15.0));
        assert_eq!(sob.rows[1].comparison, Some(45.0));
    }

    #[test]
    fn cumulative_delta_against_pb() {
        let (engine, clock) = engine_with_history();
        engine.start();
        clock.advance(18.0);
        engine.split();
        clock.advance(5.0);

        let view = engine.view(ViewOptions::default());
        let done = &view.rows[0];
        assert_eq!(done.state, RowState::Done);
        assert_eq!(done.duration, Some(18.0));
        assert_eq!(done.comparison, Some(20.0));
        assert_eq!(done.delta, Some(-2.0));
        assert!(!done.gold);
        assert_eq!(done.delta_text().as_deref(), Some("-2.0"));

        let active = &view.rows[1];
        assert_eq!(active.state, RowState::Active);
        assert_eq!(active.duration, Some(5.0));
        // 23s elapsed against a cumulative PB of 50s is past the floor.
        assert_eq!(active.delta, None);
    }

    #[test]
    fn segment_delta_and_gold() {
        let (engine, clock) = engine_with_history();
        engine.start();
        clock.advance(14.0);
        engine.split();
        clock.advance(31.0);

        let options = ViewOptions { comparison: ComparisonMode::Sob, delta: DeltaMode::Segment };
        let view = engine.view(options);

        let first = &view.rows[0];
        assert!(first.gold);
        assert_eq!(first.delta, Some(-1.0));
        assert_eq!(first.comparison, Some(15.0));

        let active = &view.rows[1];
        assert_eq!(active.delta, Some(1.0));
        assert!(!active.gold);
    }

    #[test]
    fn gold_tolerance_is_inclusive() {
        let (engine, clock) = engine_with_history();
        engine.start();
        clock.advance(15.0005);
        engine.split();

        let view = engine.view(ViewOptions::default());
        assert!(view.rows[0].gold);
    }

    #[test]
    fn totals_stay_frozen_after_finish() {
        let (engine, clock) = engine_with_history();
        engine.start();
        clock.advance(10.0);
        engine.split();
        clock.advance(10.0);
        assert!(engine.split().is_finished());

        let view = engine.view(ViewOptions::default());
        assert_eq!(view.pb_total, Some(50.0));
        assert_eq!(view.sum_of_best, Some(45.0));
        assert_eq!(view.elapsed, 20.0);
        assert_eq!(view.ahead_of_pb(), Some(true));
        assert!(view.rows.iter().all(|row| row.state == RowState::Done));

        engine.reset();
        let idle = engine.view(ViewOptions::default());
        assert_eq!(idle.pb_total, Some(20.0));
        assert_eq!(idle.sum_of_best, Some(20.0));
    }

    #[test]
    fn options_deserialize_from_lowercase() {
        let options: ViewOptions =
            serde_json::from_str(r#"{"comparison":"sob","delta":"segment"}"#).unwrap();
        assert_eq!(options.comparison, ComparisonMode::Sob);
        assert_eq!(options.delta, DeltaMode::Segment);

        let defaults: ViewOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(defaults, ViewOptions::default());
    }
}
