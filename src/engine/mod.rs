//! The run state machine.
//!
//! ```text
//!          start()            split() on last segment
//!   Idle ──────────► Running ────────────────────────► Finished
//!    ▲                │  ▲             (run recorded)     │
//!    │     reset()    │  │ split()                        │
//!    ├────────────────┘  └──── (next segment)             │
//!    └─────────────────────── reset() ────────────────────┘
//! ```
//!
//! A finished run is idle for `start()` but keeps its split times, so the
//! single-button [`TimingEngine::advance`] ignores presses until a reset.
//!
//! [`TimingEngine`] is the single owner of the [`RunState`], the active
//! [`SplitDefinition`], the [`HistoryStore`] and the frozen
//! [`ComparisonSnapshot`]. Every transition runs under one mutex, so device
//! input, socket commands and display reads never observe a half-applied
//! split. Invalid transitions are no-ops reported through outcome enums.

mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::comparison::ComparisonSnapshot;
use crate::history::{HistoryStore, RecordedRun};
use crate::input::InputAction;
use crate::types::SplitDefinition;
use crate::view::{SplitsView, ViewOptions};

/// One attempt's progress.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RunState {
    /// Active segment while running, `None` when idle.
    pub current_index: Option<usize>,
    /// Epoch seconds at which the run started.
    pub start_time: Option<f64>,
    /// Cumulative elapsed seconds, one per completed split.
    pub split_times: Vec<f64>,
    pub running: bool,
}

impl RunState {
    pub fn is_idle(&self) -> bool {
        !self.running && self.current_index.is_none()
    }

    /// Current index with `-1` for idle, as reported over the command socket.
    pub fn index_or_idle(&self) -> i64 {
        self.current_index.map_or(-1, |i| i as i64)
    }

    /// Live elapsed seconds while running, else the finished total, else 0.
    pub fn elapsed_at(&self, now: f64) -> f64 {
        match (self.running, self.start_time) {
            (true, Some(start)) => now - start,
            _ => self.split_times.last().copied().unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
    /// The active definition has no segments to time.
    NoSegments,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SplitOutcome {
    /// Not running; nothing changed.
    Ignored,
    /// Segment `index` completed and the next one is active.
    Split { index: usize, elapsed: f64 },
    /// The last segment completed.
    Finished { total: f64, recorded: Option<RecordedRun> },
}

impl SplitOutcome {
    pub fn is_finished(&self) -> bool {
        matches!(self, SplitOutcome::Finished { .. })
    }
}

/// Result of [`TimingEngine::advance`].
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Start(StartOutcome),
    Split(SplitOutcome),
    Reset,
}

/// Serializable copy of the engine state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunStatus {
    pub running: bool,
    pub current_index: i64,
    pub current_segment: Option<String>,
    pub elapsed: f64,
    pub split_times: Vec<f64>,
    pub segments: Vec<String>,
    pub game: String,
    pub category: String,
}

/// Borrowed view of everything a display needs, taken under the engine lock.
#[derive(Debug, Clone, Copy)]
pub struct EngineView<'a> {
    pub definition: &'a SplitDefinition,
    pub history: &'a HistoryStore,
    pub run: &'a RunState,
    pub comparison: Option<&'a ComparisonSnapshot>,
    pub now: f64,
}

impl EngineView<'_> {
    pub fn elapsed(&self) -> f64 {
        self.run.elapsed_at(self.now)
    }
}

#[derive(Debug)]
struct EngineInner {
    definition: SplitDefinition,
    history: HistoryStore,
    run: RunState,
    comparison: Option<Arc<ComparisonSnapshot>>,
}

/// The run state machine.
pub struct TimingEngine {
    inner: Mutex<EngineInner>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TimingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimingEngine").field("inner", &self.inner).finish_non_exhaustive()
    }
}

impl TimingEngine {
    pub fn new(definition: SplitDefinition, history: HistoryStore) -> Self {
        Self::with_clock(definition, history, Arc::new(SystemClock))
    }

    pub fn with_clock(
        definition: SplitDefinition,
        history: HistoryStore,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Mutex::new(EngineInner {
                definition,
                history,
                run: RunState::default(),
                comparison: None,
            }),
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, EngineInner> {
        // A panic mid-transition cannot leave partial state: fields are only
        // assigned after all fallible work is done.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start a run from idle, freezing comparisons from current history.
    pub fn start(&self) -> StartOutcome {
        let mut inner = self.lock();
        self.start_locked(&mut inner)
    }

    fn start_locked(&self, inner: &mut EngineInner) -> StartOutcome {
        if inner.run.running {
            debug!("Start ignored: run already in progress");
            return StartOutcome::AlreadyRunning;
        }
        if inner.definition.is_empty() {
            warn!("Start ignored: no segments defined for {}", inner.definition.category);
            return StartOutcome::NoSegments;
        }

        let snapshot = ComparisonSnapshot::capture(
            &inner.definition.segments,
            inner.history.segment_history(),
        );
        let now = self.clock.now();

        inner.comparison = Some(Arc::new(snapshot));
        inner.run = RunState {
            current_index: Some(0),
            start_time: Some(now),
            split_times: Vec::new(),
            running: true,
        };

        info!(
            "Run started: {} / {} ({} segments)",
            inner.definition.game,
            inner.definition.category,
            inner.definition.len()
        );
        StartOutcome::Started
    }

    /// Record a split. Completing the last segment ends the run and writes it
    /// to history.
    pub fn split(&self) -> SplitOutcome {
        let mut inner = self.lock();
        self.split_locked(&mut inner)
    }

    fn split_locked(&self, inner: &mut EngineInner) -> SplitOutcome {
        let (Some(index), Some(start), true) =
            (inner.run.current_index, inner.run.start_time, inner.run.running)
        else {
            debug!("Split ignored: timer not running");
            return SplitOutcome::Ignored;
        };

        let elapsed = self.clock.now() - start;
        inner.run.split_times.push(elapsed);

        if index + 1 < inner.definition.len() {
            inner.run.current_index = Some(index + 1);
            debug!("Split {} at {:.3}s", index, elapsed);
            return SplitOutcome::Split { index, elapsed };
        }

        inner.run.running = false;
        inner.run.current_index = None;

        let recorded_at = self.clock.local_now();
        let EngineInner { definition, history, run, .. } = inner;
        let recorded = match history.record_run(&definition.segments, &run.split_times, recorded_at)
        {
            Ok(recorded) => Some(recorded),
            Err(e) => {
                warn!("Finished run was not recorded: {}", e);
                None
            }
        };

        info!("Run finished in {:.3}s", elapsed);
        SplitOutcome::Finished { total: elapsed, recorded }
    }

    /// Single-button behaviour: start from a fresh idle state, split while
    /// running. A finished run ignores the button until it is reset.
    pub fn advance(&self) -> Transition {
        let mut inner = self.lock();
        if inner.run.running {
            Transition::Split(self.split_locked(&mut inner))
        } else if inner.run.split_times.is_empty() {
            Transition::Start(self.start_locked(&mut inner))
        } else {
            debug!("Split ignored: run finished, waiting for reset");
            Transition::Split(SplitOutcome::Ignored)
        }
    }

    /// Return to idle, discarding splits and the frozen comparison. Nothing is
    /// written to history. Returns whether there was anything to discard.
    pub fn reset(&self) -> bool {
        let mut inner = self.lock();
        let had_state = !inner.run.is_idle() || !inner.run.split_times.is_empty();
        inner.run = RunState::default();
        inner.comparison = None;
        if had_state {
            info!("Run reset");
        }
        had_state
    }

    /// Apply a classified input action.
    pub fn apply(&self, action: InputAction) -> Transition {
        match action {
            InputAction::Split => self.advance(),
            InputAction::Reset => {
                self.reset();
                Transition::Reset
            }
        }
    }

    /// Live elapsed seconds while running, else the finished total, else 0.
    pub fn elapsed(&self) -> f64 {
        let now = self.clock.now();
        self.lock().run.elapsed_at(now)
    }

    pub fn run_state(&self) -> RunState {
        self.lock().run.clone()
    }

    /// The comparison frozen at the last start, if not reset since.
    pub fn comparison(&self) -> Option<Arc<ComparisonSnapshot>> {
        self.lock().comparison.clone()
    }

    pub fn definition(&self) -> SplitDefinition {
        self.lock().definition.clone()
    }

    pub fn status(&self) -> RunStatus {
        let now = self.clock.now();
        let inner = self.lock();
        RunStatus {
            running: inner.run.running,
            current_index: inner.run.index_or_idle(),
            current_segment: inner
                .run
                .current_index
                .and_then(|i| inner.definition.segment(i))
                .map(str::to_string),
            elapsed: inner.run.elapsed_at(now),
            split_times: inner.run.split_times.clone(),
            segments: inner.definition.segments.clone(),
            game: inner.definition.game.clone(),
            category: inner.definition.category.clone(),
        }
    }

    /// Run `f` against a consistent view of the engine.
    pub fn read<R>(&self, f: impl FnOnce(EngineView<'_>) -> R) -> R {
        let now = self.clock.now();
        let inner = self.lock();
        f(EngineView {
            definition: &inner.definition,
            history: &inner.history,
            run: &inner.run,
            comparison: inner.comparison.as_deref(),
            now,
        })
    }

    /// Compute display rows for the current state.
    pub fn view(&self, options: ViewOptions) -> SplitsView {
        self.read(|view| SplitsView::build(view, options))
    }

    /// Replace the definition and history wholesale. Any run in progress is
    /// discarded.
    pub fn reload(&self, definition: SplitDefinition, history: HistoryStore) {
        let mut inner = self.lock();
        if inner.run.running {
            warn!("Reloading splits discards the run in progress");
        }
        inner.definition = definition;
        inner.history = history;
        inner.run = RunState::default();
        inner.comparison = None;
    }
}
