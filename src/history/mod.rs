//! Persisted run history.
//!
//! [`HistoryStore`] owns the full [`HistoryTree`] plus the active
//! `(game, category)` path. It loads the backing JSON file (migrating the
//! legacy flat layout once), answers queries over the active category and
//! appends completed runs.
//!
//! Persistence is best-effort: a failed save is logged and reported through
//! [`RecordedRun::persisted`], but never rolls back in-memory state.

mod migrate;
mod queries;

pub use migrate::{is_legacy_layout, load_tree};
pub use queries::{PersonalBest, best_segment, personal_best, sum_of_best};

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::types::{CategoryHistory, HistoryTree, RunRecord, round_centis};
use crate::{Result, SplitsError};

/// Run key layout; sorts chronologically as a string.
pub const RUN_KEY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static EMPTY_HISTORY: CategoryHistory = CategoryHistory::new();

/// Outcome of [`HistoryStore::record_run`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRun {
    pub key: String,
    pub run: RunRecord,
    /// False when the run is only held in memory because the save failed.
    pub persisted: bool,
}

/// Run history for all games, with one active category.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: Option<PathBuf>,
    tree: HistoryTree,
    game: String,
    category: String,
}

impl HistoryStore {
    /// A store with no backing file.
    pub fn in_memory(game: impl Into<String>, category: impl Into<String>) -> Self {
        Self::from_tree(None, HistoryTree::new(), game, category)
    }

    /// Build a store around an existing tree, creating the active path.
    pub fn from_tree(
        path: Option<PathBuf>,
        mut tree: HistoryTree,
        game: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        let game = game.into();
        let category = category.into();
        tree.entry(game.clone()).or_default().entry(category.clone()).or_default();
        Self { path, tree, game, category }
    }

    /// Open the history file at `path`.
    ///
    /// A missing file yields an empty history. A file that cannot be parsed is
    /// moved aside to `<path>.bak` so the next save does not destroy it. A
    /// file that cannot be read, or cannot be moved aside, is left alone and
    /// the store keeps history in memory only. A legacy flat file is migrated
    /// and written back immediately.
    pub fn open(path: impl Into<PathBuf>, game: &str, category: &str) -> Self {
        let path = path.into();

        let raw = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<serde_json::Value>(&bytes) {
                Ok(value) => value,
                Err(e) => {
                    error!("History file {} is not valid JSON: {}", path.display(), e);
                    if !quarantine(&path) {
                        return Self::detached(&path, game, category);
                    }
                    serde_json::Value::Null
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No history file at {}, starting empty", path.display());
                serde_json::Value::Null
            }
            Err(e) => {
                error!("Failed to read history file {}: {}", path.display(), e);
                return Self::detached(&path, game, category);
            }
        };

        let (tree, migrated) = match load_tree(raw, game, category) {
            Ok(loaded) => loaded,
            Err(e) => {
                error!("History file {} has an unexpected layout: {}", path.display(), e);
                if !quarantine(&path) {
                    return Self::detached(&path, game, category);
                }
                (HistoryTree::new(), false)
            }
        };

        let store = Self::from_tree(Some(path), tree, game, category);
        if migrated {
            store.persist();
        }
        store
    }

    /// Empty store with no backing file, for a history file that must not be
    /// overwritten.
    fn detached(path: &Path, game: &str, category: &str) -> Self {
        error!("Runs will not be saved; {} is left untouched", path.display());
        Self::from_tree(None, HistoryTree::new(), game, category)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn tree(&self) -> &HistoryTree {
        &self.tree
    }

    pub fn game(&self) -> &str {
        &self.game
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Switch the active `(game, category)`, creating it if needed.
    pub fn select(&mut self, game: impl Into<String>, category: impl Into<String>) {
        self.game = game.into();
        self.category = category.into();
        self.tree.entry(self.game.clone()).or_default().entry(self.category.clone()).or_default();
    }

    /// Runs of the active category.
    pub fn segment_history(&self) -> &CategoryHistory {
        self.tree
            .get(&self.game)
            .and_then(|categories| categories.get(&self.category))
            .unwrap_or(&EMPTY_HISTORY)
    }

    fn segment_history_mut(&mut self) -> &mut CategoryHistory {
        self.tree.entry(self.game.clone()).or_default().entry(self.category.clone()).or_default()
    }

    /// Write the full tree to the backing file, tab-indented.
    ///
    /// The document is written to a sibling temp file and renamed into place.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| SplitsError::file_error(parent.into(), e))?;
        }

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.tree.serialize(&mut ser).map_err(|e| SplitsError::json_error("history tree", e))?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &buf).map_err(|e| SplitsError::file_error(tmp.clone(), e))?;
        fs::rename(&tmp, path).map_err(|e| SplitsError::file_error(path.clone(), e))?;

        debug!("Saved history ({} bytes) to {}", buf.len(), path.display());
        Ok(())
    }

    /// [`save`](Self::save), logging instead of returning the error.
    pub fn persist(&self) -> bool {
        match self.save() {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to save history: {}", e);
                false
            }
        }
    }

    /// Append a completed run and persist the tree.
    ///
    /// `split_times` are cumulative seconds, one per segment. They are turned
    /// into per-segment durations rounded to two decimals.
    pub fn record_run(
        &mut self,
        segments: &[String],
        split_times: &[f64],
        recorded_at: DateTime<Local>,
    ) -> Result<RecordedRun> {
        if split_times.len() != segments.len() {
            return Err(SplitsError::RunLength {
                expected: segments.len(),
                found: split_times.len(),
            });
        }

        let run: RunRecord = segments
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let prev = if i > 0 { split_times[i - 1] } else { 0.0 };
                (name.as_str(), round_centis((split_times[i] - prev).max(0.0)))
            })
            .collect();

        let history = self.segment_history_mut();
        let key = unique_key(history, recorded_at.format(RUN_KEY_FORMAT).to_string());
        history.insert(key.clone(), run.clone());

        info!(
            "Recorded run {} for {}/{} (total {:.2}s)",
            key,
            self.game,
            self.category,
            run.total()
        );

        let persisted = self.persist();
        Ok(RecordedRun { key, run, persisted })
    }
}

fn unique_key(history: &CategoryHistory, base: String) -> String {
    if !history.contains_key(&base) {
        return base;
    }
    (2..)
        .map(|n| format!("{} #{}", base, n))
        .find(|candidate| !history.contains_key(candidate))
        .unwrap_or(base)
}

fn quarantine(path: &Path) -> bool {
    let backup = path.with_extension("json.bak");
    match fs::rename(path, &backup) {
        Ok(()) => {
            warn!("Moved unreadable history to {}", backup.display());
            true
        }
        Err(e) => {
            error!("Failed to move unreadable history aside: {}", e);
            false
        }
    }
}
