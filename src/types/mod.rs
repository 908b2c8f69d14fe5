//! Core data types for split definitions and run history.
//!
//! - [`SplitDefinition`] is the ordered list of segment names for one
//!   `(game, category)` pair
//! - [`RunRecord`] maps segment name to segment duration (seconds) for one
//!   completed run
//! - [`CategoryHistory`] maps run keys (local timestamps) to runs
//! - [`HistoryTree`] nests categories under games
//!
//! All maps are ordered. Run keys are `%Y-%m-%d %H:%M:%S` timestamps, so
//! iterating a [`CategoryHistory`] visits runs oldest first.

mod seconds;

pub use seconds::{GOLD_TOLERANCE, TimeFormat, format_delta, format_time, round_centis};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::{Result, SplitsError};

/// Ordered segment names for one `(game, category)` pair.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SplitDefinition {
    pub game: String,
    pub category: String,
    pub image: Option<PathBuf>,
    pub segments: Vec<String>,
}

impl SplitDefinition {
    /// Build a definition, rejecting empty segment names.
    pub fn new(
        game: impl Into<String>,
        category: impl Into<String>,
        segments: Vec<String>,
    ) -> Result<Self> {
        if let Some(pos) = segments.iter().position(|name| name.trim().is_empty()) {
            return Err(SplitsError::invalid_definition(format!(
                "segment {} has an empty name",
                pos
            )));
        }
        Ok(Self { game: game.into(), category: category.into(), image: None, segments })
    }

    pub fn with_image(mut self, image: impl Into<PathBuf>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segment(&self, index: usize) -> Option<&str> {
        self.segments.get(index).map(String::as_str)
    }
}

/// Segment durations of one completed run, keyed by segment name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunRecord(BTreeMap<String, f64>);

impl RunRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, segment: impl Into<String>, seconds: f64) {
        self.0.insert(segment.into(), seconds);
    }

    pub fn get(&self, segment: &str) -> Option<f64> {
        self.0.get(segment).copied()
    }

    pub fn contains(&self, segment: &str) -> bool {
        self.0.contains_key(segment)
    }

    /// Sum of all segment durations.
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, secs)| (name.as_str(), *secs))
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for RunRecord {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(name, secs)| (name.into(), secs)).collect())
    }
}

/// Runs of one category, keyed by run timestamp.
pub type CategoryHistory = BTreeMap<String, RunRecord>;

/// Full history: game → category → run key → run.
pub type HistoryTree = BTreeMap<String, BTreeMap<String, CategoryHistory>>;

/// Article and name of a JSON value's type, for error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
