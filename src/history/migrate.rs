//! Legacy flat history detection and migration.
//!
//! Early history files stored runs directly at the top level:
//!
//! ```text
//! { "2024-05-01 20:14:03": { "Level 1": 41.2, ... }, ... }
//! ```
//!
//! The current layout nests them as `{ game: { category: { key: run } } }`.
//! Game names are never timestamp-shaped, so running the migration on an
//! already nested tree changes nothing.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::info;

use crate::types::{HistoryTree, json_kind};
use crate::{Result, SplitsError};

static LEGACY_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").expect("Invalid legacy key regex"));

/// True when any top-level key looks like a run timestamp.
pub fn is_legacy_layout(raw: &Map<String, Value>) -> bool {
    raw.keys().any(|key| LEGACY_KEY.is_match(key))
}

/// Parse a raw history document into a [`HistoryTree`], migrating the legacy
/// flat layout under `game`/`category` when detected.
///
/// The returned tree always contains the `game`/`category` path. The flag is
/// true when a migration happened and the caller should persist the result.
pub fn load_tree(raw: Value, game: &str, category: &str) -> Result<(HistoryTree, bool)> {
    let (nested, migrated) = match raw {
        Value::Null => (Value::Object(Map::new()), false),
        Value::Object(map) if is_legacy_layout(&map) => {
            info!(
                "Migrating flat history ({} runs) under {}/{}",
                map.len(),
                game,
                category
            );
            let mut categories = Map::new();
            categories.insert(category.to_string(), Value::Object(map));
            let mut games = Map::new();
            games.insert(game.to_string(), Value::Object(categories));
            (Value::Object(games), true)
        }
        Value::Object(map) => (Value::Object(map), false),
        other => {
            return Err(SplitsError::parse_error(
                "history document",
                format!("expected an object at the top level, found {}", json_kind(&other)),
            ));
        }
    };

    let mut tree: HistoryTree =
        serde_json::from_value(nested).map_err(|e| SplitsError::json_error("history tree", e))?;
    tree.entry(game.to_string()).or_default().entry(category.to_string()).or_default();

    Ok((tree, migrated))
}
