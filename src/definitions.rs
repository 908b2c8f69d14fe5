//! Split definition file loading.
//!
//! The file maps each game to an optional image and its categories:
//!
//! ```json
//! { "Celeste": { "image": "celeste.png", "categories": { "Any%": ["Prologue", "City"] } } }
//! ```
//!
//! Games and categories keep file order, which decides the fallback when a
//! requested game or category is missing.

use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::types::{SplitDefinition, json_kind};
use crate::{Result, SplitsError};

/// Parsed split definition file.
#[derive(Debug, Clone, Default)]
pub struct SplitsFile {
    games: Map<String, Value>,
}

impl SplitsFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).map_err(|e| SplitsError::file_error(path.to_path_buf(), e))?;
        let file = Self::from_json_str(&text)?;
        debug!("Loaded {} games from {}", file.games.len(), path.display());
        Ok(file)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let document = serde_json::from_str::<Value>(text)
            .map_err(|e| SplitsError::json_error("splits file", e))?;
        match document {
            Value::Object(games) => Ok(Self { games }),
            other => Err(SplitsError::parse_error(
                "splits file",
                format!("expected an object of games, found {}", json_kind(&other)),
            )),
        }
    }

    pub fn games(&self) -> impl Iterator<Item = &str> {
        self.games.keys().map(String::as_str)
    }

    /// Category names for `game`, in file order.
    pub fn categories(&self, game: &str) -> Vec<&str> {
        self.games
            .get(game)
            .and_then(|entry| entry.get("categories"))
            .and_then(Value::as_object)
            .map(|categories| categories.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Resolve a definition, falling back to the first game and the first
    /// category of that game.
    pub fn select(&self, game: Option<&str>, category: Option<&str>) -> Result<SplitDefinition> {
        let (game_name, entry) = match game.and_then(|g| self.games.get_key_value(g)) {
            Some(found) => found,
            None => {
                let first = self
                    .games
                    .iter()
                    .next()
                    .ok_or_else(|| SplitsError::invalid_definition("splits file has no games"))?;
                if let Some(requested) = game {
                    warn!("Game {:?} not found, using {:?}", requested, first.0);
                }
                first
            }
        };

        let categories = entry
            .get("categories")
            .and_then(Value::as_object)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                SplitsError::invalid_definition(format!("game {:?} has no categories", game_name))
            })?;

        let (category_name, segments) =
            match category.and_then(|c| categories.get_key_value(c)) {
                Some(found) => found,
                None => {
                    let first = categories.iter().next().ok_or_else(|| {
                        SplitsError::invalid_definition(format!(
                            "game {:?} has no categories",
                            game_name
                        ))
                    })?;
                    if let Some(requested) = category {
                        warn!(
                            "Category {:?} not found in {:?}, using {:?}",
                            requested, game_name, first.0
                        );
                    }
                    first
                }
            };

        let segments: Vec<String> = serde_json::from_value(segments.clone()).map_err(|e| {
            SplitsError::json_error(format!("segments of {}/{}", game_name, category_name), e)
        })?;

        let mut definition =
            SplitDefinition::new(game_name.clone(), category_name.clone(), segments)?;
        if let Some(image) = entry.get("image").and_then(Value::as_str).filter(|s| !s.is_empty()) {
            definition = definition.with_image(image);
        }
        Ok(definition)
    }
}

/// History file that sits next to a splits file: `splits.json` becomes
/// `splits_history.json`.
pub fn history_path_for(splits_path: &Path) -> PathBuf {
    let stem =
        splits_path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    splits_path.with_file_name(format!("{}_history.json", stem))
}
