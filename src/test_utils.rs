//! Fixtures shared by unit tests, integration tests and benchmarks.

#![cfg(any(test, feature = "benchmark"))]

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use std::path::{Path, PathBuf};

use crate::history::RUN_KEY_FORMAT;
use crate::types::{CategoryHistory, RunRecord};

/// Splits file with two games; `Celeste` has two categories.
pub const SPLITS_JSON: &str = r#"{
    "Celeste": {
        "image": "celeste.png",
        "categories": {
            "Any%": ["Prologue", "City", "Site"],
            "All Red Berries": ["Prologue", "City", "Site", "Resort"]
        }
    },
    "Zelda": { "categories": { "Any%": ["Deku", "Ganon"] } }
}"#;

pub fn names(segments: &[&str]) -> Vec<String> {
    segments.iter().map(|s| s.to_string()).collect()
}

/// Build a category history from `(run key, [(segment, seconds)])` pairs.
pub fn history_of(runs: &[(&str, &[(&str, f64)])]) -> CategoryHistory {
    runs.iter()
        .map(|(key, segments)| (key.to_string(), segments.iter().copied().collect::<RunRecord>()))
        .collect()
}

/// Parse a run key back into a local timestamp.
///
/// # Panics
///
/// Panics if `key` is not in [`RUN_KEY_FORMAT`] or does not exist locally.
pub fn local_time(key: &str) -> DateTime<Local> {
    let naive = NaiveDateTime::parse_from_str(key, RUN_KEY_FORMAT)
        .unwrap_or_else(|e| panic!("bad run key {key:?}: {e}"));
    Local
        .from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| panic!("run key {key:?} does not exist in the local timezone"))
}

/// Write [`SPLITS_JSON`] into `dir` and return its path.
pub fn write_splits_file(dir: &Path) -> PathBuf {
    let path = dir.join("splits.json");
    std::fs::write(&path, SPLITS_JSON).unwrap_or_else(|e| panic!("write {}: {e}", path.display()));
    path
}

/// Deterministic history of `runs` runs over `segments` segments, with
/// durations varying per run so best segments come from different runs.
pub fn generated_history(runs: usize, segments: &[String]) -> CategoryHistory {
    (0..runs)
        .map(|run| {
            let key = format!("2024-01-01 00:00:00 #{}", run + 1);
            let record: RunRecord = segments
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    let jitter = ((run * 7 + i * 13) % 17) as f64 * 0.25;
                    (name.as_str(), 30.0 + i as f64 + jitter)
                })
                .collect();
            (key, record)
        })
        .collect()
}
