//! Daemon configuration loaded from YAML.
//!
//! ```yaml
//! splits_file: ~/splits/celeste.json
//! game: Celeste
//! category: Any%
//! socket_path: /tmp/obs_splits.sock
//! hold_threshold_secs: 1.0
//! comparison: pb
//! delta: cumulative
//! server:
//!   accept_interval_ms: 1000
//!   read_timeout_ms: 1000
//! ```
//!
//! Every field is optional.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::definitions::history_path_for;
use crate::view::{ComparisonMode, DeltaMode, ViewOptions};
use crate::{Result, SplitsError};

/// Default location of the command socket.
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/obs_splits.sock";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    pub splits_file: PathBuf,
    /// Defaults to `<splits stem>_history.json` next to the splits file.
    pub history_file: Option<PathBuf>,
    pub game: Option<String>,
    pub category: Option<String>,
    pub socket_path: PathBuf,
    pub hold_threshold_secs: f64,
    pub comparison: ComparisonMode,
    pub delta: DeltaMode,
    pub server: ServerConfig,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            splits_file: PathBuf::from("splits.json"),
            history_file: None,
            game: None,
            category: None,
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            hold_threshold_secs: 1.0,
            comparison: ComparisonMode::default(),
            delta: DeltaMode::default(),
            server: ServerConfig::default(),
        }
    }
}

impl TimerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).map_err(|e| SplitsError::file_error(path.to_path_buf(), e))?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml_ng::from_str(yaml).map_err(|e| SplitsError::Parse {
            context: "Timer config".to_string(),
            details: format!("YAML parsing failed: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(self.hold_threshold_secs.is_finite() && self.hold_threshold_secs > 0.0) {
            return Err(SplitsError::parse_error(
                "Timer config",
                format!("hold_threshold_secs must be positive, got {}", self.hold_threshold_secs),
            ));
        }
        if self.server.max_message_bytes == 0 {
            return Err(SplitsError::parse_error(
                "Timer config",
                "server.max_message_bytes must be non-zero",
            ));
        }
        Ok(())
    }

    pub fn history_path(&self) -> PathBuf {
        self.history_file.clone().unwrap_or_else(|| history_path_for(&self.splits_file))
    }

    pub fn hold_threshold(&self) -> Duration {
        Duration::from_secs_f64(self.hold_threshold_secs)
    }

    pub fn view_options(&self) -> ViewOptions {
        ViewOptions { comparison: self.comparison, delta: self.delta }
    }
}

/// Command socket tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Longest wait for a connection before re-checking for shutdown.
    pub accept_interval_ms: u64,
    /// Longest wait for a connected client to send its request.
    pub read_timeout_ms: u64,
    pub max_message_bytes: usize,
    /// How long `stop` waits for the accept loop to exit.
    pub shutdown_grace_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            accept_interval_ms: 1000,
            read_timeout_ms: 1000,
            max_message_bytes: 1024,
            shutdown_grace_ms: 2000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn empty_document_is_default() {
        let config = TimerConfig::from_yaml_str("").unwrap();
        assert_eq!(config, TimerConfig::default());
        assert_eq!(config.socket_path, Path::new(DEFAULT_SOCKET_PATH));
        assert_eq!(config.server.max_message_bytes, 1024);
        assert_eq!(config.hold_threshold(), Duration::from_secs(1));
    }

    #[test]
    fn partial_document_keeps_defaults() {
        let config = TimerConfig::from_yaml_str(
            "splits_file: /data/celeste.json\ncomparison: sob\nserver:\n  read_timeout_ms: 250\n",
        )
        .unwrap();

        assert_eq!(config.comparison, ComparisonMode::Sob);
        assert_eq!(config.delta, DeltaMode::Cumulative);
        assert_eq!(config.server.read_timeout_ms, 250);
        assert_eq!(config.server.accept_interval_ms, 1000);
        assert_eq!(config.history_path(), PathBuf::from("/data/celeste_history.json"));
    }

    #[test]
    fn explicit_history_file_wins() {
        let config =
            TimerConfig::from_yaml_str("splits_file: a.json\nhistory_file: b.json\n").unwrap();
        assert_eq!(config.history_path(), PathBuf::from("b.json"));
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            TimerConfig::from_yaml_str("comparison: fastest\n"),
            Err(SplitsError::Parse { .. })
        ));
        assert!(matches!(
            TimerConfig::from_yaml_str("hold_threshold_secs: 0\n"),
            Err(SplitsError::Parse { .. })
        ));
        assert!(matches!(
            TimerConfig::from_yaml_str("server:\n  max_message_bytes: 0\n"),
            Err(SplitsError::Parse { .. })
        ));
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("splitwatch.yaml");
        fs::write(&path, "game: Celeste\ncategory: Any%\ndelta: segment\n").unwrap();

        let config = TimerConfig::load(&path).unwrap();
        assert_eq!(config.game.as_deref(), Some("Celeste"));
        assert_eq!(config.category.as_deref(), Some("Any%"));
        assert_eq!(config.view_options().delta, DeltaMode::Segment);

        assert!(matches!(
            TimerConfig::load(dir.path().join("nope.yaml")),
            Err(SplitsError::File { .. })
        ));
    }
}
