//! Speedrun split timer with persisted history and a local command socket.
//!
//! Splitwatch tracks one attempt at a time: segments are split in order, a
//! finished run is written to a per-game, per-category history file, and
//! personal-best and best-segment comparisons are frozen when each run starts.
//! External tools (auto-splitters, stream decks, overlays) drive the timer
//! through a Unix socket speaking one JSON object per connection.
//!
//! # Features
//!
//! - **History**: nested `game → category → run` JSON history, migrated once
//!   from the legacy flat layout
//! - **Timing engine**: start/split/reset state machine behind a single lock
//! - **Comparisons**: PB, best segments and sum of best, frozen per run
//! - **Command socket**: `split`, `start`, `reset` and `status` commands
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use splitwatch::{Splitwatch, TimerConfig};
//!
//! #[tokio::main]
//! async fn main() -> splitwatch::Result<()> {
//!     let config = TimerConfig::load("splitwatch.yaml")?;
//!     let engine = Arc::new(Splitwatch::load(&config)?);
//!     let mut server = Splitwatch::serve(Arc::clone(&engine), &config).await?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     server.stop().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Embedding
//!
//! Hosts that poll a button themselves classify presses with a
//! [`PressTracker`] and draw rows from [`TimingEngine::view`], both tuned by
//! the same config:
//!
//! ```rust,no_run
//! use std::time::Instant;
//! use splitwatch::{PressTracker, Splitwatch, TimerConfig};
//!
//! # fn example(button_down: bool) -> splitwatch::Result<()> {
//! let config = TimerConfig::load("splitwatch.yaml")?;
//! let engine = Splitwatch::load(&config)?;
//! let mut button = PressTracker::new(config.hold_threshold());
//!
//! let now = Instant::now();
//! let action = if button_down {
//!     button.press(now);
//!     button.poll(now)
//! } else {
//!     button.release(now)
//! };
//! if let Some(action) = action {
//!     engine.apply(action);
//! }
//!
//! for row in engine.view(config.view_options()).rows {
//!     println!("{:<20} {}", row.name, row.duration_text(2));
//! }
//! # Ok(())
//! # }
//! ```

// Core types and error handling
mod error;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Run state
pub mod comparison;
pub mod engine;
pub mod history;
pub mod input;
pub mod view;

// Loading and configuration
pub mod config;
pub mod definitions;

// Command socket
#[cfg(unix)]
pub mod router;
#[cfg(unix)]
pub mod server;

// Core exports
pub use error::*;
pub use types::*;

pub use comparison::ComparisonSnapshot;
pub use config::{ServerConfig, TimerConfig};
pub use definitions::SplitsFile;
pub use engine::{
    Clock, RunState, RunStatus, SplitOutcome, StartOutcome, SystemClock, TimingEngine, Transition,
};
pub use history::HistoryStore;
pub use input::{InputAction, PressTracker};
pub use view::{ComparisonMode, DeltaMode, SplitsView, ViewOptions};

#[cfg(unix)]
pub use router::CommandRouter;
#[cfg(unix)]
pub use server::{CommandHandler, CommandServer, ServerOptions};

#[cfg(unix)]
use std::sync::Arc;
use tracing::info;

/// Entry points that wire configuration, files, engine and socket together.
pub struct Splitwatch;

impl Splitwatch {
    /// Load the configured split definition and its history, and build an
    /// idle engine on the system clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the splits file cannot be read or has no usable
    /// game and category. History problems are logged and start empty.
    pub fn load(config: &TimerConfig) -> Result<TimingEngine> {
        let splits = SplitsFile::load(&config.splits_file)?;
        let definition = splits.select(config.game.as_deref(), config.category.as_deref())?;
        let history =
            HistoryStore::open(config.history_path(), &definition.game, &definition.category);

        info!(
            "Loaded {} / {}: {} segments, {} recorded runs",
            definition.game,
            definition.category,
            definition.len(),
            history.segment_history().len()
        );
        Ok(TimingEngine::new(definition, history))
    }

    /// Start a command server on the configured socket, routing into `engine`.
    ///
    /// # Errors
    ///
    /// Returns [`SplitsError::Bind`] if the socket cannot be bound.
    #[cfg(unix)]
    pub async fn serve(engine: Arc<TimingEngine>, config: &TimerConfig) -> Result<CommandServer> {
        let mut server =
            CommandServer::with_options(&config.socket_path, ServerOptions::from(&config.server));
        server.start(CommandRouter::new(engine)).await?;
        Ok(server)
    }
}
