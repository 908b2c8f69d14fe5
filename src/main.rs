//! `splitwatchd`: runs the split timer behind its command socket.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use splitwatch::{Splitwatch, TimeFormat, TimerConfig, format_time};

/// Speedrun split timer daemon controlled over a Unix socket
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
struct Cli {
    /// YAML config file; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// split definition file, overrides the config
    #[arg(short = 'f', long)]
    splits: Option<PathBuf>,

    /// command socket path, overrides the config
    #[arg(short, long)]
    socket: Option<PathBuf>,

    /// game to load, overrides the config
    #[arg(short, long)]
    game: Option<String>,

    /// category to load, overrides the config
    #[arg(short = 'C', long)]
    category: Option<String>,

    /// log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn load_config(&self) -> Result<TimerConfig> {
        let mut config = match &self.config {
            Some(path) => TimerConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => TimerConfig::default(),
        };

        if let Some(splits) = &self.splits {
            config.splits_file = splits.clone();
        }
        if let Some(socket) = &self.socket {
            config.socket_path = socket.clone();
        }
        if self.game.is_some() {
            config.game = self.game.clone();
        }
        if self.category.is_some() {
            config.category = self.category.clone();
        }
        Ok(config)
    }
}

fn init_logging(level: &str) -> Result<()> {
    let level: tracing::Level = level.parse().context("Invalid log level")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}

fn total_text(total: Option<f64>) -> String {
    total.map_or_else(|| "-".to_string(), |t| format_time(t, TimeFormat::default()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let config = cli.load_config()?;
    let engine = Arc::new(Splitwatch::load(&config).with_context(|| {
        format!("Failed to load splits from {}", config.splits_file.display())
    })?);

    let mut server = Splitwatch::serve(Arc::clone(&engine), &config)
        .await
        .context("Failed to start command server")?;

    let view = engine.view(config.view_options());
    info!(
        "Comparing against {:?}: PB {}, sum of best {}",
        config.comparison,
        total_text(view.pb_total),
        total_text(view.sum_of_best),
    );
    info!("splitwatchd ready; send {{\"command\":\"split\"}} to {}", config.socket_path.display());

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
    }

    info!("Shutting down");
    server.stop().await;
    if engine.run_state().running {
        warn!("Exiting with a run in progress; it was not recorded");
    }
    Ok(())
}
