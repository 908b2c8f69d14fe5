//! Local command socket.
//!
//! [`CommandServer`] binds a Unix socket and serves one JSON request per
//! connection. Each connection is read once with a timeout, decoded, passed to
//! the injected [`CommandHandler`] and answered before the next connection is
//! accepted. The accept loop runs on its own task and stops through a
//! [`CancellationToken`].
//!
//! ```rust,no_run
//! use serde_json::json;
//! use splitwatch::server::{Command, CommandServer};
//!
//! # async fn example() -> splitwatch::Result<()> {
//! let mut server = CommandServer::new("/tmp/obs_splits.sock");
//! server.start(|command: Command| json!({ "response": "ok", "echo": command })).await?;
//! // ...
//! server.stop().await;
//! # Ok(())
//! # }
//! ```

mod client;
mod protocol;

pub use client::{send_command, send_raw};
pub use protocol::{
    Command, MAX_MESSAGE_BYTES, ProtocolError, command_name, decode_request, error_response,
};

use serde_json::Value;
use std::io::ErrorKind;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::config::ServerConfig;
use crate::{Result, SplitsError};

/// Turns a decoded request into the response sent back to the client.
pub trait CommandHandler: Send + Sync + 'static {
    fn handle(&self, command: Command) -> Value;
}

impl<F> CommandHandler for F
where
    F: Fn(Command) -> Value + Send + Sync + 'static,
{
    fn handle(&self, command: Command) -> Value {
        self(command)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOptions {
    pub accept_interval: Duration,
    pub read_timeout: Duration,
    pub max_message_bytes: usize,
    pub shutdown_grace: Duration,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

impl From<&ServerConfig> for ServerOptions {
    fn from(config: &ServerConfig) -> Self {
        Self {
            accept_interval: Duration::from_millis(config.accept_interval_ms),
            read_timeout: Duration::from_millis(config.read_timeout_ms),
            max_message_bytes: config.max_message_bytes.max(1),
            shutdown_grace: Duration::from_millis(config.shutdown_grace_ms),
        }
    }
}

struct RunningServer {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// JSON command server on a Unix socket.
pub struct CommandServer {
    socket_path: PathBuf,
    options: ServerOptions,
    running: Option<RunningServer>,
}

impl std::fmt::Debug for CommandServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandServer")
            .field("socket_path", &self.socket_path)
            .field("options", &self.options)
            .field("running", &self.is_running())
            .finish()
    }
}

impl CommandServer {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self::with_options(socket_path, ServerOptions::default())
    }

    pub fn with_options(socket_path: impl Into<PathBuf>, options: ServerOptions) -> Self {
        Self { socket_path: socket_path.into(), options, running: None }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub fn options(&self) -> &ServerOptions {
        &self.options
    }

    pub fn is_running(&self) -> bool {
        self.running.as_ref().is_some_and(|r| !r.task.is_finished())
    }

    /// Bind the socket and start accepting.
    ///
    /// Any file already at the socket path is removed first. Calling `start`
    /// on a running server is a no-op and keeps the first handler.
    pub async fn start<H: CommandHandler>(&mut self, handler: H) -> Result<()> {
        if self.is_running() {
            debug!("Command server already running on {}", self.socket_path.display());
            return Ok(());
        }
        // A loop that exited on its own still needs its token dropped.
        self.running = None;

        remove_socket_file(&self.socket_path);
        let listener = UnixListener::bind(&self.socket_path)
            .map_err(|e| SplitsError::bind_failed(self.socket_path.clone(), e))?;

        let cancel = CancellationToken::new();
        let task = tokio::spawn(accept_loop(
            listener,
            Arc::new(handler),
            self.options.clone(),
            cancel.clone(),
        ));
        self.running = Some(RunningServer { cancel, task });

        info!("Command server listening on {}", self.socket_path.display());
        Ok(())
    }

    /// Stop accepting, wait up to the shutdown grace for the loop to exit and
    /// remove the socket file.
    pub async fn stop(&mut self) {
        let Some(RunningServer { cancel, mut task }) = self.running.take() else {
            return;
        };

        cancel.cancel();
        match time::timeout(self.options.shutdown_grace, &mut task).await {
            Ok(Ok(())) => debug!("Accept loop exited"),
            Ok(Err(e)) => warn!("Accept loop ended abnormally: {}", e),
            Err(_) => {
                warn!(
                    "Accept loop did not exit within {:?}, aborting",
                    self.options.shutdown_grace
                );
                task.abort();
            }
        }

        remove_socket_file(&self.socket_path);
        info!("Command server stopped");
    }
}

impl Drop for CommandServer {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.cancel.cancel();
            running.task.abort();
            remove_socket_file(&self.socket_path);
        }
    }
}

async fn accept_loop(
    listener: UnixListener,
    handler: Arc<dyn CommandHandler>,
    options: ServerOptions,
    cancel: CancellationToken,
) {
    const MAX_ERRORS: u32 = 10;
    let mut served = 0u64;
    let mut error_count = 0u32;

    loop {
        let accepted = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Accept loop cancelled");
                break;
            }
            accepted = time::timeout(options.accept_interval, listener.accept()) => accepted,
        };

        match accepted {
            Err(_) => {
                trace!("No connection within {:?}", options.accept_interval);
            }
            Ok(Ok((stream, _))) => {
                error_count = 0;
                served += 1;
                handle_client(stream, handler.as_ref(), &options).await;
            }
            Ok(Err(e)) => {
                error_count += 1;
                error!("Accept error ({}/{}): {}", error_count, MAX_ERRORS, e);

                if error_count >= MAX_ERRORS {
                    error!("Too many accept errors, shutting down command server");
                    break;
                }

                // Exponential backoff: 50ms, 100ms, 200ms, ...
                let backoff = Duration::from_millis(50 * (1 << error_count.min(5)));
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = time::sleep(backoff) => {}
                }
            }
        }
    }

    info!("Command server served {} connections", served);
}

async fn handle_client(
    mut stream: UnixStream,
    handler: &dyn CommandHandler,
    options: &ServerOptions,
) {
    let mut buf = vec![0u8; options.max_message_bytes];
    let len = match time::timeout(options.read_timeout, stream.read(&mut buf)).await {
        Err(_) => {
            debug!("Client sent nothing within {:?}", options.read_timeout);
            return;
        }
        Ok(Err(e)) => {
            warn!("Failed to read command: {}", e);
            return;
        }
        Ok(Ok(0)) => {
            trace!("Client closed without sending");
            return;
        }
        Ok(Ok(len)) => len,
    };

    let response = match decode_request(&buf[..len]) {
        Ok(command) => {
            trace!("Dispatching {:?}", command_name(&command));
            match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(command))) {
                Ok(response) => response,
                Err(_) => {
                    error!("Command handler panicked, closing connection");
                    return;
                }
            }
        }
        Err(e) => {
            debug!("Rejected request: {}", e);
            e.to_response()
        }
    };

    let payload = match serde_json::to_vec(&response) {
        Ok(payload) => payload,
        Err(e) => {
            error!("Failed to encode response: {}", e);
            return;
        }
    };

    if let Err(e) = stream.write_all(&payload).await {
        warn!("Failed to send response: {}", e);
        return;
    }
    let _ = stream.shutdown().await;
}

fn remove_socket_file(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => trace!("Removed socket file {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove socket file {}: {}", path.display(), e),
    }
}
