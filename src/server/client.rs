//! Client side of the command socket.

use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time;

use crate::{Result, SplitsError};

/// Upper bound on a full request/response exchange.
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Send raw bytes and return whatever the server answers before closing.
///
/// An empty response means the server closed the connection without
/// answering.
pub async fn send_raw(socket_path: impl AsRef<Path>, payload: &[u8]) -> Result<Vec<u8>> {
    let path = socket_path.as_ref();
    let exchange = async {
        let mut stream = UnixStream::connect(path)
            .await
            .map_err(|e| SplitsError::file_error(path.to_path_buf(), e))?;
        stream.write_all(payload).await?;
        stream.shutdown().await?;

        let mut response = Vec::new();
        stream.read_to_end(&mut response).await?;
        Ok::<_, SplitsError>(response)
    };

    time::timeout(CLIENT_TIMEOUT, exchange)
        .await
        .map_err(|_| SplitsError::Timeout { duration: CLIENT_TIMEOUT })?
}

/// Send one JSON command and decode the response.
pub async fn send_command(socket_path: impl AsRef<Path>, command: &Value) -> Result<Value> {
    let payload =
        serde_json::to_vec(command).map_err(|e| SplitsError::json_error("command request", e))?;
    let response = send_raw(socket_path, &payload).await?;
    serde_json::from_slice(&response).map_err(|e| SplitsError::json_error("command response", e))
}
