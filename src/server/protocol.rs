//! Wire format of the command socket.
//!
//! One request and one response per connection, each a single UTF-8 JSON
//! object with no framing beyond the connection itself. The server only
//! checks structure; what a command means is up to the handler.

use serde_json::{Map, Value, json};
use thiserror::Error;

/// Largest request read from a client; longer payloads are truncated.
pub const MAX_MESSAGE_BYTES: usize = 1024;

/// A decoded request object. Always contains a `command` key.
pub type Command = Map<String, Value>;

/// Structural request failures reported back to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("invalid_json")]
    InvalidJson,
    #[error("invalid_command")]
    InvalidCommand,
}

impl ProtocolError {
    pub fn code(&self) -> &'static str {
        match self {
            ProtocolError::InvalidJson => "invalid_json",
            ProtocolError::InvalidCommand => "invalid_command",
        }
    }

    pub fn to_response(&self) -> Value {
        error_response(self.code())
    }
}

/// `{"response":"error","error":<code>}`
pub fn error_response(code: &str) -> Value {
    json!({ "response": "error", "error": code })
}

/// Decode a request payload.
///
/// Bytes that are not JSON (including invalid UTF-8) are
/// [`ProtocolError::InvalidJson`]; JSON that is not an object with a
/// `command` key is [`ProtocolError::InvalidCommand`].
pub fn decode_request(bytes: &[u8]) -> Result<Command, ProtocolError> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) if map.contains_key("command") => Ok(map),
        Ok(_) => Err(ProtocolError::InvalidCommand),
        Err(_) => Err(ProtocolError::InvalidJson),
    }
}

/// The `command` field as a string, if it is one.
pub fn command_name(command: &Command) -> Option<&str> {
    command.get("command").and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_json_is_invalid_json() {
        assert_eq!(decode_request(b"{not json"), Err(ProtocolError::InvalidJson));
        assert_eq!(decode_request(b""), Err(ProtocolError::InvalidJson));
        assert_eq!(decode_request(&[0xff, 0xfe]), Err(ProtocolError::InvalidJson));
        assert_eq!(
            ProtocolError::InvalidJson.to_response(),
            json!({"response": "error", "error": "invalid_json"})
        );
    }

    #[test]
    fn missing_command_is_invalid_command() {
        assert_eq!(decode_request(br#"{"foo":1}"#), Err(ProtocolError::InvalidCommand));
        assert_eq!(decode_request(br#"["command"]"#), Err(ProtocolError::InvalidCommand));
        assert_eq!(decode_request(b"42"), Err(ProtocolError::InvalidCommand));
        assert_eq!(
            ProtocolError::InvalidCommand.to_response(),
            json!({"response": "error", "error": "invalid_command"})
        );
    }

    #[test]
    fn command_objects_pass_through() {
        let command =
            decode_request(b"{\"command\": \"split\", \"source\": \"autosplit\"}\n").unwrap();
        assert_eq!(command_name(&command), Some("split"));
        assert_eq!(command["source"], "autosplit");

        // Non-string commands are structurally valid; routing decides.
        let command = decode_request(br#"{"command": 7}"#).unwrap();
        assert_eq!(command_name(&command), None);
    }
}
