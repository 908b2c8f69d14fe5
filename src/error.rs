//! Error types for the split timer.
//!
//! Only I/O, parsing and socket setup produce errors. Misusing the run state
//! machine (splitting while idle, starting twice) is never an error; those
//! calls return outcome enums instead (see [`crate::engine`]).
//!
//! ## Error Categories
//!
//! - **File Errors**: history or split definition files that cannot be read or written
//! - **Parse Errors**: malformed JSON/YAML documents
//! - **Definition Errors**: split definitions that cannot be used for a run
//! - **Run Errors**: completed runs whose split count does not match the definition
//! - **Socket Errors**: the command socket could not be bound
//!
//! ```rust
//! use splitwatch::SplitsError;
//! use std::path::PathBuf;
//!
//! let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
//! let error = SplitsError::file_error(PathBuf::from("splits_history.json"), io_err);
//! assert!(!error.is_retryable());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for split timer operations.
pub type Result<T, E = SplitsError> = std::result::Result<T, E>;

/// Main error type for split timer operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SplitsError {
    #[error("File error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in {context}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Invalid split definition: {reason}")]
    Definition { reason: String },

    #[error("Run has {found} split times but the definition has {expected} segments")]
    RunLength { expected: usize, found: usize },

    #[error("Failed to bind command socket at {path}")]
    Bind {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },
}

impl SplitsError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            SplitsError::Bind { .. } => true,
            SplitsError::Timeout { .. } => true,
            SplitsError::File { .. } => false,
            SplitsError::Json { .. } => false,
            SplitsError::Parse { .. } => false,
            SplitsError::Definition { .. } => false,
            SplitsError::RunLength { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            SplitsError::File { .. } => vec![
                "Check the file exists and is readable",
                "Check the directory is writable",
                "Ensure sufficient disk space",
            ],
            SplitsError::Json { .. } | SplitsError::Parse { .. } => vec![
                "Validate the document with a JSON/YAML linter",
                "Restore the file from its .bak copy if one exists",
            ],
            SplitsError::Definition { .. } => vec![
                "Give every segment a non-empty name",
                "Check the game and category names in the config",
            ],
            SplitsError::RunLength { .. } => vec![
                "Reset the timer before reloading split definitions",
            ],
            SplitsError::Bind { .. } => vec![
                "Check no other timer instance owns the socket path",
                "Check the socket directory is writable",
            ],
            SplitsError::Timeout { .. } => vec![
                "Check the timer daemon is running",
                "Increase the client timeout",
            ],
        }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        SplitsError::File { path, source }
    }

    /// Helper constructor for JSON errors.
    pub fn json_error(context: impl Into<String>, source: serde_json::Error) -> Self {
        SplitsError::Json { context: context.into(), source }
    }

    /// Helper constructor for parse errors.
    pub fn parse_error(context: impl Into<String>, details: impl Into<String>) -> Self {
        SplitsError::Parse { context: context.into(), details: details.into() }
    }

    /// Helper constructor for definition errors.
    pub fn invalid_definition(reason: impl Into<String>) -> Self {
        SplitsError::Definition { reason: reason.into() }
    }

    /// Helper constructor for socket bind failures.
    pub fn bind_failed(path: PathBuf, source: std::io::Error) -> Self {
        SplitsError::Bind { path, source }
    }
}

impl From<std::io::Error> for SplitsError {
    fn from(err: std::io::Error) -> Self {
        SplitsError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn messages_carry_their_context(
            context in "[a-z ]{1,20}",
            details in ".*",
            expected in 0usize..64,
            found in 0usize..64,
        ) {
            let parse = SplitsError::parse_error(context.clone(), details.clone());
            let msg = parse.to_string();
            prop_assert!(msg.contains(&context));
            prop_assert!(msg.contains(&details));

            let run = SplitsError::RunLength { expected, found };
            let msg = run.to_string();
            prop_assert!(msg.contains(&expected.to_string()));
            prop_assert!(msg.contains(&found.to_string()));
        }
    }

    #[test]
    fn io_errors_convert_to_file_errors() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: SplitsError = io_err.into();
        match err {
            SplitsError::File { source, .. } => assert_eq!(source.to_string(), "denied"),
            _ => panic!("Expected File error variant"),
        }
    }

    #[test]
    fn bind_errors_keep_their_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use");
        let err = SplitsError::bind_failed(PathBuf::from("/tmp/x.sock"), io_err);
        assert!(err.is_retryable());
        assert!(err.to_string().contains("/tmp/x.sock"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn every_variant_has_suggestions() {
        let errors = vec![
            SplitsError::file_error(PathBuf::from("a"), std::io::Error::other("x")),
            SplitsError::parse_error("config", "bad"),
            SplitsError::invalid_definition("empty name"),
            SplitsError::RunLength { expected: 2, found: 1 },
            SplitsError::Timeout { duration: Duration::from_secs(1) },
        ];
        for err in errors {
            assert!(!err.recovery_suggestions().is_empty(), "{err}");
        }
    }

    #[test]
    fn error_is_send_sync_static() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<SplitsError>();
    }
}
