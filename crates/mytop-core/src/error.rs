//! Error types for the data source and the console.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Failure reported by a [`DataSource`](crate::source::DataSource).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    /// The server could not be reached (connect, socket, handshake).
    #[error("connection error: {0}")]
    Connection(String),
    /// A statement was rejected or its result could not be decoded.
    #[error("query error: {0}")]
    Query(String),
    /// The requested thread or statement does not exist (anymore).
    #[error("{0} not found")]
    NotFound(String),
    /// The driver gave up waiting for the server's reply.
    #[error("timed out: {0}")]
    Timeout(String),
}

/// Error type for the console: sampler, controller and terminal.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("query error: {0}")]
    Query(String),
    /// Malformed operator input. Carries the offending text.
    #[error("input '{0}' is not a number")]
    Validation(String),
    #[error("query timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    /// Normal shutdown. Never logged as an error.
    #[error("cancelled")]
    Cancelled,
    #[error("terminal error: {0}")]
    Render(#[from] io::Error),
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        source: io::Error,
    },
    #[error("Sorry {brand} {version} is not supported")]
    Unsupported { brand: String, version: String },
}

impl From<SourceError> for ConsoleError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Connection(msg) => ConsoleError::Connection(msg),
            SourceError::Query(msg) => ConsoleError::Query(msg),
            SourceError::NotFound(what) => ConsoleError::Query(format!("{what} not found")),
            SourceError::Timeout(msg) => ConsoleError::Query(format!("timed out: {msg}")),
        }
    }
}

impl ConsoleError {
    /// Whether this error must terminate the console when it surfaces from a
    /// drill-down. Sampler errors are fatal regardless of kind.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ConsoleError::Connection(_)
                | ConsoleError::Render(_)
                | ConsoleError::Spawn { .. }
                | ConsoleError::Unsupported { .. }
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ConsoleError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_carries_input() {
        let err = ConsoleError::Validation("4x2".into());
        assert_eq!(err.to_string(), "input '4x2' is not a number");
    }

    #[test]
    fn source_errors_map_to_console_kinds() {
        let conn: ConsoleError = SourceError::Connection("refused".into()).into();
        assert!(matches!(conn, ConsoleError::Connection(_)));
        assert!(conn.is_fatal());

        let missing: ConsoleError = SourceError::NotFound("thread 42".into()).into();
        assert!(matches!(missing, ConsoleError::Query(_)));
        assert!(!missing.is_fatal());
        assert!(missing.to_string().contains("thread 42"));

        let slow: ConsoleError = SourceError::Timeout("read timed out".into()).into();
        assert!(matches!(slow, ConsoleError::Query(_)));
        assert!(!slow.is_fatal());
    }

    #[test]
    fn timeout_and_cancel_are_recoverable() {
        assert!(!ConsoleError::Timeout(Duration::from_secs(10)).is_fatal());
        assert!(!ConsoleError::Cancelled.is_fatal());
        assert!(ConsoleError::Cancelled.is_cancelled());
        assert_eq!(
            ConsoleError::Timeout(Duration::from_secs(10)).to_string(),
            "query timed out after 10s"
        );
    }
}
