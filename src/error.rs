//! Error types shared across the relay.
//!
//! Nothing on the write path surfaces these to callers of the coordinator;
//! they exist so that each boundary can report what went wrong to the
//! diagnostics log.
use thiserror::Error;

/// Errors produced while parsing a serialized log line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed log line: {0}")]
    Malformed(String),

    #[error("invalid timestamp: {0}")]
    InvalidTime(String),

    #[error("unknown log level: {0}")]
    UnknownLevel(String),
}

/// Errors produced by a single output sink.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sink is closed")]
    Closed,
}

/// Errors produced by the remote client connection.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("invalid console url: {0}")]
    InvalidUrl(String),

    #[error("invalid header value for {name}")]
    InvalidHeader { name: &'static str },

    #[error("handshake failed: {0}")]
    Handshake(#[source] tokio_tungstenite::tungstenite::Error),

    #[error("client is not connected")]
    NotConnected,

    #[error("send failed: {0}")]
    Send(#[source] tokio_tungstenite::tungstenite::Error),

    #[error("failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors produced by an object formatter.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("failed to serialize object: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to analyze object: {0}")]
    Analyze(String),
}
