//! This module defines the destinations formatted output is delivered to.
//!
//! Every sink receives the same `OutputMessage`; each picks the rendering it
//! needs (plain text for local streams, markup for remote viewers).
pub mod local;
pub mod trace;

pub use local::LocalSink;
pub use trace::TraceSink;

use crate::error::SinkError;
use async_trait::async_trait;

/// One write, rendered for every kind of sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputMessage {
    /// The text as written by the caller.
    pub text: String,
    /// The text tagged with color or foldblock markup.
    pub markup: String,
    /// Whether the write terminated a line.
    pub is_line: bool,
    /// Timestamp marker to prefix on local streams, if any.
    pub time_marker: Option<String>,
}

/// A destination for mirrored output.
#[async_trait]
pub trait OutputSink: Send + Sync {
    /// A short name used in diagnostics.
    fn name(&self) -> &str;

    /// Delivers one message.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink failed to accept the message. Callers log
    /// and move on to the next sink.
    async fn output(&self, message: &OutputMessage) -> Result<(), SinkError>;

    /// Releases whatever the sink holds open.
    async fn close(&self) {}
}
