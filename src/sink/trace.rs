use super::{OutputMessage, OutputSink};
use crate::error::SinkError;
use async_trait::async_trait;
use tracing::debug;

/// Mirrors output to the `tracing` debug stream under `console_relay::trace`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TraceSink;

#[async_trait]
impl OutputSink for TraceSink {
    fn name(&self) -> &str {
        "trace"
    }

    async fn output(&self, message: &OutputMessage) -> Result<(), SinkError> {
        debug!(target: "console_relay::trace", "{}", message.text);
        Ok(())
    }
}
