//! The passthrough to the stream the process originally wrote to.
use super::{OutputMessage, OutputSink};
use crate::error::SinkError;
use async_trait::async_trait;
use std::io::Write;
use std::sync::Mutex;

/// Writes plain text to the original output stream.
pub struct LocalSink {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl LocalSink {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }

    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }

    fn write_message(&self, message: &OutputMessage) -> std::io::Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(marker) = &message.time_marker {
            writer.write_all(marker.as_bytes())?;
        }
        writer.write_all(message.text.as_bytes())?;
        if message.is_line {
            writer.write_all(b"\n")?;
        }
        writer.flush()
    }
}

#[async_trait]
impl OutputSink for LocalSink {
    fn name(&self) -> &str {
        "local"
    }

    async fn output(&self, message: &OutputMessage) -> Result<(), SinkError> {
        self.write_message(message)?;
        Ok(())
    }

    async fn close(&self) {
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        let _ = writer.flush();
    }
}
