//! Adapts a raw byte stream into `write`/`write_line` calls.
//!
//! Bytes are decoded as UTF-8, carrying incomplete code points over to the
//! next chunk, and split on `\n`. Every terminated piece becomes a
//! `write_line` and any unterminated remainder becomes a `write`.
use super::coordinator::OutputCoordinator;
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One call into the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Write(String),
    WriteLine(String),
}

impl Segment {
    pub async fn apply(&self, coordinator: &OutputCoordinator) {
        match self {
            Segment::Write(text) => coordinator.write(text).await,
            Segment::WriteLine(text) => coordinator.write_line(text).await,
        }
    }
}

/// Incremental splitter from bytes to segments.
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk and returns the segments it completes.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Segment> {
        self.pending.extend_from_slice(bytes);
        let mut text = self.decode();

        // A carriage return may be the first half of a `\r\n` split across chunks.
        if text.ends_with('\r') {
            text.pop();
            self.pending.insert(0, b'\r');
        }

        let mut segments = Vec::new();
        let mut parts = text.split('\n').peekable();
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                let line = part.strip_suffix('\r').unwrap_or(part);
                segments.push(Segment::WriteLine(line.to_string()));
            } else if !part.is_empty() {
                segments.push(Segment::Write(part.to_string()));
            }
        }
        segments
    }

    /// Flushes whatever is still held back, replacing invalid bytes.
    pub fn finish(&mut self) -> Option<Segment> {
        if self.pending.is_empty() {
            return None;
        }
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Some(Segment::Write(text))
    }

    /// Decodes the longest prefix of `pending` that can be decoded, leaving
    /// an incomplete trailing code point behind.
    fn decode(&mut self) -> String {
        let mut text = String::new();
        let mut input = &self.pending[..];
        loop {
            match std::str::from_utf8(input) {
                Ok(valid) => {
                    text.push_str(valid);
                    input = &[];
                    break;
                }
                Err(e) => {
                    let (valid, rest) = input.split_at(e.valid_up_to());
                    text.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            input = &rest[len..];
                        }
                        None => {
                            input = rest;
                            break;
                        }
                    }
                }
            }
        }
        self.pending = input.to_vec();
        text
    }
}

/// A `std::io::Write` handle whose output is mirrored through a coordinator.
///
/// Writes never block on delivery: segments are queued to a pump task that
/// feeds the coordinator in order.
pub struct ConsoleWriter {
    splitter: LineSplitter,
    sender: mpsc::UnboundedSender<Segment>,
}

impl ConsoleWriter {
    /// Creates a writer and spawns the pump task that drains it. The task
    /// ends once the writer is dropped and every queued segment is applied.
    pub fn spawn(coordinator: Arc<OutputCoordinator>) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Segment>();
        let handle = tokio::spawn(async move {
            while let Some(segment) = receiver.recv().await {
                segment.apply(&coordinator).await;
            }
        });
        (
            Self {
                splitter: LineSplitter::new(),
                sender,
            },
            handle,
        )
    }

    fn send(&self, segment: Segment) -> io::Result<()> {
        self.sender
            .send(segment)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "console pump stopped"))
    }
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for segment in self.splitter.push(buf) {
            self.send(segment)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        if let Some(segment) = self.splitter.finish() {
            let _ = self.send(segment);
        }
    }
}
