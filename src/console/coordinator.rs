//! This module defines the `OutputCoordinator`, the single point every piece
//! of mirrored output passes through.
//!
//! Each write is classified by the rolling log (if enabled), rendered once
//! for every kind of sink and then delivered to the trace sink, the local
//! stream and every registered remote sink, one after another. A failing
//! sink is logged and skipped so the remaining sinks still receive output.
use super::color::ColorPair;
use super::formatter::{error_chain, AnalyzeOptions, JsonFormatter, ObjectFormatter};
use super::markup::{color_text, error_block, foldblock};
use super::options::ConsoleOptions;
use crate::error::{FormatError, RemoteError};
use crate::logging::{LogBuffer, Written};
use crate::remote::{ClientCredentials, RemoteClient};
use crate::sink::{LocalSink, OutputMessage, OutputSink, TraceSink};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

/// A structured block ready to be delivered.
struct Block {
    /// Plain rendering for the log and local stream.
    text: String,
    /// Foldblock markup for remote viewers.
    markup: String,
    /// Level prefix applied when the block is recorded in the log.
    log_prefix: &'static str,
}

/// Output rendered eagerly so that borrowed values are not held across sends.
enum Pending {
    Block(Block),
    Line(String),
}

/// Fans mirrored output out to every sink and records it in the rolling log.
pub struct OutputCoordinator {
    options: RwLock<ConsoleOptions>,
    // Guards the head/continuation decision and the open-line mutation, so
    // concurrent writers cannot interleave inside one classification.
    log: Mutex<LogBuffer>,
    trace: TraceSink,
    local: Option<LocalSink>,
    sinks: RwLock<Vec<Arc<dyn OutputSink>>>,
    formatter: Box<dyn ObjectFormatter>,
}

impl OutputCoordinator {
    /// Creates a coordinator whose original stream is the process stdout.
    pub fn new(options: ConsoleOptions) -> Self {
        Self {
            log: Mutex::new(LogBuffer::new(options.log.clone())),
            options: RwLock::new(options),
            trace: TraceSink,
            local: Some(LocalSink::stdout()),
            sinks: RwLock::new(Vec::new()),
            formatter: Box::new(JsonFormatter),
        }
    }

    /// Replaces the original stream, or removes it with `None`.
    pub fn with_local_sink(mut self, local: Option<LocalSink>) -> Self {
        self.local = local;
        self
    }

    /// Replaces the formatter used by `write_object`.
    pub fn with_formatter(mut self, formatter: impl ObjectFormatter + 'static) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    /// A snapshot of the current options.
    pub fn options(&self) -> ConsoleOptions {
        self.options.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Updates the options in place. Log settings are pushed to the buffer.
    pub fn configure(&self, update: impl FnOnce(&mut ConsoleOptions)) {
        let log_options = {
            let mut options = self.options.write().unwrap_or_else(|e| e.into_inner());
            update(&mut *options);
            options.log.clone()
        };

        let mut log = self.lock_log();
        if *log.options() != log_options {
            log.set_options(log_options);
        }
    }

    /// Sets the colors subsequent writes are tagged with.
    pub fn set_colors(&self, colors: ColorPair) {
        self.configure(|options| options.colors = colors);
    }

    fn lock_log(&self) -> MutexGuard<'_, LogBuffer> {
        self.log.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Runs `f` with exclusive access to the rolling log.
    pub fn with_log<R>(&self, f: impl FnOnce(&mut LogBuffer) -> R) -> R {
        f(&mut *self.lock_log())
    }

    /// Exports the rolling log, one escaped entry per line.
    pub fn export_log(&self) -> String {
        self.lock_log().export()
    }

    /// Exports the entries logged between `start` and `end`, inclusive.
    ///
    /// # Arguments
    ///
    /// * `start` - The earliest timestamp to include.
    /// * `end` - The latest timestamp to include.
    pub fn export_log_range(&self, start: NaiveDateTime, end: NaiveDateTime) -> String {
        self.lock_log().export_range(start, end)
    }

    /// Exports the rolling log without escaping line breaks.
    pub fn export_log_original(&self) -> String {
        self.lock_log().export_original()
    }

    /// Imports serialized entries into the log, returning how many were kept.
    pub fn import_log(&self, text: &str) -> usize {
        self.lock_log().import(text)
    }

    /// Empties the rolling log.
    pub fn clear_log(&self) {
        self.lock_log().clear();
    }

    /// Writes text that does not end the current line.
    pub async fn write(&self, text: &str) {
        self.write_text(text, false).await;
    }

    /// Writes text that ends the current line.
    pub async fn write_line(&self, text: &str) {
        self.write_text(text, true).await;
    }

    async fn write_text(&self, text: &str, is_line: bool) {
        let options = self.options();
        let written = options.logging_enabled.then(|| {
            let mut log = self.lock_log();
            if is_line {
                log.write_line(text)
            } else {
                log.write(text)
            }
        });

        let colors = options.use_color.then_some(&options.colors);
        let message = OutputMessage {
            text: text.to_string(),
            markup: color_text(colors, text),
            is_line,
            time_marker: time_marker(&options, written.as_ref()),
        };
        self.deliver(&options, &message).await;
    }

    /// Formats `value` with the object formatter and delivers it as a
    /// foldable block. A formatting failure is delivered as an error block.
    pub fn write_object<T: Serialize + ?Sized>(
        &self,
        value: &T,
        options: &AnalyzeOptions,
    ) -> impl Future<Output = ()> + Send + '_ {
        let block = self.render_object(value, options);
        self.write_pending(Pending::Block(block))
    }

    /// Writes `value` as a block when object analysis is enabled, or as one
    /// line of compact JSON otherwise.
    pub fn write_value<T: Serialize + ?Sized>(
        &self,
        value: &T,
    ) -> impl Future<Output = ()> + Send + '_ {
        let pending = if self.options().auto_analyze_objects {
            Pending::Block(self.render_object(value, &AnalyzeOptions::default()))
        } else {
            match serde_json::to_string(value) {
                Ok(line) => Pending::Line(line),
                Err(e) => Pending::Block(render_error(&e)),
            }
        };
        self.write_pending(pending)
    }

    /// Writes an error and its source chain as an error-styled block.
    pub fn write_error(
        &self,
        error: &(dyn std::error::Error + 'static),
    ) -> impl Future<Output = ()> + Send + '_ {
        self.write_pending(Pending::Block(render_error(error)))
    }

    async fn write_pending(&self, pending: Pending) {
        match pending {
            Pending::Block(block) => self.write_block(block).await,
            Pending::Line(line) => self.write_text(&line, true).await,
        }
    }

    fn render_object<T: Serialize + ?Sized>(&self, value: &T, analyze: &AnalyzeOptions) -> Block {
        let rendered = serde_json::to_value(value)
            .map_err(FormatError::from)
            .and_then(|value| self.formatter.format(&value, analyze));

        match rendered {
            Ok(text) => {
                let options = self.options();
                let colors = if options.use_color {
                    options.colors
                } else {
                    ColorPair::new(None, None)
                };
                Block {
                    markup: foldblock(&colors.codes(), &analyze.title, &text),
                    text,
                    log_prefix: "",
                }
            }
            Err(e) => {
                warn!("Failed to analyze object '{}': {}", analyze.title, e);
                let text = error_chain(&e);
                Block {
                    markup: error_block(&format!("Unable to analyze object: {}", e), &text),
                    text,
                    log_prefix: "[ERROR]",
                }
            }
        }
    }

    async fn write_block(&self, block: Block) {
        let options = self.options();
        let written = options
            .logging_enabled
            .then(|| self.lock_log().write_line(&format!("{}{}", block.log_prefix, block.text)));

        let message = OutputMessage {
            time_marker: time_marker(&options, written.as_ref()),
            text: block.text,
            markup: block.markup,
            is_line: true,
        };
        self.deliver(&options, &message).await;
    }

    async fn deliver(&self, options: &ConsoleOptions, message: &OutputMessage) {
        if options.mirror_to_trace {
            deliver_to(&self.trace, message).await;
        }
        if options.mirror_to_local {
            if let Some(local) = &self.local {
                deliver_to(local, message).await;
            }
        }
        for sink in self.registered_sinks() {
            deliver_to(sink.as_ref(), message).await;
        }
    }

    /// Adds a sink to the fan-out.
    pub fn register_sink(&self, sink: Arc<dyn OutputSink>) {
        self.sinks
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(sink);
    }

    /// A snapshot of the registered sinks, in registration order.
    pub fn registered_sinks(&self) -> Vec<Arc<dyn OutputSink>> {
        self.sinks.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Connects to a viewer and registers the client on success.
    ///
    /// # Errors
    ///
    /// Returns an error if the handshake fails; nothing is registered then.
    pub async fn connect(
        &self,
        url: &str,
        credentials: ClientCredentials,
    ) -> Result<Arc<RemoteClient>, RemoteError> {
        let client = Arc::new(RemoteClient::new(url, credentials));
        client.connect().await?;
        self.register_sink(client.clone());
        Ok(client)
    }

    /// Connects to a viewer on `ws://localhost:<port>/`, identifying as the
    /// current executable with a fresh client id.
    ///
    /// # Errors
    ///
    /// Returns an error if the handshake fails.
    pub async fn connect_local(
        &self,
        port: u16,
        password: &str,
    ) -> Result<Arc<RemoteClient>, RemoteError> {
        let credentials =
            ClientCredentials::new(process_name(), Uuid::new_v4().to_string(), password);
        self.connect(&format!("ws://localhost:{}/", port), credentials)
            .await
    }

    /// Closes every registered sink and empties the registry.
    pub async fn stop(&self) {
        let sinks = std::mem::take(&mut *self.sinks.write().unwrap_or_else(|e| e.into_inner()));
        for sink in &sinks {
            sink.close().await;
        }
        if let Some(local) = &self.local {
            local.close().await;
        }
        info!("Console relay stopped, closed {} sink(s)", sinks.len());
    }
}

async fn deliver_to(sink: &dyn OutputSink, message: &OutputMessage) {
    if let Err(e) = sink.output(message).await {
        warn!("Failed to deliver output to sink '{}': {}", sink.name(), e);
    }
}

fn render_error(error: &(dyn std::error::Error + 'static)) -> Block {
    let text = error_chain(error);
    Block {
        markup: error_block(&format!("Error: {}", error), &text),
        text,
        log_prefix: "[ERROR]",
    }
}

/// The marker to prefix on the local stream: only for the first fragment of
/// a line, and only when the log is stamping times.
fn time_marker(options: &ConsoleOptions, written: Option<&Written>) -> Option<String> {
    written
        .filter(|written| written.is_head && options.log.auto_add_time_info)
        .map(|written| written.entry.time_marker())
}

fn process_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.file_stem().map(|stem| stem.to_string_lossy().into_owned()))
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SinkError;
    use crate::logging::LogLevel;
    use async_trait::async_trait;

    #[derive(Default)]
    struct Recording {
        messages: Mutex<Vec<OutputMessage>>,
    }

    #[async_trait]
    impl OutputSink for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        async fn output(&self, message: &OutputMessage) -> Result<(), SinkError> {
            self.messages.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    fn quiet() -> ConsoleOptions {
        ConsoleOptions {
            mirror_to_trace: false,
            ..ConsoleOptions::default()
        }
    }

    fn coordinator(options: ConsoleOptions) -> (OutputCoordinator, Arc<Recording>) {
        let coordinator = OutputCoordinator::new(options).with_local_sink(None);
        let recording = Arc::new(Recording::default());
        coordinator.register_sink(recording.clone());
        (coordinator, recording)
    }

    #[tokio::test]
    async fn writes_are_color_tagged() {
        let (coordinator, recording) = coordinator(quiet());
        coordinator.write("a").await;
        coordinator.write_line("b").await;

        let messages = recording.messages.lock().unwrap();
        assert_eq!(messages[0].markup, "[color #cccccc black]a");
        assert!(!messages[0].is_line);
        assert_eq!(messages[1].markup, "[color #cccccc black]b");
        assert!(messages[1].is_line);
    }

    #[tokio::test]
    async fn color_can_be_disabled_and_changed() {
        let (coordinator, recording) = coordinator(quiet());
        coordinator.set_colors(ColorPair::new(
            Some(crate::console::ConsoleColor::Red),
            None,
        ));
        coordinator.write_line("x").await;
        coordinator.configure(|options| options.use_color = false);
        coordinator.write_line("y").await;

        let messages = recording.messages.lock().unwrap();
        assert_eq!(messages[0].markup, "[color #e74856 Transparent]x");
        assert_eq!(messages[1].markup, "y");
    }

    #[tokio::test]
    async fn logging_can_be_disabled() {
        let (coordinator, recording) = coordinator(ConsoleOptions {
            logging_enabled: false,
            ..quiet()
        });
        coordinator.write_line("[WARN]nothing recorded").await;
        assert!(coordinator.with_log(|log| log.is_empty()));
        assert_eq!(recording.messages.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn time_marker_only_on_line_head() {
        let mut options = quiet();
        options.log.auto_add_time_info = true;
        let (coordinator, recording) = coordinator(options);
        coordinator.write("a").await;
        coordinator.write_line("b").await;

        let messages = recording.messages.lock().unwrap();
        assert!(messages[0].time_marker.is_some());
        assert!(messages[1].time_marker.is_none());
    }

    #[tokio::test]
    async fn objects_are_folded() {
        let (coordinator, recording) = coordinator(quiet());
        coordinator
            .write_object(&serde_json::json!({"id": 7}), &AnalyzeOptions::titled("Job"))
            .await;

        let messages = recording.messages.lock().unwrap();
        assert_eq!(
            messages[0].markup,
            "[foldblock color: #cccccc black title: Job text: {\n  \"id\": 7\n}]"
        );
        assert!(messages[0].is_line);
    }

    struct Failing;

    impl ObjectFormatter for Failing {
        fn format(
            &self,
            _value: &serde_json::Value,
            _options: &AnalyzeOptions,
        ) -> Result<String, FormatError> {
            Err(FormatError::Analyze("cyclic".to_string()))
        }
    }

    #[tokio::test]
    async fn analysis_failure_becomes_error_block() {
        let coordinator = OutputCoordinator::new(quiet())
            .with_local_sink(None)
            .with_formatter(Failing);
        let recording = Arc::new(Recording::default());
        coordinator.register_sink(recording.clone());

        coordinator.write_object(&1, &AnalyzeOptions::default()).await;

        let messages = recording.messages.lock().unwrap();
        assert!(messages[0]
            .markup
            .starts_with("[foldblock color: white #ff0000 title: Unable to analyze object: "));
        let entry = coordinator.with_log(|log| log.entries().next().cloned()).unwrap();
        assert_eq!(entry.level, LogLevel::Error);
        assert_eq!(entry.text, "failed to analyze object: cyclic");
    }

    #[tokio::test]
    async fn write_value_honors_auto_analyze() {
        let (coordinator, recording) = coordinator(ConsoleOptions {
            auto_analyze_objects: false,
            ..quiet()
        });
        coordinator.write_value(&vec![1, 2]).await;
        coordinator.configure(|options| options.auto_analyze_objects = true);
        coordinator.write_value(&vec![3]).await;

        let messages = recording.messages.lock().unwrap();
        assert_eq!(messages[0].markup, "[color #cccccc black][1,2]");
        assert!(messages[1].markup.starts_with("[foldblock "));
    }

    #[tokio::test]
    async fn errors_include_their_source() {
        let (coordinator, recording) = coordinator(quiet());
        let error = SinkError::Io(std::io::Error::new(std::io::ErrorKind::Other, "gone"));
        coordinator.write_error(&error).await;

        let messages = recording.messages.lock().unwrap();
        assert_eq!(
            messages[0].markup,
            "[foldblock color: white #ff0000 title: Error: I/O error: gone text: I/O error: gone\ncaused by: gone]"
        );
    }

    #[tokio::test]
    async fn configure_pushes_log_limits() {
        let (coordinator, _recording) = coordinator(quiet());
        coordinator.write_line("first").await;
        coordinator.write_line("second").await;
        coordinator.configure(|options| options.log.max_total_text_length = 6);
        assert_eq!(coordinator.with_log(|log| log.len()), 1);
        assert!(coordinator.export_log().ends_with("[INFO]second"));
    }

    #[tokio::test]
    async fn stop_empties_registry() {
        let (coordinator, _recording) = coordinator(quiet());
        assert_eq!(coordinator.registered_sinks().len(), 1);
        coordinator.stop().await;
        assert!(coordinator.registered_sinks().is_empty());
    }
}
