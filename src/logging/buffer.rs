//! This module provides a size-bounded, ordered buffer of log entries.
//!
//! The `LogBuffer` turns a stream of `write`/`write_line` calls into logical
//! lines, tags each line with a level and evicts the oldest entries once the
//! buffered text grows past its limit.
use super::entry::{take_bracketed, LogEntry};
use super::escape::{line_break_converters, EscapeConverter};
use super::level::LogLevel;
use crate::error::ParseError;
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Default upper bound on buffered text, in characters.
pub const DEFAULT_MAX_TOTAL_TEXT_LENGTH: usize = 500_000_000;

/// Settings for the log buffer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogOptions {
    /// Prefix the first fragment of each line with its timestamp when it is
    /// mirrored to the local stream.
    pub auto_add_time_info: bool,
    /// Accumulate fragments into one entry until `write_line` ends the line.
    pub record_only_on_write_line: bool,
    /// Upper bound on the summed text length of all buffered entries.
    pub max_total_text_length: usize,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            auto_add_time_info: false,
            record_only_on_write_line: true,
            max_total_text_length: DEFAULT_MAX_TOTAL_TEXT_LENGTH,
        }
    }
}

/// The outcome of a single `write` or `write_line` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Written {
    /// A snapshot of the entry the call created or extended.
    pub entry: LogEntry,
    /// Whether the call started a new logical line.
    pub is_head: bool,
}

/// The line currently being built.
#[derive(Debug, Clone)]
enum OpenLine {
    /// Still held in the buffer, addressed by sequence number.
    Buffered(u64),
    /// Evicted or cleared out of the buffer; continuations still land here.
    Detached(LogEntry),
}

/// An ordered, capacity-bounded buffer of log entries.
pub struct LogBuffer {
    /// Entries in chronological order.
    entries: VecDeque<LogEntry>,
    /// The sequence number of `entries[0]`.
    first_seq: u64,
    /// Summed character length of every buffered entry's text.
    total_text_length: usize,
    open_line: OpenLine,
    at_line_start: bool,
    options: LogOptions,
    converters: Vec<EscapeConverter>,
}

impl LogBuffer {
    /// Creates an empty buffer.
    pub fn new(options: LogOptions) -> Self {
        Self {
            entries: VecDeque::new(),
            first_seq: 0,
            total_text_length: 0,
            open_line: OpenLine::Detached(LogEntry::new(String::new(), LogLevel::Info)),
            at_line_start: true,
            options,
            converters: line_break_converters(),
        }
    }

    /// The options the buffer currently applies.
    pub fn options(&self) -> &LogOptions {
        &self.options
    }

    /// Replaces the options, evicting immediately if the limit shrank.
    pub fn set_options(&mut self, options: LogOptions) {
        self.options = options;
        self.evict_overflow();
    }

    /// The converters used by `export` and `import`.
    pub fn converters(&self) -> &[EscapeConverter] {
        &self.converters
    }

    /// Replaces the escape converters.
    ///
    /// # Arguments
    ///
    /// * `converters` - Applied in list order when escaping and unescaping.
    pub fn set_converters(&mut self, converters: Vec<EscapeConverter>) {
        self.converters = converters;
    }

    /// Iterates the buffered entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// The number of buffered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the buffer holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The summed text length of every buffered entry.
    pub fn current_text_length(&self) -> usize {
        self.total_text_length
    }

    /// Whether the next write starts a new logical line.
    pub fn is_at_line_start(&self) -> bool {
        self.at_line_start
    }

    /// Records a fragment that does not end the current line.
    pub fn write(&mut self, text: &str) -> Written {
        self.record(text, false)
    }

    /// Records a fragment that ends the current line.
    pub fn write_line(&mut self, text: &str) -> Written {
        self.record(text, true)
    }

    fn record(&mut self, text: &str, ends_line: bool) -> Written {
        let is_head = self.at_line_start;
        self.at_line_start = ends_line;

        let (level, text) = match extract_level(text) {
            Some((level, rest)) => (level, rest),
            None if is_head => (LogLevel::Info, text),
            None => (self.open_line_level(), text),
        };

        let entry = if self.options.record_only_on_write_line && !is_head {
            self.continue_open_line(text, level)
        } else {
            let entry = LogEntry::new(text, level);
            let seq = self.append(entry.clone());
            self.open_line = OpenLine::Buffered(seq);
            self.evict_overflow();
            entry
        };

        Written { entry, is_head }
    }

    fn continue_open_line(&mut self, text: &str, level: LogLevel) -> LogEntry {
        let added = text_length(text);
        let entry = match &mut self.open_line {
            OpenLine::Buffered(seq) => {
                let index = (*seq - self.first_seq) as usize;
                let entry = &mut self.entries[index];
                entry.text.push_str(text);
                entry.level = level;
                self.total_text_length += added;
                entry.clone()
            }
            OpenLine::Detached(entry) => {
                entry.text.push_str(text);
                entry.level = level;
                return entry.clone();
            }
        };
        self.evict_overflow();
        entry
    }

    fn open_line_level(&self) -> LogLevel {
        match &self.open_line {
            OpenLine::Buffered(seq) => self.entries[(*seq - self.first_seq) as usize].level,
            OpenLine::Detached(entry) => entry.level,
        }
    }

    /// Appends a fully formed entry, evicting as needed.
    pub fn add_entry(&mut self, entry: LogEntry) {
        self.append(entry);
        self.evict_overflow();
    }

    /// Appends a new entry stamped with the current time.
    pub fn add_log(&mut self, text: impl Into<String>, level: LogLevel) -> LogEntry {
        let entry = LogEntry::new(text, level);
        self.add_entry(entry.clone());
        entry
    }

    fn append(&mut self, entry: LogEntry) -> u64 {
        self.total_text_length += text_length(&entry.text);
        self.entries.push_back(entry);
        self.first_seq + self.entries.len() as u64 - 1
    }

    fn evict_overflow(&mut self) {
        while self.total_text_length > self.options.max_total_text_length {
            let Some(evicted) = self.entries.pop_front() else {
                break;
            };
            self.total_text_length -= text_length(&evicted.text);
            if matches!(self.open_line, OpenLine::Buffered(seq) if seq == self.first_seq) {
                self.open_line = OpenLine::Detached(evicted);
            }
            self.first_seq += 1;
        }
    }

    /// Serializes every entry, one escaped entry per line.
    pub fn export(&self) -> String {
        self.join(self.entries.iter(), true)
    }

    /// Serializes the entries whose time falls within `start..=end`.
    pub fn export_range(&self, start: NaiveDateTime, end: NaiveDateTime) -> String {
        self.join(
            self.entries
                .iter()
                .filter(|entry| entry.time >= start && entry.time <= end),
            true,
        )
    }

    /// Serializes every entry without escaping. Entries containing line
    /// breaks will not import back faithfully.
    pub fn export_original(&self) -> String {
        self.join(self.entries.iter(), false)
    }

    fn join<'a>(&self, entries: impl Iterator<Item = &'a LogEntry>, escaped: bool) -> String {
        entries
            .map(|entry| {
                if escaped {
                    entry.serialize(&self.converters)
                } else {
                    entry.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Appends every parseable line of `text`. Returns the number of entries
    /// appended; lines that do not parse are skipped.
    pub fn import(&mut self, text: &str) -> usize {
        let mut imported = 0;
        for line in text.split('\n').filter(|line| !line.is_empty()) {
            match LogEntry::parse(line, &self.converters) {
                Ok(entry) => {
                    self.add_entry(entry);
                    imported += 1;
                }
                Err(e @ ParseError::UnknownLevel(_)) => warn!("Skipping log line: {}", e),
                Err(e) => debug!("Skipping log line: {}", e),
            }
        }
        imported
    }

    /// Drops every buffered entry. The line state is left alone, so a
    /// pending continuation still extends the line that was open.
    pub fn clear(&mut self) {
        if let OpenLine::Buffered(seq) = self.open_line {
            let entry = self.entries[(seq - self.first_seq) as usize].clone();
            self.open_line = OpenLine::Detached(entry);
        }
        self.first_seq += self.entries.len() as u64;
        self.entries.clear();
        self.total_text_length = 0;
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(LogOptions::default())
    }
}

/// Pulls a leading `[LEVEL]` prefix off `text`. Anything else, including
/// brackets around unknown tokens, is treated as having no prefix.
fn extract_level(text: &str) -> Option<(LogLevel, &str)> {
    let (token, rest) = take_bracketed(text)?;
    LogLevel::from_name(token).map(|level| (level, rest))
}

fn text_length(text: &str) -> usize {
    text.chars().count()
}
