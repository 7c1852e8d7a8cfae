//! This module defines the structure for a single log entry.
use super::escape::{self, EscapeConverter};
use super::level::LogLevel;
use crate::error::ParseError;
use chrono::{Local, NaiveDateTime, Timelike};
use std::fmt;

/// The timestamp layout used in serialized entries.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Represents a single log entry with timestamp, level and text.
///
/// Timestamps are local wall-clock time truncated to whole seconds, which is
/// the precision of the serialized form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// When the entry was started.
    pub time: NaiveDateTime,
    /// The severity of the entry.
    pub level: LogLevel,
    /// The accumulated text of the entry.
    pub text: String,
}

impl LogEntry {
    /// Creates an entry stamped with the current time.
    pub fn new(text: impl Into<String>, level: LogLevel) -> Self {
        Self::with_time(now(), level, text)
    }

    pub fn with_time(time: NaiveDateTime, level: LogLevel, text: impl Into<String>) -> Self {
        Self {
            time: time.with_nanosecond(0).unwrap_or(time),
            level,
            text: text.into(),
        }
    }

    /// The `[yyyy-MM-dd HH:mm:ss]` marker for this entry.
    pub fn time_marker(&self) -> String {
        format!("[{}]", self.time.format(TIME_FORMAT))
    }

    /// Serializes the entry as `[time][LEVEL]text`, escaping the text with
    /// `converters` in list order.
    pub fn serialize(&self, converters: &[EscapeConverter]) -> String {
        format!(
            "{}[{}]{}",
            self.time_marker(),
            self.level,
            escape::convert(&self.text, converters)
        )
    }

    /// Parses a line produced by [`LogEntry::serialize`].
    ///
    /// The text is everything after the level token, so brackets inside it
    /// survive. Level names are matched strictly.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Malformed`] when the `[time][LEVEL]` header is
    /// missing, [`ParseError::InvalidTime`] when the timestamp does not parse
    /// and [`ParseError::UnknownLevel`] for a level name outside the table.
    pub fn parse(line: &str, converters: &[EscapeConverter]) -> Result<Self, ParseError> {
        let malformed = || ParseError::Malformed(line.to_string());

        let (time, rest) = take_bracketed(line).ok_or_else(malformed)?;
        let (level, text) = take_bracketed(rest).ok_or_else(malformed)?;

        let time = NaiveDateTime::parse_from_str(time, TIME_FORMAT)
            .map_err(|_| ParseError::InvalidTime(time.to_string()))?;
        let level = level.parse::<LogLevel>()?;

        Ok(Self {
            time,
            level,
            text: escape::inverse(text, converters),
        })
    }
}

impl fmt::Display for LogEntry {
    /// The unescaped form; embedded line breaks are written as-is.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]{}", self.time_marker(), self.level, self.text)
    }
}

/// Splits `[token]rest` into `(token, rest)`. Empty tokens are rejected.
pub(crate) fn take_bracketed(text: &str) -> Option<(&str, &str)> {
    let inner = text.strip_prefix('[')?;
    let (token, rest) = inner.split_once(']')?;
    if token.is_empty() || token.contains('[') {
        return None;
    }
    Some((token, rest))
}

pub(crate) fn now() -> NaiveDateTime {
    Local::now().naive_local()
}
