//! This module contains the rolling log kept alongside the mirrored output.
//!
//! It includes the escape codec used by the text format, the entry type and
//! the capacity-bounded buffer that tracks line continuation.
pub mod buffer;
pub mod entry;
pub mod escape;
pub mod level;

pub use buffer::{LogBuffer, LogOptions, Written, DEFAULT_MAX_TOTAL_TEXT_LENGTH};
pub use entry::LogEntry;
pub use escape::EscapeConverter;
pub use level::LogLevel;
