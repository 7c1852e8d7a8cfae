//! The configuration surface exposed to the host process.
use super::color::ColorPair;
use crate::logging::LogOptions;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Toggles controlling where output is mirrored and how it is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConsoleOptions {
    /// Mirror every write to the `tracing` debug stream.
    pub mirror_to_trace: bool,
    /// Mirror every write to the original output stream.
    pub mirror_to_local: bool,
    /// Tag remote messages with the current console colors.
    pub use_color: bool,
    /// Format values passed to `write_value` as structured blocks.
    pub auto_analyze_objects: bool,
    /// Record writes in the rolling log.
    pub logging_enabled: bool,
    /// Colors assumed at startup.
    pub colors: ColorPair,
    pub log: LogOptions,
}

impl Default for ConsoleOptions {
    fn default() -> Self {
        Self {
            mirror_to_trace: true,
            mirror_to_local: false,
            use_color: true,
            auto_analyze_objects: true,
            logging_enabled: true,
            colors: ColorPair::default(),
            log: LogOptions::default(),
        }
    }
}

impl ConsoleOptions {
    /// Loads options from a JSON file. Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Invalid config file '{}'", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::color::ConsoleColor;
    use std::io::Write;

    #[test]
    fn defaults() {
        let options = ConsoleOptions::default();
        assert!(options.mirror_to_trace);
        assert!(!options.mirror_to_local);
        assert!(options.logging_enabled);
        assert_eq!(options.log.max_total_text_length, 500_000_000);
        assert!(options.log.record_only_on_write_line);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"mirror_to_local": true, "colors": {{"foreground": "Yellow"}}, "log": {{"max_total_text_length": 64}}}}"#
        )
        .unwrap();

        let options = ConsoleOptions::from_json_file(file.path()).unwrap();
        assert!(options.mirror_to_local);
        assert!(options.use_color);
        assert_eq!(options.colors.foreground, Some(ConsoleColor::Yellow));
        assert_eq!(options.colors.background, Some(ConsoleColor::Black));
        assert_eq!(options.log.max_total_text_length, 64);
        assert!(options.log.record_only_on_write_line);
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ConsoleOptions::from_json_file(dir.path().join("missing.json")).is_err());
    }
}
