//! The seam where arbitrary values are turned into structured text.
use crate::error::FormatError;
use serde_json::Value;

/// Options for a single `write_object` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzeOptions {
    /// Title shown on the folded block.
    pub title: String,
    /// Emit a single-line rendering instead of an indented one.
    pub compact: bool,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            title: "Analyzed object".to_string(),
            compact: false,
        }
    }
}

impl AnalyzeOptions {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Renders a value for display in a folded block.
pub trait ObjectFormatter: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the value cannot be rendered.
    fn format(&self, value: &Value, options: &AnalyzeOptions) -> Result<String, FormatError>;
}

/// Renders values as JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFormatter;

impl ObjectFormatter for JsonFormatter {
    fn format(&self, value: &Value, options: &AnalyzeOptions) -> Result<String, FormatError> {
        let rendered = if options.compact {
            serde_json::to_string(value)?
        } else {
            serde_json::to_string_pretty(value)?
        };
        Ok(rendered)
    }
}

/// Formats an error followed by its chain of sources, one per line.
pub fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        text.push_str("\ncaused by: ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_formatter_respects_compact() {
        let value = json!({"x": 1});
        let formatter = JsonFormatter;
        assert_eq!(
            formatter
                .format(&value, &AnalyzeOptions { compact: true, ..Default::default() })
                .unwrap(),
            "{\"x\":1}"
        );
        assert_eq!(
            formatter.format(&value, &AnalyzeOptions::default()).unwrap(),
            "{\n  \"x\": 1\n}"
        );
    }

    #[test]
    fn error_chain_lists_sources() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let outer = crate::error::SinkError::Io(io);
        assert_eq!(error_chain(&outer), "I/O error: disk gone\ncaused by: disk gone");
    }
}
