//! Reversible escaping that keeps each serialized entry on one physical line.
use std::borrow::Cow;

/// Maps one raw substring to an escaped form built from a marker and a code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapeConverter {
    raw: String,
    escaped: String,
}

impl EscapeConverter {
    /// Creates a converter whose escaped form is `marker` followed by `code`.
    pub fn new(raw: impl Into<String>, code: &str, marker: &str) -> Self {
        Self {
            raw: raw.into(),
            escaped: format!("{marker}{code}"),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn escaped(&self) -> &str {
        &self.escaped
    }

    /// Replaces every raw occurrence with the escaped form.
    pub fn convert<'a>(&self, text: &'a str) -> Cow<'a, str> {
        replace(text, &self.raw, &self.escaped)
    }

    /// Replaces every escaped occurrence with the raw form.
    pub fn inverse<'a>(&self, text: &'a str) -> Cow<'a, str> {
        replace(text, &self.escaped, &self.raw)
    }
}

fn replace<'a>(text: &'a str, from: &str, to: &str) -> Cow<'a, str> {
    if from.is_empty() || !text.contains(from) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.replace(from, to))
    }
}

/// The converters used by the log buffer: newline first, then carriage return.
pub fn line_break_converters() -> Vec<EscapeConverter> {
    vec![
        EscapeConverter::new("\n", "n", "\\"),
        EscapeConverter::new("\r", "r", "\\"),
    ]
}

/// Applies every converter in list order.
pub fn convert(text: &str, converters: &[EscapeConverter]) -> String {
    converters
        .iter()
        .fold(text.to_string(), |acc, converter| converter.convert(&acc).into_owned())
}

/// Undoes [`convert`]. Converters are applied in the same list order, not reversed.
pub fn inverse(text: &str, converters: &[EscapeConverter]) -> String {
    converters
        .iter()
        .fold(text.to_string(), |acc, converter| converter.inverse(&acc).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_line_breaks() {
        let converters = line_break_converters();
        let escaped = convert("one\r\ntwo\nthree", &converters);
        assert_eq!(escaped, "one\\r\\ntwo\\nthree");
        assert!(!escaped.contains('\n'));
        assert_eq!(inverse(&escaped, &converters), "one\r\ntwo\nthree");
    }

    #[test]
    fn untouched_text_is_borrowed() {
        let converter = EscapeConverter::new("\n", "n", "\\");
        assert!(matches!(converter.convert("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn literal_escape_sequence_is_ambiguous() {
        // A literal backslash-n in the input decodes to a real newline.
        let converters = line_break_converters();
        let escaped = convert("C:\\new", &converters);
        assert_eq!(inverse(&escaped, &converters), "C:\new");
    }
}
