//! Builds and parses the color markup understood by the remote viewer.
//!
//! Plain text is tagged `[color <fg> <bg>]<text>`; structured output is
//! wrapped as `[foldblock color: <fg> <bg> title: <title> text: <body>]`.
use super::color::ColorPair;

const COLOR_TAG: &str = "[color ";
const FOLDBLOCK_TAG: &str = "[foldblock color: ";

/// Color codes used for error blocks.
pub const ERROR_COLORS: &str = "white #ff0000";

/// Tags `text` with the given colors, or returns it untouched when `colors`
/// is `None`.
pub fn color_text(colors: Option<&ColorPair>, text: &str) -> String {
    match colors {
        Some(colors) => format!("{}{}]{}", COLOR_TAG, colors.codes(), text),
        None => text.to_string(),
    }
}

/// Wraps `body` in a foldable block.
pub fn foldblock(colors: &str, title: &str, body: &str) -> String {
    format!("{}{} title: {} text: {}]", FOLDBLOCK_TAG, colors, title, body)
}

/// A foldable block in the error style.
pub fn error_block(title: &str, body: &str) -> String {
    foldblock(ERROR_COLORS, title, body)
}

/// A run of text drawn with one color pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub foreground: Option<String>,
    pub background: Option<String>,
    pub text: String,
}

/// A parsed viewer message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Markup {
    Spans(Vec<Span>),
    FoldBlock {
        colors: String,
        title: String,
        text: String,
    },
}

impl Markup {
    pub fn parse(message: &str) -> Self {
        parse_foldblock(message).unwrap_or_else(|| Markup::Spans(parse_spans(message)))
    }
}

fn parse_foldblock(message: &str) -> Option<Markup> {
    let inner = message.strip_prefix(FOLDBLOCK_TAG)?.strip_suffix(']')?;
    let (colors, rest) = inner.split_once(" title: ")?;
    let (title, text) = rest.split_once(" text: ")?;
    Some(Markup::FoldBlock {
        colors: colors.to_string(),
        title: title.to_string(),
        text: text.to_string(),
    })
}

fn parse_spans(message: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut foreground: Option<String> = None;
    let mut background: Option<String> = None;
    let mut rest = message;

    loop {
        let Some(start) = rest.find(COLOR_TAG) else {
            break;
        };
        let after = &rest[start + COLOR_TAG.len()..];
        let Some(end) = after.find(']') else {
            break;
        };

        push_span(&mut spans, &foreground, &background, &rest[..start]);

        let mut codes = after[..end].split_whitespace();
        foreground = codes.next().map(str::to_string);
        background = codes.next().map(str::to_string);
        rest = &after[end + 1..];
    }

    push_span(&mut spans, &foreground, &background, rest);
    spans
}

fn push_span(
    spans: &mut Vec<Span>,
    foreground: &Option<String>,
    background: &Option<String>,
    text: &str,
) {
    if !text.is_empty() {
        spans.push(Span {
            foreground: foreground.clone(),
            background: background.clone(),
            text: text.to_string(),
        });
    }
}
