//! Renders viewer markup to an ANSI terminal.
use crate::console::markup::{Markup, Span};
use colored::{Color, ColoredString, Colorize};

/// Maps a markup color code (`#rrggbb` or a name) to a terminal color.
/// `Transparent` and unknown names map to `None`.
pub fn parse_color(code: &str) -> Option<Color> {
    if let Some(hex) = code.strip_prefix('#') {
        if hex.len() != 6 {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();
        return Some(Color::TrueColor {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        });
    }
    code.parse::<Color>().ok()
}

fn paint(text: &str, foreground: Option<&str>, background: Option<&str>) -> ColoredString {
    let mut painted = ColoredString::from(text);
    if let Some(color) = foreground.and_then(parse_color) {
        painted = painted.color(color);
    }
    if let Some(color) = background.and_then(parse_color) {
        painted = painted.on_color(color);
    }
    painted
}

fn render_span(span: &Span) -> String {
    paint(
        &span.text,
        span.foreground.as_deref(),
        span.background.as_deref(),
    )
    .to_string()
}

/// Renders one viewer message for the terminal.
pub fn render_markup(markup: &Markup) -> String {
    match markup {
        Markup::Spans(spans) => spans.iter().map(render_span).collect(),
        Markup::FoldBlock {
            colors,
            title,
            text,
        } => {
            let mut codes = colors.split_whitespace();
            let title = paint(&format!("▼ {}", title), codes.next(), codes.next()).bold();
            let body = text
                .lines()
                .map(|line| format!("  {}", line))
                .collect::<Vec<_>>()
                .join("\n");
            format!("{}\n{}", title, body)
        }
    }
}
