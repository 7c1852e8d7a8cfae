//! The sixteen standard console colors and the codes the viewer understands.
use serde::Deserialize;
use std::str::FromStr;

/// Token sent for a color that has no mapping.
pub const TRANSPARENT: &str = "Transparent";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum ConsoleColor {
    Black,
    DarkBlue,
    DarkGreen,
    DarkCyan,
    DarkRed,
    DarkMagenta,
    DarkYellow,
    Gray,
    DarkGray,
    Blue,
    Green,
    Cyan,
    Red,
    Magenta,
    Yellow,
    White,
}

impl ConsoleColor {
    pub const ALL: [ConsoleColor; 16] = [
        ConsoleColor::Black,
        ConsoleColor::DarkBlue,
        ConsoleColor::DarkGreen,
        ConsoleColor::DarkCyan,
        ConsoleColor::DarkRed,
        ConsoleColor::DarkMagenta,
        ConsoleColor::DarkYellow,
        ConsoleColor::Gray,
        ConsoleColor::DarkGray,
        ConsoleColor::Blue,
        ConsoleColor::Green,
        ConsoleColor::Cyan,
        ConsoleColor::Red,
        ConsoleColor::Magenta,
        ConsoleColor::Yellow,
        ConsoleColor::White,
    ];

    /// The color as the viewer expects it: a name or a `#rrggbb` code.
    pub fn code(&self) -> &'static str {
        match self {
            ConsoleColor::Black => "black",
            ConsoleColor::DarkBlue => "#0037da",
            ConsoleColor::DarkGreen => "#13a10e",
            ConsoleColor::DarkCyan => "#3a96dd",
            ConsoleColor::DarkRed => "#c50f1f",
            ConsoleColor::DarkMagenta => "#881798",
            ConsoleColor::DarkYellow => "#c19c00",
            ConsoleColor::Gray => "#cccccc",
            ConsoleColor::DarkGray => "#767676",
            ConsoleColor::Blue => "#0037da",
            ConsoleColor::Green => "#16c60c",
            ConsoleColor::Cyan => "#61d6d6",
            ConsoleColor::Red => "#e74856",
            ConsoleColor::Magenta => "#b4009e",
            ConsoleColor::Yellow => "#f9f1a5",
            ConsoleColor::White => "white",
        }
    }

    /// Maps a console color index (0..=15) to a color.
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }
}

impl FromStr for ConsoleColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.replace(['-', '_'], "").to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|color| format!("{:?}", color).to_ascii_lowercase() == wanted)
            .ok_or_else(|| format!("unknown console color: {}", s))
    }
}

/// The code for an optional color; unset colors are transparent.
pub fn color_code(color: Option<ConsoleColor>) -> &'static str {
    color.map(|c| c.code()).unwrap_or(TRANSPARENT)
}

/// The foreground/background pair text is currently written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ColorPair {
    pub foreground: Option<ConsoleColor>,
    pub background: Option<ConsoleColor>,
}

impl Default for ColorPair {
    fn default() -> Self {
        Self {
            foreground: Some(ConsoleColor::Gray),
            background: Some(ConsoleColor::Black),
        }
    }
}

impl ColorPair {
    pub fn new(foreground: Option<ConsoleColor>, background: Option<ConsoleColor>) -> Self {
        Self {
            foreground,
            background,
        }
    }

    /// `"<fg> <bg>"` as used inside markup tags.
    pub fn codes(&self) -> String {
        format!("{} {}", color_code(self.foreground), color_code(self.background))
    }
}
