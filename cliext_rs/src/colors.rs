//! Terminal color utilities for console output.
//!
//! Provides ANSI color codes, per-level [`Style`]s used by the log
//! formatter, and a [`Painter`] that only colors when the color mode allows.

use std::io::IsTerminal;
use std::str::FromStr;

// ============================================================================
// ANSI Codes
// ============================================================================

pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
pub const UNDERLINE: &str = "\x1b[4m";
pub const RESET: &str = "\x1b[0m";

/// The eight standard terminal colors plus their bright variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    BrightRed,
    BrightGreen,
    BrightYellow,
    BrightBlue,
    BrightCyan,
}

impl Color {
    fn offset(self) -> u8 {
        match self {
            Color::Black => 0,
            Color::Red => 1,
            Color::Green => 2,
            Color::Yellow => 3,
            Color::Blue => 4,
            Color::Magenta => 5,
            Color::Cyan => 6,
            Color::White => 7,
            Color::BrightRed => 61,
            Color::BrightGreen => 62,
            Color::BrightYellow => 63,
            Color::BrightBlue => 64,
            Color::BrightCyan => 66,
        }
    }

    /// Foreground escape sequence, e.g. `\x1b[31m` for red.
    pub fn fg_code(self) -> String {
        format!("\x1b[{}m", 30 + self.offset())
    }

    /// Background escape sequence, e.g. `\x1b[41m` for red.
    pub fn bg_code(self) -> String {
        format!("\x1b[{}m", 40 + self.offset())
    }
}

// ============================================================================
// Color Mode
// ============================================================================

/// When console output should be colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

impl FromStr for ColorMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "auto" => Ok(ColorMode::Auto),
            "always" | "yes" | "true" => Ok(ColorMode::Always),
            "never" | "no" | "false" => Ok(ColorMode::Never),
            _ => Err(format!(
                "Invalid color mode '{}'. Use: auto, always, or never.",
                value
            )),
        }
    }
}

/// Determines if colors should be used based on ColorMode and terminal detection.
///
/// `Auto` only colors when both stdout and stderr are terminals, since log
/// output is split across the two streams.
pub fn is_enabled(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => std::io::stdout().is_terminal() && std::io::stderr().is_terminal(),
    }
}

// ============================================================================
// Styles
// ============================================================================

/// A text style: optional foreground/background color plus attributes.
///
/// The empty style renders text unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
    pub dim: bool,
    pub underline: bool,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fg(mut self, color: Color) -> Self {
        self.fg = Some(color);
        self
    }

    pub fn bg(mut self, color: Color) -> Self {
        self.bg = Some(color);
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn dim(mut self) -> Self {
        self.dim = true;
        self
    }

    pub fn underline(mut self) -> Self {
        self.underline = true;
        self
    }

    pub fn is_plain(&self) -> bool {
        *self == Style::default()
    }

    /// Overlay `other` on top of this style; set fields of `other` win.
    pub fn merge(self, other: Style) -> Style {
        Style {
            fg: other.fg.or(self.fg),
            bg: other.bg.or(self.bg),
            bold: self.bold || other.bold,
            dim: self.dim || other.dim,
            underline: self.underline || other.underline,
        }
    }

    /// Wrap `text` in this style's escape codes.
    pub fn paint(&self, text: &str) -> String {
        if self.is_plain() {
            return text.to_string();
        }
        let mut out = String::new();
        if let Some(fg) = self.fg {
            out.push_str(&fg.fg_code());
        }
        if let Some(bg) = self.bg {
            out.push_str(&bg.bg_code());
        }
        if self.bold {
            out.push_str(BOLD);
        }
        if self.dim {
            out.push_str(DIM);
        }
        if self.underline {
            out.push_str(UNDERLINE);
        }
        out.push_str(text);
        out.push_str(RESET);
        out
    }
}

// ============================================================================
// Painter
// ============================================================================

/// Colorizer that can be passed around to format functions.
#[derive(Clone, Copy, Debug)]
pub struct Painter {
    enabled: bool,
}

impl Painter {
    pub fn new(mode: ColorMode) -> Self {
        Self {
            enabled: is_enabled(mode),
        }
    }

    pub fn plain() -> Self {
        Self { enabled: false }
    }

    pub fn forced() -> Self {
        Self { enabled: true }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Apply `style` when coloring is enabled; otherwise return `s` untouched.
    pub fn paint(&self, s: &str, style: &Style) -> String {
        if self.enabled {
            style.paint(s)
        } else {
            s.to_string()
        }
    }
}
