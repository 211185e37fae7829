//! Help text formatting.
//!
//! Layout follows the usual `Usage:` / sections / definition-list shape:
//!
//! ```text
//! Usage: grp [OPTIONS] COMMAND [ARGS]...
//!
//! Options:
//!   --help       Show this message and exit.
//!   --opt1 TEXT
//!
//! Commands:
//!   cmd1 (a,b)
//!   cmd2
//! ```

use crate::param::OptionSpec;

pub const DEFAULT_WIDTH: usize = 80;
/// Widest first column before the second column moves to its own line.
const COL_MAX: usize = 30;
const COL_SPACING: usize = 2;
const INDENT_STEP: usize = 2;

/// Accumulates help output with indentation and wrapping.
#[derive(Debug, Clone)]
pub struct HelpFormatter {
    width: usize,
    current_indent: usize,
    buffer: String,
}

impl Default for HelpFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl HelpFormatter {
    pub fn new() -> Self {
        Self::with_width(DEFAULT_WIDTH)
    }

    pub fn with_width(width: usize) -> Self {
        Self {
            width,
            current_indent: 0,
            buffer: String::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    fn indent(&self) -> String {
        " ".repeat(self.current_indent)
    }

    /// `Usage: <prog> <args>`, wrapping `args` under itself when long.
    pub fn write_usage(&mut self, prog: &str, args: &str) {
        let prefix = format!("{}Usage: {prog}", self.indent());
        if args.is_empty() {
            self.buffer.push_str(&prefix);
            self.buffer.push('\n');
            return;
        }
        let prefix = format!("{prefix} ");
        let text_width = self.width.saturating_sub(prefix.len()).max(10);
        let lines = wrap_words(args, text_width);
        let hanging = " ".repeat(prefix.len());
        for (i, line) in lines.iter().enumerate() {
            self.buffer.push_str(if i == 0 { &prefix } else { &hanging });
            self.buffer.push_str(line);
            self.buffer.push('\n');
        }
    }

    /// Blank line separator, unless nothing was written yet.
    pub fn write_paragraph(&mut self) {
        if !self.buffer.is_empty() {
            self.buffer.push('\n');
        }
    }

    pub fn write_heading(&mut self, heading: &str) {
        let line = format!("{}{heading}:\n", self.indent());
        self.buffer.push_str(&line);
    }

    /// Wrapped, indented text. Blank lines separate paragraphs.
    pub fn write_text(&mut self, text: &str) {
        let indent = self.indent();
        let text_width = self.width.saturating_sub(self.current_indent).max(10);
        for (i, paragraph) in text.split("\n\n").enumerate() {
            if i > 0 {
                self.buffer.push('\n');
            }
            for line in wrap_words(paragraph, text_width) {
                self.buffer.push_str(&indent);
                self.buffer.push_str(&line);
                self.buffer.push('\n');
            }
        }
    }

    /// Run `body` one indentation step deeper.
    pub fn indented(&mut self, body: impl FnOnce(&mut Self)) {
        self.current_indent += INDENT_STEP;
        body(self);
        self.current_indent -= INDENT_STEP;
    }

    /// A titled, indented section preceded by a blank line.
    pub fn section(&mut self, name: &str, body: impl FnOnce(&mut Self)) {
        self.write_paragraph();
        self.write_heading(name);
        self.indented(body);
    }

    /// Two-column definition list.
    pub fn write_dl(&mut self, rows: &[(String, String)]) {
        let widest = rows.iter().map(|(first, _)| first.len()).max().unwrap_or(0);
        let first_col = widest.min(COL_MAX) + COL_SPACING;
        let indent = self.indent();
        let hanging = " ".repeat(first_col + self.current_indent);

        for (first, second) in rows {
            self.buffer.push_str(&indent);
            self.buffer.push_str(first);
            if second.is_empty() {
                self.buffer.push('\n');
                continue;
            }
            if first.len() <= first_col - COL_SPACING {
                self.buffer.push_str(&" ".repeat(first_col - first.len()));
            } else {
                self.buffer.push('\n');
                self.buffer.push_str(&hanging);
            }

            let text_width = self.width.saturating_sub(first_col + 2).max(10);
            let lines = wrap_words(second, text_width);
            for (i, line) in lines.iter().enumerate() {
                if i > 0 {
                    self.buffer.push_str(&hanging);
                }
                self.buffer.push_str(line);
                self.buffer.push('\n');
            }
            if lines.is_empty() {
                self.buffer.push('\n');
            }
        }
    }

    /// The rendered text without trailing newlines.
    pub fn finish(self) -> String {
        self.buffer.trim_end_matches('\n').to_string()
    }
}

/// Greedy word wrap; words longer than `width` get their own line.
fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

// ============================================================================
// Records
// ============================================================================

/// Spellings joined for display, short (`-o`) before long (`--opt`).
pub fn join_options(spellings: &[String]) -> String {
    let mut sorted: Vec<&String> = spellings.iter().collect();
    sorted.sort_by_key(|s| if s.starts_with("--") { 2 } else { 1 });
    sorted
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Definition-list row for an option, `None` when hidden.
pub fn option_record(option: &OptionSpec) -> Option<(String, String)> {
    if option.is_hidden() {
        return None;
    }
    let mut first = join_options(option.spellings());
    if !option.is_flag() {
        first.push(' ');
        first.push_str(&option.metavar_text());
    }
    let mut second = option.help_text().unwrap_or_default().to_string();
    if option.is_required() {
        if !second.is_empty() {
            second.push_str("  ");
        }
        second.push_str("[required]");
    }
    Some((first, second))
}

/// First sentence of `help`, cut to `max_length` with `...` when needed.
pub fn make_short_help(help: &str, max_length: usize) -> String {
    let paragraph = help.split("\n\n").next().unwrap_or_default();
    let words: Vec<&str> = paragraph.split_whitespace().collect();
    let Some(last_index) = words.len().checked_sub(1) else {
        return String::new();
    };

    let mut total_length = 0;
    let mut stop = None;
    for (i, word) in words.iter().enumerate() {
        total_length += word.len() + usize::from(i > 0);
        if total_length > max_length {
            stop = Some(i);
            break;
        }
        if word.ends_with('.') {
            return words[..=i].join(" ");
        }
        if total_length == max_length && i != last_index {
            stop = Some(i);
            break;
        }
    }
    let Some(mut i) = stop else {
        return words.join(" ");
    };

    // Drop words until the ellipsis fits.
    total_length += "...".len();
    while i > 0 {
        total_length -= words[i].len() + usize::from(i > 0);
        if total_length <= max_length {
            break;
        }
        i -= 1;
    }
    format!("{}...", words[..i].join(" "))
}
