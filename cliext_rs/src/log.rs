//! Console logging on top of `tracing`.
//!
//! [`ConsoleLayer`] prints each event as one (possibly multi-line) message:
//! errors and warnings to stderr, everything else to stdout. Levels other
//! than INFO get a colored `Level:` prefix:
//!
//! ```text
//! Error: could not open file
//! Warning: first line
//!          continuation
//! ```
//!
//! Verbosity lives in a shared [`LogHandle`] so options parsed at runtime
//! (`--verbose`, `--verbosity`) can change it after the subscriber is
//! installed.

use std::collections::HashMap;
use std::fmt;
use std::panic;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tracing::field::{Field, Visit};
use tracing::subscriber::Interest;
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_subscriber::layer::{Context, Layered, SubscriberExt};
use tracing_subscriber::{Layer, Registry};

use crate::colors::{Color, ColorMode, Painter, Style};
use crate::console::{Console, Stream};
use crate::error::ConfigError;

// ============================================================================
// Verbosity
// ============================================================================

/// How much is logged. Each level includes the ones before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Verbosity {
    /// Nothing at all.
    Quiet,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl Verbosity {
    pub const ALL: [Verbosity; 6] = [
        Verbosity::Quiet,
        Verbosity::Error,
        Verbosity::Warn,
        Verbosity::Info,
        Verbosity::Debug,
        Verbosity::Trace,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Verbosity::Quiet => "QUIET",
            Verbosity::Error => "ERROR",
            Verbosity::Warn => "WARN",
            Verbosity::Info => "INFO",
            Verbosity::Debug => "DEBUG",
            Verbosity::Trace => "TRACE",
        }
    }

    /// All level names, for choice options.
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|v| v.as_str()).collect()
    }

    fn max_level(self) -> Option<Level> {
        match self {
            Verbosity::Quiet => None,
            Verbosity::Error => Some(Level::ERROR),
            Verbosity::Warn => Some(Level::WARN),
            Verbosity::Info => Some(Level::INFO),
            Verbosity::Debug => Some(Level::DEBUG),
            Verbosity::Trace => Some(Level::TRACE),
        }
    }

    pub fn allows(self, level: &Level) -> bool {
        self.max_level().is_some_and(|max| *level <= max)
    }

    fn from_u8(raw: u8) -> Self {
        Self::ALL
            .get(usize::from(raw))
            .copied()
            .unwrap_or_default()
    }

    fn to_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verbosity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "QUIET" => Ok(Verbosity::Quiet),
            "ERROR" => Ok(Verbosity::Error),
            "WARN" | "WARNING" => Ok(Verbosity::Warn),
            "INFO" => Ok(Verbosity::Info),
            "DEBUG" => Ok(Verbosity::Debug),
            "TRACE" => Ok(Verbosity::Trace),
            _ => Err(format!("Unknown verbosity '{s}'")),
        }
    }
}

/// Shared, adjustable verbosity. Clones share the same level.
#[derive(Debug, Clone)]
pub struct LogHandle {
    level: Arc<AtomicU8>,
    initial: Verbosity,
}

impl LogHandle {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            level: Arc::new(AtomicU8::new(verbosity.to_u8())),
            initial: verbosity,
        }
    }

    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_u8(self.level.load(Ordering::Relaxed))
    }

    pub fn set_verbosity(&self, verbosity: Verbosity) {
        self.level.store(verbosity.to_u8(), Ordering::Relaxed);
    }

    /// Back to the verbosity the handle was created with.
    pub fn reset(&self) {
        self.set_verbosity(self.initial);
    }

    pub fn enabled(&self, level: &Level) -> bool {
        self.verbosity().allows(level)
    }
}

impl Default for LogHandle {
    fn default() -> Self {
        Self::new(Verbosity::default())
    }
}

// ============================================================================
// Formatter
// ============================================================================

fn level_label(level: Level) -> &'static str {
    match level {
        Level::ERROR => "Error",
        Level::WARN => "Warning",
        Level::INFO => "Info",
        Level::DEBUG => "Debug",
        _ => "Trace",
    }
}

/// Turns a level and message into console text.
#[derive(Debug, Clone)]
pub struct ConsoleFormatter {
    /// Levels with a prefix, and how the prefix is styled.
    prefix_styles: HashMap<Level, Style>,
}

impl Default for ConsoleFormatter {
    fn default() -> Self {
        let prefix_styles = HashMap::from([
            (Level::ERROR, Style::new().fg(Color::Red)),
            (Level::WARN, Style::new().fg(Color::Yellow)),
            (Level::DEBUG, Style::new().fg(Color::Blue)),
            (Level::TRACE, Style::new().dim()),
        ]);
        Self { prefix_styles }
    }
}

impl ConsoleFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the prefix style of `level`. `Some` is merged over the
    /// current style; `None` keeps the prefix but drops all styling. Giving
    /// INFO a style makes it prefixed too.
    pub fn style(mut self, level: Level, style: Option<Style>) -> Self {
        let style = match style {
            Some(style) => self
                .prefix_styles
                .get(&level)
                .copied()
                .unwrap_or_default()
                .merge(style),
            None => Style::default(),
        };
        self.prefix_styles.insert(level, style);
        self
    }

    pub fn prefix_style(&self, level: Level) -> Option<&Style> {
        self.prefix_styles.get(&level)
    }

    pub fn format(&self, level: Level, message: &str, painter: &Painter) -> String {
        let message = message.trim();
        let Some(style) = self.prefix_styles.get(&level) else {
            return message.to_string();
        };

        let label = level_label(level);
        let prefix = painter.paint(&format!("{label}:"), style);
        let indent = " ".repeat(label.len() + 2);

        let mut lines = message.lines();
        let Some(first) = lines.next() else {
            return prefix;
        };
        let mut out = format!("{prefix} {first}");
        for line in lines {
            out.push('\n');
            out.push_str(&indent);
            out.push_str(line);
        }
        out
    }
}

// ============================================================================
// Layer
// ============================================================================

/// `tracing` layer printing formatted events to a [`Console`].
#[derive(Debug, Clone)]
pub struct ConsoleLayer {
    console: Console,
    formatter: ConsoleFormatter,
    painter: Painter,
    handle: LogHandle,
}

impl ConsoleLayer {
    pub fn new(console: Console, handle: LogHandle, painter: Painter) -> Self {
        Self {
            console,
            formatter: ConsoleFormatter::default(),
            painter,
            handle,
        }
    }

    pub fn with_formatter(mut self, formatter: ConsoleFormatter) -> Self {
        self.formatter = formatter;
        self
    }
}

impl<S> Layer<S> for ConsoleLayer
where
    S: Subscriber,
{
    fn register_callsite(&self, _metadata: &'static Metadata<'static>) -> Interest {
        // Verbosity changes at runtime; never let a callsite cache a verdict.
        Interest::sometimes()
    }

    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        self.handle.enabled(metadata.level())
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = *event.metadata().level();
        if !self.handle.enabled(&level) {
            return;
        }
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let text = self.formatter.format(level, &visitor.finish(), &self.painter);
        let stream = if level <= Level::WARN {
            Stream::Stderr
        } else {
            Stream::Stdout
        };
        let mut line = text;
        line.push('\n');
        self.console.write_str(stream, &line);
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<String>,
}

impl MessageVisitor {
    /// The message followed by any `key=value` fields.
    fn finish(self) -> String {
        if self.fields.is_empty() {
            return self.message;
        }
        format!("{} {}", self.message, self.fields.join(" "))
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }
}

// ============================================================================
// Setup
// ============================================================================

/// Subscriber type built by [`console_subscriber`].
pub type ConsoleSubscriber = Layered<ConsoleLayer, Registry>;

/// Build a console subscriber without installing it.
pub fn console_subscriber(
    console: Console,
    verbosity: Verbosity,
    color: ColorMode,
) -> (ConsoleSubscriber, LogHandle) {
    let handle = LogHandle::new(verbosity);
    let layer = ConsoleLayer::new(console, handle.clone(), Painter::new(color));
    (tracing_subscriber::registry().with(layer), handle)
}

/// Install a console subscriber on the real stdio as the global default.
///
/// Fails if a global subscriber is already set.
pub fn init_logging(verbosity: Verbosity, color: ColorMode) -> Result<LogHandle, ConfigError> {
    let (subscriber, handle) = console_subscriber(Console::stdio(), verbosity, color);
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|_| ConfigError::LoggingAlreadyInitialised)?;
    Ok(handle)
}

/// Log panics as errors. The previous hook (message and backtrace) only
/// runs at DEBUG or TRACE.
pub fn install_panic_hook(handle: LogHandle) {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let payload = info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic".to_string());
        tracing::error!("{message}");
        if handle.verbosity() >= Verbosity::Debug {
            previous(info);
        }
    }));
}
