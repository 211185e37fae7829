//! How failed invocations are shown to the user.
//!
//! A [`crate::Program`] is given one [`ErrorReporter`] when it is built.
//! [`ConsoleReporter`] writes everything to stderr; [`LogReporter`] sends
//! error messages through `tracing` so they pick up the console log format
//! and verbosity. At DEBUG, [`LogReporter`] also prints the cause chain of
//! failed handlers.

use tracing::Level;

use crate::console::Console;
use crate::error::{CliError, UsageContext};

/// Displays a [`CliError`] before the process exits.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, err: &CliError, console: &Console);
}

/// Usage line plus help hint, followed by a blank line once echoed.
fn usage_block(context: &UsageContext) -> String {
    match context.hint() {
        Some(hint) => format!("{}\n{hint}\n", context.usage),
        None => format!("{}\n", context.usage),
    }
}

/// `Caused by:` lines for a source chain, outermost first.
fn caused_by(causes: &[String]) -> String {
    causes
        .iter()
        .map(|cause| format!("Caused by: {cause}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Plain stderr output.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter;

impl ErrorReporter for ConsoleReporter {
    fn report(&self, err: &CliError, console: &Console) {
        match err {
            CliError::Usage(usage) => {
                if let Some(context) = usage.context() {
                    console.echo_err(&usage_block(context));
                }
                console.echo_err(&format!("Error: {}", usage.message()));
            }
            CliError::Failure { message, .. } => console.echo_err(&format!("Error: {message}")),
            CliError::Abort => console.echo_err("Aborted!"),
            CliError::Interrupted | CliError::Eof => console.echo_err("\nAborted!"),
            CliError::Exit(_) => {}
            CliError::Io(_) if err.is_broken_pipe() => {}
            CliError::Io(io_err) => console.echo_err(&format!("Error: {io_err}")),
        }
    }
}

/// Usage text on stdout, error messages through `tracing::error!`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, err: &CliError, console: &Console) {
        match err {
            CliError::Usage(usage) => {
                if let Some(context) = usage.context() {
                    console.echo(&usage_block(context));
                }
                tracing::error!("{}", usage.message());
            }
            CliError::Failure { message, causes }
                if !causes.is_empty() && tracing::enabled!(Level::DEBUG) =>
            {
                tracing::error!("{message}\n{}", caused_by(causes));
            }
            CliError::Failure { message, .. } => tracing::error!("{message}"),
            CliError::Io(io_err) if !err.is_broken_pipe() => tracing::error!("{io_err}"),
            other => ConsoleReporter.report(other, console),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::ColorMode;
    use crate::error::UsageError;
    use crate::log::{Verbosity, console_subscriber};
    use std::io;

    fn usage_error() -> CliError {
        UsageError::new("Missing command.")
            .in_context(|| UsageContext {
                command_path: "grp".into(),
                usage: "Usage: grp [OPTIONS] COMMAND [ARGS]...".into(),
                help_option: Some("--help".into()),
            })
            .into()
    }

    #[test]
    fn test_console_reporter_usage() {
        let console = Console::capturing();
        ConsoleReporter.report(&usage_error(), &console);
        assert_eq!(
            console.captured().stderr,
            "Usage: grp [OPTIONS] COMMAND [ARGS]...\n\
             Try 'grp --help' for help.\n\
             \n\
             Error: Missing command.\n"
        );
    }

    #[test]
    fn test_console_reporter_control_signals() {
        let console = Console::capturing();
        ConsoleReporter.report(&CliError::Abort, &console);
        ConsoleReporter.report(&CliError::Interrupted, &console);
        ConsoleReporter.report(&CliError::Exit(3), &console);
        ConsoleReporter.report(
            &CliError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "pipe")),
            &console,
        );
        ConsoleReporter.report(&CliError::failure("msg"), &console);
        assert_eq!(
            console.captured().stderr,
            "Aborted!\n\nAborted!\nError: msg\n"
        );
    }

    #[test]
    fn test_log_reporter_routes_messages_through_tracing() {
        let console = Console::capturing();
        let (subscriber, _handle) =
            console_subscriber(console.clone(), Verbosity::Info, ColorMode::Never);
        tracing::subscriber::with_default(subscriber, || {
            LogReporter.report(&usage_error(), &console);
            LogReporter.report(&CliError::failure("msg"), &console);
        });
        let captured = console.captured();
        assert_eq!(
            captured.stdout,
            "Usage: grp [OPTIONS] COMMAND [ARGS]...\nTry 'grp --help' for help.\n\n"
        );
        assert_eq!(captured.stderr, "Error: Missing command.\nError: msg\n");
    }

    fn chained_failure() -> CliError {
        CliError::from_invocation(
            anyhow::anyhow!("missing field `greeting`").context("Invalid configuration"),
        )
    }

    #[test]
    fn test_log_reporter_adds_causes_at_debug() {
        let console = Console::capturing();
        let (subscriber, _handle) =
            console_subscriber(console.clone(), Verbosity::Debug, ColorMode::Never);
        tracing::subscriber::with_default(subscriber, || {
            LogReporter.report(&chained_failure(), &console);
        });
        assert_eq!(
            console.captured().stderr,
            "Error: Invalid configuration\n       Caused by: missing field `greeting`\n"
        );
    }

    #[test]
    fn test_log_reporter_hides_causes_at_info() {
        let console = Console::capturing();
        let (subscriber, _handle) =
            console_subscriber(console.clone(), Verbosity::Info, ColorMode::Never);
        tracing::subscriber::with_default(subscriber, || {
            LogReporter.report(&chained_failure(), &console);
        });
        assert_eq!(console.captured().stderr, "Error: Invalid configuration\n");
    }

    #[test]
    fn test_log_reporter_respects_quiet() {
        let console = Console::capturing();
        let (subscriber, _handle) =
            console_subscriber(console.clone(), Verbosity::Quiet, ColorMode::Never);
        tracing::subscriber::with_default(subscriber, || {
            LogReporter.report(&CliError::failure("msg"), &console);
        });
        assert_eq!(console.captured().output, "");
    }
}
