//! In-process runner for exercising a [`Program`] from tests.
//!
//! Output goes to a capturing [`Console`]; with [`CliRunner::with_logging`]
//! log records are captured too, through a console subscriber scoped to each
//! invocation.

use tracing::Dispatch;

use crate::colors::ColorMode;
use crate::console::Console;
use crate::log::{LogHandle, Verbosity, console_subscriber};
use crate::program::Program;

/// Outcome of one [`CliRunner::invoke`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub exit_code: i32,
    /// Both streams interleaved in write order.
    pub output: String,
    pub stdout: String,
    pub stderr: String,
}

impl RunResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

pub struct CliRunner {
    console: Console,
    logging: Option<(Dispatch, LogHandle)>,
}

impl Default for CliRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CliRunner {
    pub fn new() -> Self {
        Self {
            console: Console::capturing(),
            logging: None,
        }
    }

    /// Capture `tracing` output at `verbosity`, without color.
    pub fn with_logging(mut self, verbosity: Verbosity) -> Self {
        let (subscriber, handle) =
            console_subscriber(self.console.clone(), verbosity, ColorMode::Never);
        self.logging = Some((Dispatch::new(subscriber), handle));
        self
    }

    /// Level control of the captured logger, for verbosity options.
    pub fn log_handle(&self) -> Option<&LogHandle> {
        self.logging.as_ref().map(|(_, handle)| handle)
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    /// Run `program` with `args` and collect what it printed. Errors are
    /// reported the way [`Program::main`] would.
    pub fn invoke<I, S>(&self, program: &Program, args: I) -> RunResult
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.console.clear();
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let exit_code = match &self.logging {
            Some((dispatch, _)) => tracing::dispatcher::with_default(dispatch, || {
                program.main_in(args, &self.console)
            }),
            None => program.main_in(args, &self.console),
        };
        let captured = self.console.captured();
        RunResult {
            exit_code,
            output: captured.output,
            stdout: captured.stdout,
            stderr: captured.stderr,
        }
    }

    /// [`CliRunner::invoke`] with whitespace separated arguments.
    pub fn invoke_str(&self, program: &Program, line: &str) -> RunResult {
        self.invoke(program, line.split_whitespace())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::report::LogReporter;

    fn program() -> Program {
        let cmd = Command::builder("prog")
            .handler(|ctx| {
                tracing::debug!("debug line");
                tracing::warn!("careful");
                ctx.echo("done");
                Ok(())
            })
            .build()
            .unwrap();
        Program::new(cmd).unwrap().reporter(LogReporter)
    }

    #[test]
    fn test_invoke_captures_streams() {
        let result = CliRunner::new().invoke_str(&program(), "");
        assert!(result.success());
        assert_eq!(result.stdout, "done\n");
        assert_eq!(result.stderr, "");
    }

    #[test]
    fn test_with_logging_captures_records() {
        let runner = CliRunner::new().with_logging(Verbosity::Info);
        let result = runner.invoke_str(&program(), "");
        assert_eq!(result.output, "Warning: careful\ndone\n");

        if let Some(handle) = runner.log_handle() {
            handle.set_verbosity(Verbosity::Debug);
        }
        let result = runner.invoke_str(&program(), "");
        assert_eq!(result.output, "Debug: debug line\nWarning: careful\ndone\n");
    }

    #[test]
    fn test_invoke_reports_errors() {
        let runner = CliRunner::new().with_logging(Verbosity::Info);
        let result = runner.invoke_str(&program(), "extra");
        assert_eq!(result.exit_code, 2);
        assert_eq!(
            result.stdout,
            "Usage: prog [OPTIONS]\nTry 'prog --help' for help.\n\n"
        );
        assert_eq!(result.stderr, "Error: Got unexpected extra argument (extra)\n");
    }
}
