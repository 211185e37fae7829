//! Process entry point: runs the root command or group and maps the outcome
//! to an exit status.

use std::process::ExitCode;
use std::sync::Arc;

use crate::command::Command;
use crate::console::Console;
use crate::context::Context;
use crate::error::{CliError, ConfigError};
use crate::group::Group;
use crate::report::{ConsoleReporter, ErrorReporter};

/// What a [`Program`] runs.
#[derive(Debug, Clone)]
pub enum Root {
    Command(Command),
    Group(Group),
}

impl Root {
    pub fn name(&self) -> &str {
        match self {
            Root::Command(cmd) => cmd.name(),
            Root::Group(group) => group.name(),
        }
    }
}

impl From<Command> for Root {
    fn from(cmd: Command) -> Self {
        Root::Command(cmd)
    }
}

impl From<Group> for Root {
    fn from(group: Group) -> Self {
        Root::Group(group)
    }
}

/// A runnable command line program.
#[derive(Clone)]
pub struct Program {
    root: Root,
    prog_name: Option<String>,
    reporter: Arc<dyn ErrorReporter>,
    console: Console,
}

impl Program {
    /// Fails if a standalone root command has exclusive groups naming
    /// unknown parameters (groups check theirs when built).
    pub fn new(root: impl Into<Root>) -> Result<Self, ConfigError> {
        let root = root.into();
        if let Root::Command(cmd) = &root {
            cmd.check_exclusive_members()?;
        }
        Ok(Self {
            root,
            prog_name: None,
            reporter: Arc::new(ConsoleReporter),
            console: Console::stdio(),
        })
    }

    /// How errors are displayed in [`Program::main`].
    pub fn reporter(mut self, reporter: impl ErrorReporter + 'static) -> Self {
        self.reporter = Arc::new(reporter);
        self
    }

    pub fn console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    /// Name shown in usage lines; defaults to the root's name.
    pub fn prog_name(mut self, name: impl Into<String>) -> Self {
        self.prog_name = Some(name.into());
        self
    }

    pub fn root(&self) -> &Root {
        &self.root
    }

    /// Run with `args` (program name excluded) and return the outcome
    /// without printing errors.
    pub fn run<I, S>(&self, args: I) -> Result<(), CliError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run_in(args, &self.console)
    }

    pub(crate) fn run_in<I, S>(&self, args: I, console: &Console) -> Result<(), CliError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let name = self.prog_name.as_deref().unwrap_or(self.root.name());
        let ctx = Context::new(name).with_console(console.clone());
        match &self.root {
            Root::Command(cmd) => cmd.run(ctx, &args),
            Root::Group(group) => group.run(ctx, &args),
        }
    }

    /// Run with `args`, report any error and return the exit status.
    pub fn main_with<I, S>(&self, args: I) -> i32
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.main_in(args, &self.console)
    }

    pub(crate) fn main_in<I, S>(&self, args: I, console: &Console) -> i32
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match self.run_in(args, console) {
            Ok(()) => 0,
            Err(err) => {
                tracing::trace!(error = ?err, "invocation failed");
                self.reporter.report(&err, console);
                err.exit_code()
            }
        }
    }

    /// Run with the process arguments.
    pub fn main(&self) -> ExitCode {
        let code = self.main_with(std::env::args().skip(1));
        ExitCode::from(u8::try_from(code).unwrap_or(1))
    }
}
