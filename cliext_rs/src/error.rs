//! Error taxonomy.
//!
//! - [`ConfigError`]: programmer mistakes found while building commands and
//!   groups. Returned from builders and registration, never shown to users.
//! - [`UsageError`]: bad command lines. Shown with the usage line, exit 2.
//! - [`CliError`]: the outcome of one invocation, including the control
//!   signals (abort, interrupt, end of input, exit, I/O) that pass through the
//!   invoke boundary untouched.

use std::io;

use thiserror::Error;

/// Construction or registration fault. Fatal: setup must stop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Unknown global option {0}")]
    UnknownGlobalOption(String),

    #[error("Invalid global option {0}; global options must be an option")]
    GlobalNotAnOption(String),

    #[error("Unknown shared parameter {0}")]
    UnknownSharedParameter(String),

    #[error("Parameter {0} cannot be both a global option and a shared parameter")]
    GlobalAndShared(String),

    #[error("Subcommand {0} conflicts with a global option name")]
    CommandConflictsWithGlobal(String),

    #[error("Subcommand option {0} conflicts with a global option name")]
    GlobalNameConflict(String),

    #[error("Subcommand {kind} {name} conflicts with a shared parameter name")]
    SharedNameConflict { kind: &'static str, name: String },

    #[error("Subcommand option string {0} conflicts with a global option string")]
    GlobalSpellingConflict(String),

    #[error("Subcommand option string {0} conflicts with a shared option string")]
    SharedSpellingConflict(String),

    #[error("Command {0} is already registered")]
    DuplicateCommand(String),

    #[error("Duplicate parameter name {0}")]
    DuplicateParameter(String),

    #[error("Option string {0} is declared more than once")]
    DuplicateSpelling(String),

    #[error("Invalid option string {0:?}; option strings must start with '-'")]
    InvalidSpelling(String),

    #[error("Option {0} must declare at least one option string")]
    MissingSpelling(String),

    #[error("Option {0} takes values and needs an arity of at least 1")]
    InvalidArity(String),

    #[error("Mutually exclusive group [{}] needs at least two parameters", .0.join(", "))]
    ExclusiveGroupTooSmall(Vec<String>),

    #[error("Unknown parameter {name} in a mutually exclusive group of {command}")]
    UnknownExclusiveMember { command: String, name: String },

    #[error("A global logger is already installed")]
    LoggingAlreadyInitialised,
}

/// Where a usage error happened, for the `Usage:` line and help hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageContext {
    /// e.g. `grp cmd`
    pub command_path: String,
    /// e.g. `Usage: grp cmd [OPTIONS]`
    pub usage: String,
    /// Spelling of the help option, when the command has one.
    pub help_option: Option<String>,
}

impl UsageContext {
    /// `Try 'grp cmd --help' for help.` when a help option exists.
    pub fn hint(&self) -> Option<String> {
        self.help_option
            .as_ref()
            .map(|help| format!("Try '{} {}' for help.", self.command_path, help))
    }
}

/// A user-facing command line mistake.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct UsageError {
    message: String,
    option: Option<String>,
    context: Option<UsageContext>,
}

impl UsageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            option: None,
            context: None,
        }
    }

    /// Record the offending option string.
    pub fn for_option(mut self, option: impl Into<String>) -> Self {
        self.option = Some(option.into());
        self
    }

    /// Attach a context unless one is already set (the innermost wins).
    pub fn in_context(mut self, context: impl FnOnce() -> UsageContext) -> Self {
        if self.context.is_none() {
            self.context = Some(context());
        }
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn option(&self) -> Option<&str> {
        self.option.as_deref()
    }

    pub fn context(&self) -> Option<&UsageContext> {
        self.context.as_ref()
    }
}

/// Outcome of a failed invocation.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Usage(#[from] UsageError),

    /// A command failed; shown as `Error: <message>`, exit 1.
    #[error("{message}")]
    Failure {
        message: String,
        /// Underlying errors, outermost first.
        causes: Vec<String>,
    },

    /// Deliberate abort requested by the command.
    #[error("Aborted!")]
    Abort,

    /// A handler read was interrupted (`io::ErrorKind::Interrupted`).
    /// SIGINT itself is not caught and keeps the default process behaviour.
    #[error("Interrupted")]
    Interrupted,

    /// Input ended while the command was still reading.
    #[error("Unexpected end of input")]
    Eof,

    /// Stop with the given status code without printing anything.
    #[error("Exit with status {0}")]
    Exit(i32),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl CliError {
    pub fn usage(message: impl Into<String>) -> Self {
        CliError::Usage(UsageError::new(message))
    }

    pub fn failure(message: impl Into<String>) -> Self {
        CliError::Failure {
            message: message.into(),
            causes: Vec::new(),
        }
    }

    /// Normalize whatever a command handler returned.
    ///
    /// Framework errors and the allow-listed control signals keep their
    /// identity; anything else becomes a [`CliError::Failure`] carrying the
    /// error's message and the messages of its source chain.
    pub fn from_invocation(err: anyhow::Error) -> Self {
        let err = match err.downcast::<CliError>() {
            Ok(cli) => return cli,
            Err(err) => err,
        };
        let err = match err.downcast::<UsageError>() {
            Ok(usage) => return CliError::Usage(usage),
            Err(err) => err,
        };
        match err.downcast::<io::Error>() {
            Ok(io_err) => match io_err.kind() {
                io::ErrorKind::Interrupted => CliError::Interrupted,
                io::ErrorKind::UnexpectedEof => CliError::Eof,
                _ => CliError::Io(io_err),
            },
            Err(other) => CliError::Failure {
                message: other.to_string(),
                causes: other.chain().skip(1).map(ToString::to_string).collect(),
            },
        }
    }

    /// Process exit status for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => 2,
            CliError::Exit(code) => *code,
            CliError::Failure { .. }
            | CliError::Abort
            | CliError::Interrupted
            | CliError::Eof
            | CliError::Io(_) => 1,
        }
    }

    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, CliError::Io(err) if err.kind() == io::ErrorKind::BrokenPipe)
    }

    /// Attach a usage context to usage errors that lack one.
    pub(crate) fn in_context(self, context: impl FnOnce() -> UsageContext) -> Self {
        match self {
            CliError::Usage(err) => CliError::Usage(err.in_context(context)),
            other => other,
        }
    }
}
