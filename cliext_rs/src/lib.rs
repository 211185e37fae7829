//! # cliext
//!
//! **Subcommand CLIs without the boilerplate** - commands with aliases,
//! group-wide options that work on either side of the command name, and
//! errors that flow through your logger.
//!
//! ## Features
//!
//! - **Aliases** - `greet (hello,hi)` in help, resolved after literal names
//! - **Global options** - group options accepted anywhere on the command line
//! - **Shared parameters** - declared once, copied onto every subcommand
//! - **Mutually exclusive options** - rejected only when every member is passed
//! - **Console logging** - level prefixes, colors and a runtime verbosity switch
//! - **Config files** - JSON, TOML or YAML loaded into the context object
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cliext::{Command, Group, OptionSpec, Program};
//!
//! let mut group = Group::builder("tool")
//!     .option(OptionSpec::flag("debug", ["--debug", "-d"]))
//!     .global_options(["debug"])
//!     .build()?;
//! group.register_command(
//!     Command::builder("greet")
//!         .alias("hi")
//!         .handler(|ctx| {
//!             let debug = ctx.parent().is_some_and(|p| p.flag("debug"));
//!             ctx.echo(&format!("hello (debug={debug})"));
//!             Ok(())
//!         })
//!         .build()?,
//! )?;
//!
//! // `tool hi --debug` and `tool --debug greet` behave the same.
//! let program = Program::new(group)?;
//! std::process::exit(program.main_with(["hi", "--debug"]));
//! # Ok::<(), cliext::ConfigError>(())
//! ```

// ============================================================================
// Definitions
// ============================================================================

/// Command declarations, aliases and mutually exclusive groups.
pub mod command;
/// Groups of commands with global options and shared parameters.
pub mod group;
/// Options and positional arguments.
pub mod param;
pub mod value;

// ============================================================================
// Parsing
// ============================================================================

pub mod context;
pub mod parser;
/// Moves group-level global options in front of the command name.
pub mod rewrite;
pub mod suggest;

// ============================================================================
// Running and reporting
// ============================================================================

pub mod error;
pub mod program;
pub mod report;
pub mod testing;

// ============================================================================
// Output
// ============================================================================

pub mod colors;
pub mod console;
pub mod help;
pub mod log;

// ============================================================================
// Ready-made options
// ============================================================================

pub mod config;
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use colors::{Color, ColorMode, Painter, Style};
pub use command::{
    Command, CommandBuilder, ExclusiveConflict, HELP_OPTION, Handler,
    validate_mutually_exclusive,
};
pub use config::{ConfigFileError, ConfigFormat, load_config};
pub use console::{Captured, Console, Stream};
pub use context::{Context, Values};
pub use error::{CliError, ConfigError, UsageContext, UsageError};
pub use group::{Group, GroupBuilder, register_command, resolve_command};
pub use log::{
    ConsoleFormatter, ConsoleLayer, ConsoleSubscriber, LogHandle, Verbosity, console_subscriber,
    init_logging, install_panic_hook,
};
pub use options::{ConfigOption, config_option, verbose_option, verbosity_option};
pub use param::{ArgumentSpec, Callback, Nargs, OptionSpec, Param};
pub use program::{Program, Root};
pub use report::{ConsoleReporter, ErrorReporter, LogReporter};
pub use rewrite::{RewrittenArgs, partition_global_arguments, rewrite_global_arguments};
pub use testing::{CliRunner, RunResult};
pub use value::{Value, ValueType};
