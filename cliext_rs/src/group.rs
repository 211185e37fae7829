//! Command groups: global options, shared parameters and dispatch.
//!
//! A group owns its registered commands. Two kinds of group-level
//! parameters change how subcommands behave:
//!
//! - **global options** stay on the group but may be typed anywhere on the
//!   command line; they are pulled to the front before parsing (see
//!   [`crate::rewrite`]) and never reach the subcommand;
//! - **shared parameters** are removed from the group and injected into
//!   every command at registration, as if each command declared them.
//!
//! Registration rejects commands whose names, parameter names or option
//! strings collide with either kind.

use std::collections::BTreeSet;

use crate::command::{Command, CommandBuilder, HELP_PARAM};
use crate::context::Context;
use crate::error::{CliError, ConfigError, UsageError};
use crate::help::HelpFormatter;
use crate::param::{ArgumentSpec, OptionSpec, Param};
use crate::parser::{Parsed, TokenParser};
use crate::rewrite::{RewrittenArgs, partition_global_arguments};
use crate::suggest::suggest_similar;

const SUBCOMMAND_METAVAR: &str = "COMMAND [ARGS]...";

/// Find a command by registered name, then by alias in registration order.
pub fn resolve_command<'a>(name: &str, commands: &'a [Command]) -> Option<&'a Command> {
    commands.iter().find(|cmd| cmd.name() == name).or_else(|| {
        commands
            .iter()
            .find(|cmd| cmd.aliases().iter().any(|alias| alias == name))
    })
}

/// Register `command` with `group`; see [`Group::register_command`].
pub fn register_command(group: &mut Group, command: Command) -> Result<(), ConfigError> {
    group.register_command(command)
}

/// A command that dispatches to registered subcommands.
#[derive(Debug, Clone)]
pub struct Group {
    command: Command,
    global_options: Vec<OptionSpec>,
    shared_params: Vec<Param>,
    commands: Vec<Command>,
}

impl Group {
    pub fn builder(name: impl Into<String>) -> GroupBuilder {
        GroupBuilder {
            inner: Command::builder(name),
            global: Vec::new(),
            shared: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.command.name()
    }

    /// The group's own command (its parameters and handler).
    pub fn command(&self) -> &Command {
        &self.command
    }

    /// Registered commands in registration order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn list_global_options(&self) -> &[OptionSpec] {
        &self.global_options
    }

    pub fn list_shared_parameters(&self) -> &[Param] {
        &self.shared_params
    }

    /// Resolve a typed name or alias.
    pub fn get_command(&self, name: &str) -> Option<&Command> {
        resolve_command(name, &self.commands)
    }

    /// Commands sorted by name, for help.
    pub fn list_commands(&self) -> Vec<&Command> {
        let mut sorted: Vec<&Command> = self.commands.iter().collect();
        sorted.sort_by(|a, b| a.name().cmp(b.name()));
        sorted
    }

    /// Names and aliases of every registered command.
    pub fn command_names(&self) -> BTreeSet<String> {
        self.commands
            .iter()
            .flat_map(|cmd| std::iter::once(cmd.name()).chain(cmd.aliases().iter().map(String::as_str)))
            .map(String::from)
            .collect()
    }

    fn is_global_name(&self, name: &str) -> bool {
        self.global_options.iter().any(|o| o.name() == name)
    }

    fn is_shared_name(&self, name: &str) -> bool {
        self.shared_params.iter().any(|p| p.name() == name)
    }

    /// Validate and register a command.
    ///
    /// The command receives the group's global options (for help) and a copy
    /// of every shared parameter.
    pub fn register_command(&mut self, mut command: Command) -> Result<(), ConfigError> {
        if self.is_global_name(command.name()) {
            return Err(ConfigError::CommandConflictsWithGlobal(
                command.name().to_string(),
            ));
        }
        if self.commands.iter().any(|c| c.name() == command.name()) {
            return Err(ConfigError::DuplicateCommand(command.name().to_string()));
        }
        self.validate_command(&command)?;

        command.set_global_options(self.global_options.clone());
        let mut params = command.params().to_vec();
        params.extend(self.shared_params.iter().cloned());
        command.set_params(params)?;
        command.check_exclusive_members()?;

        tracing::trace!(group = self.name(), command = command.name(), "registered command");
        self.commands.push(command);
        Ok(())
    }

    fn validate_command(&self, command: &Command) -> Result<(), ConfigError> {
        for param in command.params() {
            if self.is_global_name(param.name()) {
                return Err(ConfigError::GlobalNameConflict(param.name().to_string()));
            }
            if self.is_shared_name(param.name()) {
                return Err(ConfigError::SharedNameConflict {
                    kind: param.kind(),
                    name: param.name().to_string(),
                });
            }
            for spelling in param.spellings() {
                if self.global_options.iter().any(|o| o.matches(spelling)) {
                    return Err(ConfigError::GlobalSpellingConflict(spelling.clone()));
                }
                if self
                    .shared_params
                    .iter()
                    .any(|p| p.spellings().contains(spelling))
                {
                    return Err(ConfigError::SharedSpellingConflict(spelling.clone()));
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Help
    // ------------------------------------------------------------------------

    pub fn format_help(&self, ctx: &Context) -> String {
        let mut f = HelpFormatter::new();
        self.command.write_help_body(ctx, &mut f);

        let visible: Vec<&Command> = self
            .list_commands()
            .into_iter()
            .filter(|cmd| !cmd.is_hidden())
            .collect();
        if !visible.is_empty() {
            let names: Vec<String> = visible.iter().map(|cmd| cmd.name_for_help()).collect();
            let widest = names.iter().map(String::len).max().unwrap_or(0);
            let limit = f.width().saturating_sub(6 + widest);
            let rows: Vec<(String, String)> = names
                .into_iter()
                .zip(visible.iter().map(|cmd| cmd.short_help(limit)))
                .collect();
            f.section("Commands", |f| f.write_dl(&rows));
        }
        f.finish()
    }

    // ------------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------------

    /// Parse the group's parameters, resolve the subcommand, then run the
    /// group handler followed by the subcommand handler.
    pub(crate) fn run(&self, mut ctx: Context, args: &[String]) -> Result<(), CliError> {
        if args.is_empty() {
            ctx.echo(&self.format_help(&ctx));
            return Err(CliError::Exit(0));
        }

        let parts = partition_global_arguments(args, &self.global_options, &self.command_names());
        tracing::trace!(global = ?parts.global, other = ?parts.other, "rewrote arguments");

        let parsed = self
            .parse_tokens(&parts)
            .map_err(|err| CliError::from(err).in_context(|| self.command.usage_context(&ctx)))?;
        if parsed.is_set(HELP_PARAM) {
            ctx.echo(&self.format_help(&ctx));
            return Err(CliError::Exit(0));
        }
        self.command.resolve(&mut ctx, &parsed)?;

        let mut remaining = parsed.remaining.into_iter();
        let Some(typed) = remaining.next() else {
            return Err(CliError::usage("Missing command.")
                .in_context(|| self.command.usage_context(&ctx)));
        };
        let Some(command) = self.get_command(&typed) else {
            return Err(CliError::from(self.no_such_command(&typed))
                .in_context(|| self.command.usage_context(&ctx)));
        };
        let sub_args: Vec<String> = remaining.collect();

        let mut sub = Context::child(ctx, command.name());
        command.parse_args(&mut sub, &sub_args)?;
        if let Some(parent) = sub.parent_mut() {
            self.command.invoke(parent)?;
        }
        command.invoke(&mut sub)
    }

    /// Segments are fed separately, so a global option left without its
    /// value fails inside the global partition instead of swallowing the
    /// command name. The rest is parsed up to the first positional, which
    /// names the command.
    fn parse_tokens(&self, parts: &RewrittenArgs) -> Result<Parsed, UsageError> {
        let mut parser = TokenParser::new(self.command.params(), self.command.index());
        parser.feed(&parts.global, false)?;
        parser.feed(&parts.other, false)?;
        parser.finish(true)
    }

    fn no_such_command(&self, typed: &str) -> UsageError {
        let names = self.command_names();
        let mut message = format!("No such command '{typed}'.");
        if let Some(close) = suggest_similar(typed, names.iter().map(String::as_str)) {
            message.push_str(&format!(" Did you mean '{close}'?"));
        }
        UsageError::new(message)
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`Group`]; see [`Group::builder`].
pub struct GroupBuilder {
    inner: CommandBuilder,
    global: Vec<String>,
    shared: Vec<String>,
}

impl GroupBuilder {
    pub fn param(mut self, param: impl Into<Param>) -> Self {
        self.inner = self.inner.param(param);
        self
    }

    pub fn option(self, option: OptionSpec) -> Self {
        self.param(option)
    }

    pub fn argument(self, argument: ArgumentSpec) -> Self {
        self.param(argument)
    }

    pub fn mutually_exclusive<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner = self.inner.mutually_exclusive(names);
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.inner = self.inner.help(help);
        self
    }

    pub fn handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut Context) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.inner = self.inner.handler(handler);
        self
    }

    /// Names of group options accepted anywhere on the command line.
    pub fn global_options<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        push_unique(&mut self.global, names);
        self
    }

    /// Names of group parameters injected into every subcommand.
    pub fn shared_params<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        push_unique(&mut self.shared, names);
        self
    }

    pub fn build(self) -> Result<Group, ConfigError> {
        let mut command = self.inner.build()?;
        command.set_subcommand_metavar(SUBCOMMAND_METAVAR);

        let mut global_options = Vec::with_capacity(self.global.len());
        for name in &self.global {
            if self.shared.contains(name) {
                return Err(ConfigError::GlobalAndShared(name.clone()));
            }
            let param = command
                .param(name)
                .ok_or_else(|| ConfigError::UnknownGlobalOption(name.clone()))?;
            let Param::Option(option) = param else {
                return Err(ConfigError::GlobalNotAnOption(name.clone()));
            };
            global_options.push(option.clone());
        }

        let mut shared_params = Vec::with_capacity(self.shared.len());
        for name in &self.shared {
            let param = command
                .param(name)
                .ok_or_else(|| ConfigError::UnknownSharedParameter(name.clone()))?;
            shared_params.push(param.clone());
        }
        if !shared_params.is_empty() {
            let own: Vec<Param> = command
                .params()
                .iter()
                .filter(|p| !self.shared.iter().any(|name| name == p.name()))
                .cloned()
                .collect();
            command.set_params(own)?;
        }
        command.check_exclusive_members()?;

        Ok(Group {
            command,
            global_options,
            shared_params,
            commands: Vec::new(),
        })
    }
}

fn push_unique<I, S>(list: &mut Vec<String>, names: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    for name in names.into_iter().map(Into::into) {
        if !list.contains(&name) {
            list.push(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(name: &str) -> Command {
        Command::builder(name).build().unwrap()
    }

    fn group() -> Group {
        Group::builder("grp")
            .option(OptionSpec::value("foo", ["--foo", "-f"]))
            .option(OptionSpec::flag("opt", ["--opt", "-o"]))
            .global_options(["foo"])
            .shared_params(["opt"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_splits_global_and_shared() {
        let grp = group();
        assert_eq!(grp.list_global_options()[0].name(), "foo");
        assert_eq!(grp.list_shared_parameters()[0].name(), "opt");
        // Shared parameters are not settable on the group itself.
        assert!(grp.command().param("opt").is_none());
        assert!(grp.command().param("foo").is_some());
    }

    #[test]
    fn test_build_rejects_unknown_names() {
        let err = Group::builder("grp").global_options(["x"]).build().unwrap_err();
        assert_eq!(err, ConfigError::UnknownGlobalOption("x".into()));

        let err = Group::builder("grp").shared_params(["x"]).build().unwrap_err();
        assert_eq!(err, ConfigError::UnknownSharedParameter("x".into()));
    }

    #[test]
    fn test_build_rejects_global_argument() {
        let err = Group::builder("grp")
            .argument(ArgumentSpec::new("foo"))
            .global_options(["foo"])
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::GlobalNotAnOption("foo".into()));
        assert_eq!(
            err.to_string(),
            "Invalid global option foo; global options must be an option"
        );
    }

    #[test]
    fn test_register_injects_shared_and_globals() {
        let mut grp = group();
        grp.register_command(cmd("cmd")).unwrap();

        let registered = grp.get_command("cmd").unwrap();
        assert!(registered.param("opt").is_some());
        assert_eq!(registered.list_global_options()[0].name(), "foo");
        assert!(registered.param("foo").is_none());
    }

    #[test]
    fn test_register_rejects_conflicts() {
        let mut grp = group();

        let err = grp.register_command(cmd("foo")).unwrap_err();
        assert_eq!(err.to_string(), "Subcommand foo conflicts with a global option name");

        let named_like_global = Command::builder("a")
            .option(OptionSpec::flag("foo", ["--other"]))
            .build()
            .unwrap();
        assert_eq!(
            grp.register_command(named_like_global).unwrap_err(),
            ConfigError::GlobalNameConflict("foo".into())
        );

        let named_like_shared = Command::builder("a")
            .argument(ArgumentSpec::new("opt"))
            .build()
            .unwrap();
        assert_eq!(
            grp.register_command(named_like_shared)
                .unwrap_err()
                .to_string(),
            "Subcommand argument opt conflicts with a shared parameter name"
        );

        let spelled_like_global = Command::builder("a")
            .option(OptionSpec::flag("x", ["-f"]))
            .build()
            .unwrap();
        assert_eq!(
            grp.register_command(spelled_like_global).unwrap_err(),
            ConfigError::GlobalSpellingConflict("-f".into())
        );

        let spelled_like_shared = Command::builder("a")
            .option(OptionSpec::flag("x", ["--opt"]))
            .build()
            .unwrap();
        assert_eq!(
            grp.register_command(spelled_like_shared).unwrap_err(),
            ConfigError::SharedSpellingConflict("--opt".into())
        );

        grp.register_command(cmd("a")).unwrap();
        assert_eq!(
            grp.register_command(cmd("a")).unwrap_err(),
            ConfigError::DuplicateCommand("a".into())
        );
    }

    #[test]
    fn test_resolve_prefers_literal_names() {
        let commands = vec![
            Command::builder("one").alias("two").build().unwrap(),
            Command::builder("two").build().unwrap(),
            Command::builder("three").aliases(["x"]).build().unwrap(),
            Command::builder("four").aliases(["x"]).build().unwrap(),
        ];
        assert_eq!(resolve_command("two", &commands).map(Command::name), Some("two"));
        // First registered alias wins.
        assert_eq!(resolve_command("x", &commands).map(Command::name), Some("three"));
        assert!(resolve_command("five", &commands).is_none());
    }

    #[test]
    fn test_command_names_include_aliases() {
        let mut grp = group();
        grp.register_command(Command::builder("cmd").aliases(["c", "alt"]).build().unwrap())
            .unwrap();
        let names: Vec<String> = grp.command_names().into_iter().collect();
        assert_eq!(names, vec!["alt", "c", "cmd"]);
    }

    #[test]
    fn test_shared_param_may_join_exclusive_group() {
        let mut grp = group();
        let command = Command::builder("cmd")
            .option(OptionSpec::flag("mine", ["--mine"]))
            .mutually_exclusive(["mine", "opt"])
            .build()
            .unwrap();
        grp.register_command(command).unwrap();
    }
}
