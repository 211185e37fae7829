//! Commands: declared parameters, aliases, mutually exclusive options and
//! the invoke boundary.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::context::{Context, Values};
use crate::error::{CliError, ConfigError, UsageContext, UsageError};
use crate::help::{HelpFormatter, make_short_help, option_record};
use crate::param::{ArgumentSpec, OptionSpec, Param, ParamIndex};
use crate::parser::{Parsed, TokenParser, process_params};

/// Command body. Any error it returns is normalized at the invoke boundary.
pub type Handler = Arc<dyn Fn(&mut Context) -> anyhow::Result<()> + Send + Sync>;

/// Spelling of the automatic help flag.
pub const HELP_OPTION: &str = "--help";
pub(crate) const HELP_PARAM: &str = "help";

fn help_option() -> OptionSpec {
    OptionSpec::flag(HELP_PARAM, [HELP_OPTION])
        .eager()
        .expose_value(false)
        .help("Show this message and exit.")
}

// ============================================================================
// Mutually exclusive options
// ============================================================================

/// Every member of a mutually exclusive group was passed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Mutually exclusive options: {}", .names.join(" "))]
pub struct ExclusiveConflict {
    /// Primary spellings in the group's declared order.
    pub names: Vec<String>,
}

/// Check resolved `values` against each exclusive group.
///
/// A group conflicts only when *all* of its members resolved to something
/// other than their declared default; a partial overlap passes. Members that
/// are not in `values` (unknown or not exposed) never count.
pub fn validate_mutually_exclusive(
    groups: &[Vec<String>],
    params: &[Param],
    values: &Values,
) -> Result<(), ExclusiveConflict> {
    for group in groups {
        let mut passed = Vec::new();
        for name in group {
            let Some(param) = params.iter().find(|p| p.name() == name) else {
                continue;
            };
            if values
                .get(name)
                .is_some_and(|value| value != param.default_value())
            {
                passed.push(param.display_name());
            }
        }
        if passed.len() == group.len() {
            return Err(ExclusiveConflict { names: passed });
        }
    }
    Ok(())
}

// ============================================================================
// Command
// ============================================================================

/// A named, invocable unit.
#[derive(Clone)]
pub struct Command {
    name: String,
    aliases: Vec<String>,
    params: Vec<Param>,
    index: ParamIndex,
    exclusive: Vec<Vec<String>>,
    help: Option<String>,
    short_help: Option<String>,
    hidden: bool,
    handler: Option<Handler>,
    /// Group options accepted anywhere; set at registration, shown in help.
    global_options: Vec<OptionSpec>,
    /// `COMMAND [ARGS]...` for groups.
    subcommand_metavar: Option<&'static str>,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("params", &self.params)
            .field("exclusive", &self.exclusive)
            .field("hidden", &self.hidden)
            .field("global_options", &self.global_options)
            .finish()
    }
}

impl Command {
    pub fn builder(name: impl Into<String>) -> CommandBuilder {
        CommandBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sorted, without duplicates.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&Param> {
        self.index.position(name).map(|pos| &self.params[pos])
    }

    pub fn exclusive_groups(&self) -> &[Vec<String>] {
        &self.exclusive
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Global options of the owning group, if registered in one.
    pub fn list_global_options(&self) -> &[OptionSpec] {
        &self.global_options
    }

    /// `name` or `name (alias1,alias2)`.
    pub fn name_for_help(&self) -> String {
        if self.aliases.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.aliases.join(","))
        }
    }

    /// One-line summary for a group's command list.
    pub fn short_help(&self, limit: usize) -> String {
        match (&self.short_help, &self.help) {
            (Some(short), _) => short.clone(),
            (None, Some(help)) => make_short_help(help, limit),
            (None, None) => String::new(),
        }
    }

    pub(crate) fn index(&self) -> &ParamIndex {
        &self.index
    }

    pub(crate) fn set_subcommand_metavar(&mut self, metavar: &'static str) {
        self.subcommand_metavar = Some(metavar);
    }

    pub(crate) fn set_global_options(&mut self, options: Vec<OptionSpec>) {
        self.global_options = options;
    }

    /// Replace the parameter list and rebuild the lookup table.
    pub(crate) fn set_params(&mut self, params: Vec<Param>) -> Result<(), ConfigError> {
        self.index = ParamIndex::build(&params)?;
        self.params = params;
        Ok(())
    }

    /// Every exclusive group member must name a parameter of this command.
    pub(crate) fn check_exclusive_members(&self) -> Result<(), ConfigError> {
        for group in &self.exclusive {
            if let Some(unknown) = group.iter().find(|name| self.index.position(name).is_none()) {
                return Err(ConfigError::UnknownExclusiveMember {
                    command: self.name.clone(),
                    name: unknown.clone(),
                });
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Usage and help
    // ------------------------------------------------------------------------

    fn usage_args(&self) -> String {
        let mut pieces = vec!["[OPTIONS]".to_string()];
        for param in &self.params {
            if let Param::Argument(argument) = param {
                pieces.push(argument.usage_piece());
            }
        }
        if let Some(metavar) = self.subcommand_metavar {
            pieces.push(metavar.to_string());
        }
        pieces.join(" ")
    }

    pub(crate) fn usage_context(&self, ctx: &Context) -> UsageContext {
        let mut f = HelpFormatter::new();
        f.write_usage(ctx.command_path(), &self.usage_args());
        UsageContext {
            command_path: ctx.command_path().to_string(),
            usage: f.finish(),
            help_option: Some(HELP_OPTION.to_string()),
        }
    }

    /// Usage, description and options. Subcommands also list the group's
    /// global options and their own aliases.
    pub fn format_help(&self, ctx: &Context) -> String {
        let mut f = HelpFormatter::new();
        self.write_help_body(ctx, &mut f);
        if ctx.is_subcommand() && !self.aliases.is_empty() {
            let rows: Vec<(String, String)> = self
                .aliases
                .iter()
                .map(|alias| (alias.clone(), String::new()))
                .collect();
            f.section("Aliases", |f| f.write_dl(&rows));
        }
        f.finish()
    }

    pub(crate) fn write_help_body(&self, ctx: &Context, f: &mut HelpFormatter) {
        f.write_usage(ctx.command_path(), &self.usage_args());

        if let Some(help) = &self.help {
            f.write_paragraph();
            f.indented(|f| f.write_text(help));
        }

        let mut options: Vec<&OptionSpec> =
            self.params.iter().filter_map(Param::as_option).collect();
        if ctx.is_subcommand() {
            options.extend(self.global_options.iter());
        }
        options.sort_by(|a, b| a.primary().cmp(b.primary()));
        let rows: Vec<(String, String)> = options.into_iter().filter_map(option_record).collect();
        if !rows.is_empty() {
            f.section("Options", |f| f.write_dl(&rows));
        }
    }

    // ------------------------------------------------------------------------
    // Parsing and invocation
    // ------------------------------------------------------------------------

    /// Parse `args` against this command's parameters and resolve them on
    /// `ctx`. `--help` prints help and stops with exit status 0.
    pub(crate) fn parse_args(&self, ctx: &mut Context, args: &[String]) -> Result<(), CliError> {
        let parsed = self
            .parse_tokens(args)
            .map_err(|err| CliError::from(err).in_context(|| self.usage_context(ctx)))?;
        if parsed.is_set(HELP_PARAM) {
            ctx.echo(&self.format_help(ctx));
            return Err(CliError::Exit(0));
        }
        self.resolve(ctx, &parsed)
    }

    fn parse_tokens(&self, args: &[String]) -> Result<Parsed, UsageError> {
        let mut parser = TokenParser::new(&self.params, &self.index);
        parser.feed(args, true)?;
        parser.finish(false)
    }

    /// Convert, run callbacks and validate exclusive groups.
    pub(crate) fn resolve(&self, ctx: &mut Context, parsed: &Parsed) -> Result<(), CliError> {
        let result = process_params(&self.params, parsed, ctx).and_then(|()| {
            validate_mutually_exclusive(&self.exclusive, &self.params, ctx.params())
                .map_err(|conflict| CliError::usage(conflict.to_string()))
        });
        result.map_err(|err| err.in_context(|| self.usage_context(ctx)))
    }

    /// Run the handler, normalizing whatever it returns.
    pub(crate) fn invoke(&self, ctx: &mut Context) -> Result<(), CliError> {
        let Some(handler) = &self.handler else {
            return Ok(());
        };
        tracing::trace!(command = ctx.command_path(), "invoking");
        handler(ctx).map_err(CliError::from_invocation)
    }

    /// Parse then invoke, as a standalone command.
    pub(crate) fn run(&self, mut ctx: Context, args: &[String]) -> Result<(), CliError> {
        self.parse_args(&mut ctx, args)?;
        self.invoke(&mut ctx)
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`Command`]; see [`Command::builder`].
pub struct CommandBuilder {
    name: String,
    aliases: Vec<String>,
    params: Vec<Param>,
    exclusive: Vec<Vec<String>>,
    help: Option<String>,
    short_help: Option<String>,
    hidden: bool,
    handler: Option<Handler>,
}

impl CommandBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            params: Vec::new(),
            exclusive: Vec::new(),
            help: None,
            short_help: None,
            hidden: false,
            handler: None,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    pub fn param(mut self, param: impl Into<Param>) -> Self {
        self.params.push(param.into());
        self
    }

    pub fn option(self, option: OptionSpec) -> Self {
        self.param(option)
    }

    pub fn argument(self, argument: ArgumentSpec) -> Self {
        self.param(argument)
    }

    /// Parameters that must not all be passed together.
    pub fn mutually_exclusive<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut group: Vec<String> = Vec::new();
        for name in names.into_iter().map(Into::into) {
            if !group.contains(&name) {
                group.push(name);
            }
        }
        self.exclusive.push(group);
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn short_help(mut self, short_help: impl Into<String>) -> Self {
        self.short_help = Some(short_help.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut Context) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Validate the parameter scope and build the command.
    ///
    /// Exclusive group members are checked once the command becomes
    /// runnable (registration or program construction), since shared
    /// parameters may be injected later.
    pub fn build(self) -> Result<Command, ConfigError> {
        let mut aliases = self.aliases;
        aliases.sort();
        aliases.dedup();

        let mut params = self.params;
        params.push(help_option().into());
        let index = ParamIndex::build(&params)?;

        if let Some(small) = self.exclusive.iter().find(|group| group.len() < 2) {
            return Err(ConfigError::ExclusiveGroupTooSmall(small.clone()));
        }

        Ok(Command {
            name: self.name,
            aliases,
            params,
            index,
            exclusive: self.exclusive,
            help: self.help,
            short_help: self.short_help,
            hidden: self.hidden,
            handler: self.handler,
            global_options: Vec::new(),
            subcommand_metavar: None,
        })
    }
}
