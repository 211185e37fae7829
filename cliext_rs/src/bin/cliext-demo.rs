use std::process::ExitCode;

use anyhow::Context as _;
use serde::Deserialize;

use cliext::{
    ArgumentSpec, ColorMode, Command, ConfigError, Group, LogHandle, LogReporter, OptionSpec,
    Program, ValueType, Verbosity, config_option, init_logging, install_panic_hook,
    verbosity_option,
};

/// Keys read from `--config`.
#[derive(Debug, Default, Deserialize)]
struct DemoConfig {
    greeting: Option<String>,
}

fn greet() -> Result<Command, ConfigError> {
    Command::builder("greet")
        .aliases(["hello", "hi"])
        .help("Greet someone.\n\nThe greeting can be set with the `greeting` key of the configuration file.")
        .argument(ArgumentSpec::new("name").optional().default("world"))
        .option(OptionSpec::flag("shout", ["--shout", "-s"]).help("Print in upper case"))
        .option(OptionSpec::flag("whisper", ["--whisper", "-w"]).help("Print in lower case"))
        .option(
            OptionSpec::value("times", ["--times", "-t"])
                .value_type(ValueType::Integer)
                .default(1i64)
                .help("How many times to greet"),
        )
        .mutually_exclusive(["shout", "whisper"])
        .handler(|ctx| {
            let config = ctx
                .obj_as::<Option<DemoConfig>>()
                .context("Invalid configuration")?
                .unwrap_or_default();
            let greeting = config.greeting.as_deref().unwrap_or("Hello");
            let name = ctx.string("name").unwrap_or("world");

            let mut line = format!("{greeting}, {name}!");
            if ctx.flag("shout") {
                line = line.to_uppercase();
            } else if ctx.flag("whisper") {
                line = line.to_lowercase();
            }
            tracing::debug!(name, "greeting");

            if ctx.flag("dry-run") {
                tracing::info!("Would print: {line}");
                return Ok(());
            }
            for _ in 0..ctx.int("times").unwrap_or(1).max(0) {
                ctx.echo(&line);
            }
            Ok(())
        })
        .build()
}

fn sum() -> Result<Command, ConfigError> {
    Command::builder("sum")
        .alias("add")
        .help("Add integers together.")
        .argument(ArgumentSpec::variadic("numbers").value_type(ValueType::Integer))
        .handler(|ctx| {
            let numbers: Vec<i64> = ctx
                .get("numbers")
                .and_then(|v| v.as_tuple())
                .unwrap_or_default()
                .iter()
                .filter_map(|v| v.as_int())
                .collect();
            tracing::debug!(count = numbers.len(), "summing");
            let total = numbers
                .iter()
                .try_fold(0i64, |acc, n| acc.checked_add(*n))
                .context("Sum overflowed")?;
            ctx.echo(&total.to_string());
            Ok(())
        })
        .build()
}

fn fail() -> Result<Command, ConfigError> {
    Command::builder("fail")
        .help("Always fail.")
        .hidden()
        .handler(|_| anyhow::bail!("Something went wrong"))
        .build()
}

fn build_program(handle: &LogHandle) -> Result<Program, ConfigError> {
    let mut group = Group::builder("cliext-demo")
        .help("Demonstrates aliases, global options and shared parameters.")
        .option(verbosity_option(handle))
        .option(config_option("cliext-demo.toml"))
        .option(OptionSpec::flag("dry-run", ["--dry-run", "-n"]).help("Log instead of printing"))
        .global_options(["verbosity", "config"])
        .shared_params(["dry-run"])
        .handler(|ctx| {
            tracing::trace!(path = ctx.command_path(), "group invoked");
            Ok(())
        })
        .build()?;
    for command in [greet()?, sum()?, fail()?] {
        group.register_command(command)?;
    }
    Ok(Program::new(group)?.reporter(LogReporter))
}

fn main() -> ExitCode {
    let handle = match init_logging(Verbosity::Info, ColorMode::Auto) {
        Ok(handle) => handle,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    install_panic_hook(handle.clone());

    match build_program(&handle) {
        Ok(program) => program.main(),
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
