//! Ready-made options for verbosity and configuration files.
//!
//! All of them are eager and do their work in a callback, so they apply
//! before other parameters are processed and never show up in the resolved
//! values.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::load_config;
use crate::error::CliError;
use crate::log::{LogHandle, Verbosity};
use crate::param::OptionSpec;
use crate::value::{Value, ValueType};

/// `--verbose/-v`: DEBUG when passed, INFO otherwise.
///
/// Replace the spellings with [`OptionSpec::with_spellings`].
pub fn verbose_option(handle: &LogHandle) -> OptionSpec {
    let handle = handle.clone();
    OptionSpec::flag("verbose", ["--verbose", "-v"])
        .help("Increase verbosity")
        .eager()
        .expose_value(false)
        .callback(move |_, value| {
            let verbosity = if value.as_bool() == Some(true) {
                Verbosity::Debug
            } else {
                Verbosity::Info
            };
            handle.set_verbosity(verbosity);
            Ok(())
        })
}

/// `--verbosity/-v LVL`: one of the [`Verbosity`] names, any case.
///
/// Defaults to `INFO`; pass another with [`OptionSpec::default`].
pub fn verbosity_option(handle: &LogHandle) -> OptionSpec {
    let handle = handle.clone();
    OptionSpec::value("verbosity", ["--verbosity", "-v"])
        .value_type(ValueType::choice(Verbosity::names(), false))
        .default(Verbosity::Info.as_str())
        .metavar("LVL")
        .help("Specify verbosity level")
        .eager()
        .expose_value(false)
        .callback(move |_, value| {
            let verbosity = value
                .as_str()
                .unwrap_or_default()
                .parse::<Verbosity>()
                .map_err(CliError::failure)?;
            handle.set_verbosity(verbosity);
            Ok(())
        })
}

type Processor = Arc<dyn Fn(serde_json::Value) -> serde_json::Value + Send + Sync>;

/// Builder for a `--config/-c FILE` option that loads a configuration file
/// into the context object.
pub struct ConfigOption {
    default_path: PathBuf,
    spellings: Vec<String>,
    require_config: bool,
    processor: Option<Processor>,
}

impl ConfigOption {
    pub fn new(default_path: impl Into<PathBuf>) -> Self {
        Self {
            default_path: default_path.into(),
            spellings: vec!["--config".to_string(), "-c".to_string()],
            require_config: false,
            processor: None,
        }
    }

    /// Fail when the file does not exist instead of skipping it.
    pub fn require_config(mut self, required: bool) -> Self {
        self.require_config = required;
        self
    }

    /// Transform the loaded document before it is stored.
    pub fn processor<F>(mut self, processor: F) -> Self
    where
        F: Fn(serde_json::Value) -> serde_json::Value + Send + Sync + 'static,
    {
        self.processor = Some(Arc::new(processor));
        self
    }

    pub fn spellings<I, S>(mut self, spellings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spellings = spellings.into_iter().map(Into::into).collect();
        self
    }

    pub fn build(self) -> OptionSpec {
        let required = self.require_config;
        let processor = self.processor;
        OptionSpec::value("config", self.spellings)
            .default(Value::Str(self.default_path.display().to_string()))
            .metavar("FILE")
            .help("Configuration file path")
            .eager()
            .expose_value(false)
            .callback(move |ctx, value| {
                let Some(path) = value.as_str() else {
                    return Ok(());
                };
                let loaded = load_config(Path::new(path), required)
                    .map_err(|err| CliError::failure(err.to_string()))?;
                if let Some(document) = loaded {
                    let document = match &processor {
                        Some(process) => process(document),
                        None => document,
                    };
                    ctx.set_obj(document);
                }
                Ok(())
            })
    }
}

/// `--config/-c FILE` with defaults; see [`ConfigOption`] for the knobs.
pub fn config_option(default_path: impl Into<PathBuf>) -> OptionSpec {
    ConfigOption::new(default_path).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::console::Console;
    use crate::context::Context;
    use serde_json::json;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn tokens(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    fn run(cmd: &Command, line: &str) -> Result<(), CliError> {
        cmd.run(
            Context::new("cmd").with_console(Console::capturing()),
            &tokens(line),
        )
    }

    #[test]
    fn test_verbose_option_sets_level() {
        let handle = LogHandle::new(Verbosity::Warn);
        let cmd = Command::builder("cmd")
            .option(verbose_option(&handle))
            .build()
            .unwrap();

        run(&cmd, "").unwrap();
        assert_eq!(handle.verbosity(), Verbosity::Info);
        run(&cmd, "-v").unwrap();
        assert_eq!(handle.verbosity(), Verbosity::Debug);
    }

    #[test]
    fn test_verbosity_option_levels() {
        let handle = LogHandle::new(Verbosity::Warn);
        let cmd = Command::builder("cmd")
            .option(verbosity_option(&handle))
            .build()
            .unwrap();

        run(&cmd, "").unwrap();
        assert_eq!(handle.verbosity(), Verbosity::Info);
        run(&cmd, "--verbosity quiet").unwrap();
        assert_eq!(handle.verbosity(), Verbosity::Quiet);

        let err = run(&cmd, "-v XYZ").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value for '--verbosity' / '-v': 'XYZ' is not one of \
             'QUIET', 'ERROR', 'WARN', 'INFO', 'DEBUG', 'TRACE'."
        );
    }

    #[test]
    fn test_verbosity_option_custom_default_and_spellings() {
        let handle = LogHandle::new(Verbosity::Info);
        let cmd = Command::builder("cmd")
            .option(
                verbosity_option(&handle)
                    .default("ERROR")
                    .with_spellings(["--level"]),
            )
            .build()
            .unwrap();

        run(&cmd, "").unwrap();
        assert_eq!(handle.verbosity(), Verbosity::Error);
        run(&cmd, "--level trace").unwrap();
        assert_eq!(handle.verbosity(), Verbosity::Trace);
    }

    fn capture_obj(option: OptionSpec) -> (Command, Arc<Mutex<Option<serde_json::Value>>>) {
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        let cmd = Command::builder("cmd")
            .option(option)
            .handler(move |ctx| {
                *sink.lock().unwrap() = ctx.obj().cloned();
                Ok(())
            })
            .build()
            .unwrap();
        (cmd, seen)
    }

    #[test]
    fn test_config_option_loads_default_and_override() {
        let dir = TempDir::new().unwrap();
        let default = dir.path().join("default.toml");
        fs::write(&default, "key = \"default_value\"\n").unwrap();
        let other = dir.path().join("other.json");
        fs::write(&other, r#"{"key": "other_value"}"#).unwrap();

        let option = ConfigOption::new(&default)
            .spellings(["-o", "--override"])
            .build();
        let (cmd, seen) = capture_obj(option);
        run(&cmd, "").unwrap();
        assert_eq!(*seen.lock().unwrap(), Some(json!({"key": "default_value"})));

        run(&cmd, &format!("-o {}", other.display())).unwrap();
        assert_eq!(*seen.lock().unwrap(), Some(json!({"key": "other_value"})));
    }

    #[test]
    fn test_config_option_processor() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("c.yaml");
        fs::write(&path, "key: default_value\n").unwrap();

        let option = ConfigOption::new(&path)
            .processor(|mut doc| {
                doc["key"] = json!("processed_value");
                doc
            })
            .build();
        let (cmd, seen) = capture_obj(option);
        run(&cmd, "").unwrap();
        assert_eq!(*seen.lock().unwrap(), Some(json!({"key": "processed_value"})));
    }

    #[test]
    fn test_config_option_failures() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.json");

        let (cmd, seen) = capture_obj(config_option(&missing));
        run(&cmd, "").unwrap();
        assert_eq!(*seen.lock().unwrap(), None);

        let (cmd, _) = capture_obj(ConfigOption::new(&missing).require_config(true).build());
        let err = run(&cmd, "").unwrap_err();
        assert!(matches!(
            err,
            CliError::Failure { ref message, .. } if message == "Configuration file not found"
        ));
        assert_eq!(err.exit_code(), 1);
    }
}
