//! Parameter descriptors and the name/spelling lookup table.
//!
//! An [`OptionSpec`] is identified by its `name` and accepts one or more
//! spellings (`--opt`, `-o`); the first spelling is the primary one used in
//! messages and help. Descriptors are immutable once the owning command is
//! built.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::error::{CliError, ConfigError};
use crate::value::{Value, ValueType};

/// Hook run after a parameter's value is resolved.
pub type Callback = Arc<dyn Fn(&mut Context, &Value) -> Result<(), CliError> + Send + Sync>;

// ============================================================================
// Options
// ============================================================================

/// Declared option: name, spellings, arity, flag-ness and default.
#[derive(Clone)]
pub struct OptionSpec {
    name: String,
    spellings: Vec<String>,
    arity: usize,
    is_flag: bool,
    default: Value,
    value_type: ValueType,
    help: Option<String>,
    metavar: Option<String>,
    required: bool,
    hidden: bool,
    eager: bool,
    expose_value: bool,
    callback: Option<Callback>,
}

impl OptionSpec {
    /// A boolean switch: arity 0, default `false`.
    pub fn flag<I, S>(name: impl Into<String>, spellings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            spellings: spellings.into_iter().map(Into::into).collect(),
            arity: 0,
            is_flag: true,
            default: Value::Bool(false),
            value_type: ValueType::String,
            help: None,
            metavar: None,
            required: false,
            hidden: false,
            eager: false,
            expose_value: true,
            callback: None,
        }
    }

    /// An option taking one value token, default none.
    pub fn value<I, S>(name: impl Into<String>, spellings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            arity: 1,
            is_flag: false,
            default: Value::None,
            ..Self::flag(name, spellings)
        }
    }

    /// Number of value tokens taken per occurrence. Ignored for flags.
    pub fn arity(mut self, arity: usize) -> Self {
        if !self.is_flag {
            self.arity = arity;
        }
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = value.into();
        self
    }

    pub fn value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn metavar(mut self, metavar: impl Into<String>) -> Self {
        self.metavar = Some(metavar.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Process before non-eager parameters.
    pub fn eager(mut self) -> Self {
        self.eager = true;
        self
    }

    /// Whether the resolved value is stored in the context.
    pub fn expose_value(mut self, expose: bool) -> Self {
        self.expose_value = expose;
        self
    }

    pub fn callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut Context, &Value) -> Result<(), CliError> + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }

    /// Replace the accepted spellings.
    pub fn with_spellings<I, S>(mut self, spellings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spellings = spellings.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spellings(&self) -> &[String] {
        &self.spellings
    }

    /// First declared spelling.
    pub fn primary(&self) -> &str {
        self.spellings.first().map(String::as_str).unwrap_or(&self.name)
    }

    pub fn matches(&self, token: &str) -> bool {
        self.spellings.iter().any(|s| s == token)
    }

    pub fn arity_count(&self) -> usize {
        self.arity
    }

    pub fn is_flag(&self) -> bool {
        self.is_flag
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    pub fn get_value_type(&self) -> &ValueType {
        &self.value_type
    }

    pub fn help_text(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Placeholder for the value in help, e.g. `TEXT` or `TEXT...`.
    pub fn metavar_text(&self) -> String {
        let base = self
            .metavar
            .clone()
            .unwrap_or_else(|| self.value_type.metavar());
        if self.arity > 1 {
            format!("{base}...")
        } else {
            base
        }
    }

    /// All spellings quoted and joined, for `Invalid value for ...`.
    pub(crate) fn label(&self) -> String {
        let quoted: Vec<String> = self.spellings.iter().map(|s| format!("'{s}'")).collect();
        quoted.join(" / ")
    }
}

impl fmt::Debug for OptionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionSpec")
            .field("name", &self.name)
            .field("spellings", &self.spellings)
            .field("arity", &self.arity)
            .field("is_flag", &self.is_flag)
            .field("default", &self.default)
            .field("eager", &self.eager)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

// ============================================================================
// Arguments
// ============================================================================

/// How many tokens a positional argument takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nargs {
    Exactly(usize),
    /// Zero or more.
    Any,
}

/// Declared positional argument.
#[derive(Debug, Clone)]
pub struct ArgumentSpec {
    name: String,
    nargs: Nargs,
    required: bool,
    default: Value,
    value_type: ValueType,
    metavar: Option<String>,
}

impl ArgumentSpec {
    /// A required single-token argument.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nargs: Nargs::Exactly(1),
            required: true,
            default: Value::None,
            value_type: ValueType::String,
            metavar: None,
        }
    }

    /// Zero or more tokens, collected into a tuple.
    pub fn variadic(name: impl Into<String>) -> Self {
        Self {
            nargs: Nargs::Any,
            required: false,
            default: Value::Tuple(Vec::new()),
            ..Self::new(name)
        }
    }

    pub fn nargs(mut self, count: usize) -> Self {
        self.nargs = Nargs::Exactly(count);
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = value.into();
        self.required = false;
        self
    }

    pub fn value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    pub fn metavar(mut self, metavar: impl Into<String>) -> Self {
        self.metavar = Some(metavar.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nargs_kind(&self) -> Nargs {
        self.nargs
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    pub fn get_value_type(&self) -> &ValueType {
        &self.value_type
    }

    /// `NAME` for messages.
    pub fn display_name(&self) -> String {
        self.metavar
            .clone()
            .unwrap_or_else(|| self.name.to_uppercase())
    }

    /// Usage line piece: `NAME`, `[NAME]`, `NAME...` or `[NAME]...`.
    pub fn usage_piece(&self) -> String {
        let name = self.display_name();
        let mut piece = if self.required {
            name
        } else {
            format!("[{name}]")
        };
        if self.nargs != Nargs::Exactly(1) {
            piece.push_str("...");
        }
        piece
    }
}

// ============================================================================
// Param
// ============================================================================

/// Any declared parameter.
#[derive(Debug, Clone)]
pub enum Param {
    Option(OptionSpec),
    Argument(ArgumentSpec),
}

impl Param {
    pub fn name(&self) -> &str {
        match self {
            Param::Option(o) => o.name(),
            Param::Argument(a) => a.name(),
        }
    }

    /// Option strings; empty for arguments.
    pub fn spellings(&self) -> &[String] {
        match self {
            Param::Option(o) => o.spellings(),
            Param::Argument(_) => &[],
        }
    }

    pub fn default_value(&self) -> &Value {
        match self {
            Param::Option(o) => o.default_value(),
            Param::Argument(a) => a.default_value(),
        }
    }

    /// `option` or `argument`, for configuration messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Param::Option(_) => "option",
            Param::Argument(_) => "argument",
        }
    }

    /// Primary spelling for options, `NAME` for arguments.
    pub fn display_name(&self) -> String {
        match self {
            Param::Option(o) => o.primary().to_string(),
            Param::Argument(a) => a.display_name(),
        }
    }

    pub fn as_option(&self) -> Option<&OptionSpec> {
        match self {
            Param::Option(o) => Some(o),
            Param::Argument(_) => None,
        }
    }

    pub(crate) fn is_eager(&self) -> bool {
        matches!(self, Param::Option(o) if o.eager)
    }

    pub(crate) fn expose_value(&self) -> bool {
        match self {
            Param::Option(o) => o.expose_value,
            Param::Argument(_) => true,
        }
    }

    pub(crate) fn callback(&self) -> Option<&Callback> {
        match self {
            Param::Option(o) => o.callback.as_ref(),
            Param::Argument(_) => None,
        }
    }
}

impl From<OptionSpec> for Param {
    fn from(spec: OptionSpec) -> Self {
        Param::Option(spec)
    }
}

impl From<ArgumentSpec> for Param {
    fn from(spec: ArgumentSpec) -> Self {
        Param::Argument(spec)
    }
}

// ============================================================================
// Lookup table
// ============================================================================

/// Name and spelling lookup over one parameter scope, built once.
///
/// Building the index validates the scope: unique names, unique spellings,
/// spellings starting with `-`, and value options with a positive arity.
#[derive(Debug, Clone, Default)]
pub struct ParamIndex {
    by_name: HashMap<String, usize>,
    by_spelling: HashMap<String, usize>,
}

impl ParamIndex {
    pub fn build(params: &[Param]) -> Result<Self, ConfigError> {
        let mut index = ParamIndex::default();
        for (pos, param) in params.iter().enumerate() {
            if index.by_name.insert(param.name().to_string(), pos).is_some() {
                return Err(ConfigError::DuplicateParameter(param.name().to_string()));
            }
            let Param::Option(option) = param else {
                continue;
            };
            if option.spellings.is_empty() {
                return Err(ConfigError::MissingSpelling(option.name.clone()));
            }
            if !option.is_flag && option.arity == 0 {
                return Err(ConfigError::InvalidArity(option.name.clone()));
            }
            for spelling in &option.spellings {
                if !spelling.starts_with('-') || spelling.len() < 2 {
                    return Err(ConfigError::InvalidSpelling(spelling.clone()));
                }
                if index.by_spelling.insert(spelling.clone(), pos).is_some() {
                    return Err(ConfigError::DuplicateSpelling(spelling.clone()));
                }
            }
        }
        Ok(index)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn position_of_spelling(&self, spelling: &str) -> Option<usize> {
        self.by_spelling.get(spelling).copied()
    }

    /// Every known spelling, sorted.
    pub fn spellings(&self) -> Vec<&str> {
        let mut all: Vec<&str> = self.by_spelling.keys().map(String::as_str).collect();
        all.sort_unstable();
        all
    }
}
