//! Resolved parameter values and the conversions that produce them.

use std::fmt;

/// A parameter value after parsing and conversion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value {
    /// No value was given and no default declared.
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Str(String),
    /// Options with arity > 1 and multi-value arguments.
    Tuple(Vec<Value>),
}

impl Value {
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self {
            Value::Tuple(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Str(s) => f.write_str(s),
            Value::Tuple(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "{}", parts.join(" "))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Tuple(items)
    }
}

/// How raw tokens are converted into a [`Value`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ValueType {
    #[default]
    String,
    Integer,
    Choice {
        choices: Vec<String>,
        case_sensitive: bool,
    },
}

impl ValueType {
    pub fn choice<I, S>(choices: I, case_sensitive: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ValueType::Choice {
            choices: choices.into_iter().map(Into::into).collect(),
            case_sensitive,
        }
    }

    /// Placeholder shown in help after the option strings.
    pub fn metavar(&self) -> String {
        match self {
            ValueType::String => "TEXT".to_string(),
            ValueType::Integer => "INTEGER".to_string(),
            ValueType::Choice { choices, .. } => format!("[{}]", choices.join("|")),
        }
    }

    /// Convert one raw token. The error is the detail part of an
    /// `Invalid value for ...` message.
    pub fn convert(&self, raw: &str) -> Result<Value, String> {
        match self {
            ValueType::String => Ok(Value::Str(raw.to_string())),
            ValueType::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| format!("'{raw}' is not a valid integer.")),
            ValueType::Choice {
                choices,
                case_sensitive,
            } => {
                let found = choices.iter().find(|choice| {
                    if *case_sensitive {
                        choice.as_str() == raw
                    } else {
                        choice.eq_ignore_ascii_case(raw)
                    }
                });
                match found {
                    Some(choice) => Ok(Value::Str(choice.clone())),
                    None => Err(not_a_choice(raw, choices)),
                }
            }
        }
    }
}

fn not_a_choice(raw: &str, choices: &[String]) -> String {
    match choices {
        [only] => format!("'{raw}' is not '{only}'."),
        _ => {
            let quoted: Vec<String> = choices.iter().map(|c| format!("'{c}'")).collect();
            format!("'{raw}' is not one of {}.", quoted.join(", "))
        }
    }
}
