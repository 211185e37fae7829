//! Token parser: turns a token stream plus a parameter scope into raw
//! bindings and leftover tokens, then resolves them into typed values.
//!
//! Parsing is split from processing the same way the group dispatcher needs
//! it: tokens may be fed in several segments (the global partition, then the
//! rest) before the positional tokens are assigned to arguments.

use std::collections::{HashMap, VecDeque};

use crate::context::Context;
use crate::error::{CliError, UsageError};
use crate::param::{ArgumentSpec, Nargs, OptionSpec, Param, ParamIndex};
use crate::suggest::suggest_similar;
use crate::value::{Value, ValueType};

/// Raw tokens bound to one parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// A flag was present.
    Flag,
    Tokens(Vec<String>),
}

/// Output of [`TokenParser::finish`].
#[derive(Debug, Clone, Default)]
pub struct Parsed {
    /// Parameter name to raw tokens. The last occurrence of an option wins.
    pub bindings: HashMap<String, RawValue>,
    /// Tokens not claimed by any parameter.
    pub remaining: Vec<String>,
}

impl Parsed {
    pub fn is_set(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }
}

/// Incremental parser over one parameter scope.
#[derive(Debug)]
pub struct TokenParser<'a> {
    params: &'a [Param],
    index: &'a ParamIndex,
    bindings: HashMap<String, RawValue>,
    positionals: Vec<String>,
    /// Set by `--` or, when not interspersing, by the first positional.
    stopped: bool,
}

impl<'a> TokenParser<'a> {
    pub fn new(params: &'a [Param], index: &'a ParamIndex) -> Self {
        Self {
            params,
            index,
            bindings: HashMap::new(),
            positionals: Vec::new(),
            stopped: false,
        }
    }

    /// Parse one segment of tokens.
    ///
    /// With `interspersed` false the first positional token ends option
    /// parsing; it and everything after it become positionals.
    pub fn feed(&mut self, tokens: &[String], interspersed: bool) -> Result<(), UsageError> {
        let mut i = 0;
        while i < tokens.len() {
            let token = &tokens[i];
            if self.stopped {
                self.positionals.push(token.clone());
                i += 1;
                continue;
            }
            if token == "--" {
                self.stopped = true;
                i += 1;
                continue;
            }
            if token.starts_with("--") && token.len() > 2 {
                i = self.long_option(tokens, i)?;
            } else if token.starts_with('-') && token.len() > 1 {
                i = self.short_option(tokens, i)?;
            } else {
                self.positionals.push(token.clone());
                i += 1;
                if !interspersed {
                    self.stopped = true;
                }
            }
        }
        Ok(())
    }

    fn option_at(&self, spelling: &str) -> Option<&'a OptionSpec> {
        let params: &'a [Param] = self.params;
        self.index
            .position_of_spelling(spelling)
            .and_then(|pos| params[pos].as_option())
    }

    fn long_option(&mut self, tokens: &[String], i: usize) -> Result<usize, UsageError> {
        let token = tokens[i].as_str();
        let (spelling, attached) = match token.split_once('=') {
            Some((spelling, value)) => (spelling, Some(value.to_string())),
            None => (token, None),
        };
        let Some(option) = self.option_at(spelling) else {
            return Err(self.no_such_option(spelling));
        };
        self.take_option(option, spelling, attached, tokens, i + 1)
    }

    fn short_option(&mut self, tokens: &[String], i: usize) -> Result<usize, UsageError> {
        let token = tokens[i].as_str();
        if let Some(option) = self.option_at(token) {
            return self.take_option(option, token, None, tokens, i + 1);
        }

        // Clustered short options: `-abc` or `-ovalue`.
        let body = &token[1..];
        for (pos, ch) in body.char_indices() {
            let spelling = format!("-{ch}");
            let Some(option) = self.option_at(&spelling) else {
                return Err(self.no_such_option(&spelling));
            };
            if option.is_flag() {
                self.bindings
                    .insert(option.name().to_string(), RawValue::Flag);
                continue;
            }
            let rest = &body[pos + ch.len_utf8()..];
            let attached = (!rest.is_empty()).then(|| rest.to_string());
            return self.take_option(option, &spelling, attached, tokens, i + 1);
        }
        Ok(i + 1)
    }

    /// Bind `option` and return the index of the next unconsumed token.
    fn take_option(
        &mut self,
        option: &OptionSpec,
        spelling: &str,
        attached: Option<String>,
        tokens: &[String],
        mut next: usize,
    ) -> Result<usize, UsageError> {
        if option.is_flag() {
            if attached.is_some() {
                return Err(
                    UsageError::new(format!("Option '{spelling}' does not take a value."))
                        .for_option(spelling),
                );
            }
            self.bindings
                .insert(option.name().to_string(), RawValue::Flag);
            return Ok(next);
        }

        let arity = option.arity_count();
        let mut values: Vec<String> = attached.into_iter().collect();
        while values.len() < arity {
            let Some(token) = tokens.get(next) else {
                let message = if arity == 1 {
                    format!("Option '{spelling}' requires an argument.")
                } else {
                    format!("Option '{spelling}' requires {arity} arguments.")
                };
                return Err(UsageError::new(message).for_option(spelling));
            };
            values.push(token.clone());
            next += 1;
        }
        self.bindings
            .insert(option.name().to_string(), RawValue::Tokens(values));
        Ok(next)
    }

    fn no_such_option(&self, spelling: &str) -> UsageError {
        let known = self.index.spellings();
        let mut message = format!("No such option: {spelling}");
        if let Some(close) = suggest_similar(spelling, known) {
            message.push_str(&format!(" Did you mean {close}?"));
        }
        UsageError::new(message).for_option(spelling)
    }

    /// Assign positional tokens to the declared arguments.
    ///
    /// Leftover tokens are returned in [`Parsed::remaining`] when
    /// `allow_extra` is set and rejected otherwise.
    pub fn finish(mut self, allow_extra: bool) -> Result<Parsed, UsageError> {
        let arguments: Vec<&ArgumentSpec> = self
            .params
            .iter()
            .filter_map(|p| match p {
                Param::Argument(a) => Some(a),
                Param::Option(_) => None,
            })
            .collect();

        let mut queue: VecDeque<String> = self.positionals.into();
        for (pos, argument) in arguments.iter().enumerate() {
            let wanted = match argument.nargs_kind() {
                Nargs::Exactly(n) => n,
                Nargs::Any => {
                    let reserved: usize = arguments[pos + 1..]
                        .iter()
                        .map(|a| match a.nargs_kind() {
                            Nargs::Exactly(n) => n,
                            Nargs::Any => 0,
                        })
                        .sum();
                    queue.len().saturating_sub(reserved)
                }
            };
            if queue.is_empty() {
                continue;
            }
            if queue.len() < wanted {
                return Err(UsageError::new(format!(
                    "Argument '{}' takes {wanted} values.",
                    argument.display_name()
                )));
            }
            let taken: Vec<String> = queue.drain(..wanted).collect();
            self.bindings
                .insert(argument.name().to_string(), RawValue::Tokens(taken));
        }

        let remaining: Vec<String> = queue.into();
        if !allow_extra && !remaining.is_empty() {
            let noun = if remaining.len() == 1 {
                "argument"
            } else {
                "arguments"
            };
            return Err(UsageError::new(format!(
                "Got unexpected extra {noun} ({})",
                remaining.join(" ")
            )));
        }

        Ok(Parsed {
            bindings: self.bindings,
            remaining,
        })
    }
}

// ============================================================================
// Processing
// ============================================================================

/// Convert bindings to values, apply defaults, run callbacks and store the
/// exposed values on `ctx`.
///
/// Eager parameters are processed first; otherwise declaration order.
pub(crate) fn process_params(
    params: &[Param],
    parsed: &Parsed,
    ctx: &mut Context,
) -> Result<(), CliError> {
    let order = params
        .iter()
        .filter(|p| p.is_eager())
        .chain(params.iter().filter(|p| !p.is_eager()));

    for param in order {
        let value = match parsed.bindings.get(param.name()) {
            Some(raw) => convert(param, raw)?,
            None => {
                check_required(param)?;
                convert_default(param)?
            }
        };
        if let Some(callback) = param.callback() {
            callback(ctx, &value)?;
        }
        if param.expose_value() {
            ctx.insert_param(param.name(), value);
        }
    }
    Ok(())
}

fn check_required(param: &Param) -> Result<(), UsageError> {
    match param {
        Param::Option(o) if o.is_required() => Err(UsageError::new(format!(
            "Missing option '{}'.",
            o.primary()
        ))
        .for_option(o.primary())),
        Param::Argument(a) if a.is_required() => Err(UsageError::new(format!(
            "Missing argument '{}'.",
            a.display_name()
        ))),
        _ => Ok(()),
    }
}

/// Value type, error label and whether a single value is unwrapped.
fn conversion_of(param: &Param) -> (&ValueType, String, bool) {
    match param {
        Param::Option(o) => (o.get_value_type(), o.label(), o.arity_count() == 1),
        Param::Argument(a) => (
            a.get_value_type(),
            format!("'{}'", a.display_name()),
            a.nargs_kind() == Nargs::Exactly(1),
        ),
    }
}

fn convert_token(value_type: &ValueType, label: &str, token: &str) -> Result<Value, UsageError> {
    value_type
        .convert(token)
        .map_err(|detail| UsageError::new(format!("Invalid value for {label}: {detail}")))
}

fn convert(param: &Param, raw: &RawValue) -> Result<Value, UsageError> {
    let tokens = match raw {
        RawValue::Flag => return Ok(Value::Bool(true)),
        RawValue::Tokens(tokens) => tokens,
    };
    let (value_type, label, single) = conversion_of(param);

    let mut values = Vec::with_capacity(tokens.len());
    for token in tokens {
        values.push(convert_token(value_type, &label, token)?);
    }

    if single && values.len() == 1 {
        return Ok(values.remove(0));
    }
    Ok(Value::Tuple(values))
}

/// Defaults given as text go through the parameter's type like typed input.
fn convert_default(param: &Param) -> Result<Value, UsageError> {
    let (value_type, label, _) = conversion_of(param);
    let convert_item = |item: &Value| match item {
        Value::Str(text) => convert_token(value_type, &label, text),
        other => Ok(other.clone()),
    };
    match param.default_value() {
        Value::Tuple(items) => items
            .iter()
            .map(convert_item)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Tuple),
        other => convert_item(other),
    }
}
