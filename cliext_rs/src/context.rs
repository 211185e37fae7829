//! Per-invocation state handed to callbacks and command handlers.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;

use crate::console::Console;
use crate::value::Value;

/// Resolved parameter values by name.
pub type Values = BTreeMap<String, Value>;

/// State of one command invocation.
///
/// A subcommand's context owns its group's context as `parent`. The
/// application object (`obj`, usually loaded from a configuration file) is
/// inherited: lookups walk up the parent chain until one is set.
#[derive(Debug, Clone)]
pub struct Context {
    info_name: String,
    command_path: String,
    params: Values,
    obj: Option<serde_json::Value>,
    console: Console,
    parent: Option<Box<Context>>,
}

impl Context {
    pub fn new(info_name: impl Into<String>) -> Self {
        let info_name = info_name.into();
        Self {
            command_path: info_name.clone(),
            info_name,
            params: Values::new(),
            obj: None,
            console: Console::stdio(),
            parent: None,
        }
    }

    pub fn with_console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    /// Context for a subcommand invoked as `info_name` under `parent`.
    pub(crate) fn child(parent: Context, info_name: &str) -> Self {
        Self {
            info_name: info_name.to_string(),
            command_path: format!("{} {}", parent.command_path, info_name),
            params: Values::new(),
            obj: None,
            console: parent.console.clone(),
            parent: Some(Box::new(parent)),
        }
    }

    /// Name the command was invoked as.
    pub fn info_name(&self) -> &str {
        &self.info_name
    }

    /// Space separated names from the root, e.g. `grp cmd`.
    pub fn command_path(&self) -> &str {
        &self.command_path
    }

    pub fn params(&self) -> &Values {
        &self.params
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// `true` only when `name` resolved to a true flag.
    pub fn flag(&self, name: &str) -> bool {
        self.get(name).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    pub(crate) fn insert_param(&mut self, name: &str, value: Value) {
        self.params.insert(name.to_string(), value);
    }

    pub fn parent(&self) -> Option<&Context> {
        self.parent.as_deref()
    }

    pub fn parent_mut(&mut self) -> Option<&mut Context> {
        self.parent.as_deref_mut()
    }

    pub fn is_subcommand(&self) -> bool {
        self.parent.is_some()
    }

    /// Nearest application object up the parent chain.
    pub fn obj(&self) -> Option<&serde_json::Value> {
        match &self.obj {
            Some(obj) => Some(obj),
            None => self.parent.as_deref().and_then(Context::obj),
        }
    }

    pub fn obj_mut(&mut self) -> Option<&mut serde_json::Value> {
        if self.obj.is_some() {
            return self.obj.as_mut();
        }
        self.parent.as_deref_mut().and_then(Context::obj_mut)
    }

    pub fn set_obj(&mut self, obj: serde_json::Value) {
        self.obj = Some(obj);
    }

    /// Deserialize the application object; a missing object reads as `null`.
    pub fn obj_as<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        let obj = self.obj().cloned().unwrap_or(serde_json::Value::Null);
        serde_json::from_value(obj)
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn echo(&self, message: &str) {
        self.console.echo(message);
    }

    pub fn echo_err(&self, message: &str) {
        self.console.echo_err(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn test_child_path_and_console() {
        let console = Console::capturing();
        let parent = Context::new("grp").with_console(console.clone());
        let child = Context::child(parent, "cmd");

        assert_eq!(child.command_path(), "grp cmd");
        assert_eq!(child.info_name(), "cmd");
        assert!(child.is_subcommand());
        assert_eq!(child.parent().map(Context::info_name), Some("grp"));

        child.echo("hello");
        assert_eq!(console.captured().stdout, "hello\n");
    }

    #[test]
    fn test_obj_is_inherited_and_mutable_through_child() {
        let mut parent = Context::new("grp");
        parent.set_obj(json!({"name": "a"}));
        let mut child = Context::child(parent, "cmd");

        assert_eq!(child.obj(), Some(&json!({"name": "a"})));
        if let Some(obj) = child.obj_mut() {
            obj["name"] = json!("b");
        }
        assert_eq!(
            child.parent().and_then(Context::obj),
            Some(&json!({"name": "b"}))
        );
    }

    #[test]
    fn test_obj_as() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Settings {
            name: String,
        }

        let mut ctx = Context::new("grp");
        assert!(ctx.obj_as::<Settings>().is_err());
        assert_eq!(ctx.obj_as::<Option<Settings>>().unwrap(), None);

        ctx.set_obj(json!({"name": "demo"}));
        assert_eq!(
            ctx.obj_as::<Settings>().unwrap(),
            Settings {
                name: "demo".into()
            }
        );
    }

    #[test]
    fn test_typed_accessors() {
        let mut ctx = Context::new("cmd");
        ctx.insert_param("flag", Value::Bool(true));
        ctx.insert_param("name", Value::from("x"));
        ctx.insert_param("count", Value::Int(3));

        assert!(ctx.flag("flag"));
        assert!(!ctx.flag("missing"));
        assert_eq!(ctx.string("name"), Some("x"));
        assert_eq!(ctx.int("count"), Some(3));
    }
}
