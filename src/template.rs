//! Template rendering.
//!
//! Templates use Jinja2-style syntax rendered by Tera. Referencing a variable
//! missing from the data model is an error, never an empty string. Two extra
//! filters are available:
//!
//! - `keys`: the keys of a mapping, in the mapping's order
//! - `values`: the values of a mapping, in the mapping's order
//!
//! ```text
//! {% for user in additional.users | keys %}{{ user }} {% endfor %}
//! ```

use std::collections::HashMap;
use std::error::Error as StdError;
use std::path::Path;

use serde_json::Value;
use tera::{Context, Tera};

use crate::error::{Error, Result};

/// Trait for template rendering - allows mocking in tests
pub trait TemplateEngine: Send + Sync {
    /// Renders `source`, read from `template`, against `data`.
    fn render(&self, template: &Path, source: &str, data: &Value) -> Result<String>;
}

/// Tera-backed engine with the `keys` and `values` filters registered.
#[derive(Debug, Default, Clone, Copy)]
pub struct TeraEngine;

fn keys_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    match value {
        Value::Object(map) => Ok(Value::Array(
            map.keys().map(|key| Value::String(key.clone())).collect(),
        )),
        other => Err(tera::Error::msg(format!(
            "Filter `keys` expects a mapping, got {}",
            other
        ))),
    }
}

fn values_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    match value {
        Value::Object(map) => Ok(Value::Array(map.values().cloned().collect())),
        other => Err(tera::Error::msg(format!(
            "Filter `values` expects a mapping, got {}",
            other
        ))),
    }
}

/// Collects every message in the error chain, outermost first.
fn error_chain(err: &tera::Error) -> Vec<String> {
    let mut messages = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        messages.push(cause.to_string());
        source = cause.source();
    }
    messages
}

/// Extracts the variable name from Tera's "Variable `x` not found" message.
fn undefined_variable(messages: &[String]) -> Option<String> {
    messages.iter().find_map(|message| {
        if !message.contains("not found in context") {
            return None;
        }
        let start = message.find('`')? + 1;
        let end = start + message[start..].find('`')?;
        Some(message[start..end].to_string())
    })
}

impl TemplateEngine for TeraEngine {
    fn render(&self, template: &Path, source: &str, data: &Value) -> Result<String> {
        let name = template.to_string_lossy();
        let template_error = |err: tera::Error| {
            let messages = error_chain(&err);
            Error::Template {
                template: template.to_path_buf(),
                message: messages.join(": "),
                variable: undefined_variable(&messages),
            }
        };

        let mut tera = Tera::default();
        tera.autoescape_on(Vec::new());
        tera.register_filter("keys", keys_filter);
        tera.register_filter("values", values_filter);
        tera.add_raw_template(&name, source)
            .map_err(template_error)?;

        let context = Context::from_value(data.clone()).map_err(template_error)?;
        tera.render(&name, &context).map_err(template_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(source: &str, data: Value) -> Result<String> {
        TeraEngine.render(Path::new("conf/test.xml.template"), source, &data)
    }

    #[test]
    fn test_renders_nested_keys() {
        let out = render(
            "{{ primary_namenode.host }}:{{ primary_namenode['rpc-port'] }}",
            json!({"primary_namenode": {"host": "primary-namenode", "rpc-port": 9000}}),
        )
        .unwrap();
        assert_eq!(out, "primary-namenode:9000");
    }

    #[test]
    fn test_undefined_variable_names_key() {
        let err = render("{{ hive_server.host }}", json!({"other": 1})).unwrap_err();
        match err {
            Error::Template {
                template, variable, ..
            } => {
                assert_eq!(template, Path::new("conf/test.xml.template"));
                assert_eq!(variable.as_deref(), Some("hive_server.host"));
            }
            other => panic!("expected template error, got {:?}", other),
        }
    }

    #[test]
    fn test_keys_and_values_filters() {
        let data = json!({"groups": {"admin": 150, "hadoop": 151}});
        let keys = render(
            "{% for g in groups | keys %}{{ g }} {% endfor %}",
            data.clone(),
        )
        .unwrap();
        assert_eq!(keys, "admin hadoop ");
        let values = render(
            "{% for gid in groups | values %}{{ gid }} {% endfor %}",
            data,
        )
        .unwrap();
        assert_eq!(values, "150 151 ");
    }

    #[test]
    fn test_keys_filter_rejects_scalar() {
        assert!(render("{{ x | keys }}", json!({"x": 1})).is_err());
    }

    #[test]
    fn test_no_html_escaping() {
        let out = render("{{ v }}", json!({"v": "<value>&"})).unwrap();
        assert_eq!(out, "<value>&");
    }

    #[test]
    fn test_syntax_error_is_template_error() {
        let err = render("{% if %}", json!({})).unwrap_err();
        assert!(matches!(err, Error::Template { variable: None, .. }));
    }
}
