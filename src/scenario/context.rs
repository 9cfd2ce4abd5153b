//! Per-scenario session context
//!
//! Holds values captured from earlier responses and substitutes them into
//! later request paths and bodies through `${key}` / `${key.path}`
//! placeholders.

use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

use super::jsonpath::JsonPath;
use crate::common::{Error, Result};

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid"))
}

/// Context key bound to the current element of a `for_each` step
pub const ITEM_KEY: &str = "item";

/// Values extracted from responses during one scenario
#[derive(Debug, Default, Clone)]
pub struct SessionContext {
    vars: HashMap<String, Value>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.vars.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.vars.remove(key)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Resolve `key` or `key.path` against the stored values
    pub fn lookup(&self, expr: &str) -> Result<Value> {
        let expr = expr.trim();
        let (root, rest) = split_root(expr);

        let value = self
            .vars
            .get(root)
            .ok_or_else(|| Error::UnresolvedVariable(root.to_string()))?;

        if rest.is_empty() {
            return Ok(value.clone());
        }

        JsonPath::parse(rest)?.select(value).ok_or_else(|| {
            Error::Assertion(format!(
                "'{}' resolves to nothing in context value {}",
                expr, value
            ))
        })
    }

    /// Replace every placeholder in `template` with its text form
    pub fn substitute_str(&self, template: &str) -> Result<String> {
        let mut out = String::with_capacity(template.len());
        let mut last = 0;

        for caps in placeholder_pattern().captures_iter(template) {
            let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
            out.push_str(&template[last..whole.start]);
            out.push_str(&as_text(&self.lookup(&caps[1])?));
            last = whole.end;
        }
        out.push_str(&template[last..]);
        Ok(out)
    }

    /// Substitute placeholders throughout a JSON template
    ///
    /// A string that is exactly one placeholder takes the typed value, so
    /// `"${count}"` can become a number; anything else is interpolated.
    pub fn substitute_value(&self, template: &Value) -> Result<Value> {
        match template {
            Value::String(s) => match sole_placeholder(s) {
                Some(expr) => self.lookup(expr),
                None => Ok(Value::String(self.substitute_str(s)?)),
            },
            Value::Array(items) => items
                .iter()
                .map(|item| self.substitute_value(item))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            Value::Object(map) => {
                let mut out = serde_json::Map::with_capacity(map.len());
                for (k, v) in map {
                    out.insert(k.clone(), self.substitute_value(v)?);
                }
                Ok(Value::Object(out))
            }
            other => Ok(other.clone()),
        }
    }
}

/// Root context keys referenced by placeholders in `text`
///
/// The path after each root is parsed too, so a bad expression is caught
/// before anything is sent.
pub fn placeholders(text: &str) -> Result<Vec<String>> {
    placeholder_pattern()
        .captures_iter(text)
        .map(|caps| {
            let (root, rest) = split_root(caps[1].trim());
            if !rest.is_empty() {
                JsonPath::parse(rest)?;
            }
            Ok(root.to_string())
        })
        .collect()
}

/// Root context keys referenced anywhere inside a JSON template
pub fn value_placeholders(template: &Value) -> Result<Vec<String>> {
    let mut keys = Vec::new();
    match template {
        Value::String(s) => keys = placeholders(s)?,
        Value::Array(items) => {
            for item in items {
                keys.extend(value_placeholders(item)?);
            }
        }
        Value::Object(map) => {
            for value in map.values() {
                keys.extend(value_placeholders(value)?);
            }
        }
        _ => {}
    }
    Ok(keys)
}

fn split_root(expr: &str) -> (&str, &str) {
    match expr.find(['.', '[']) {
        Some(pos) => {
            let (root, rest) = expr.split_at(pos);
            (root, rest.strip_prefix('.').unwrap_or(rest))
        }
        None => (expr, ""),
    }
}

fn sole_placeholder(s: &str) -> Option<&str> {
    let caps = placeholder_pattern().captures(s)?;
    let whole = caps.get(0)?;
    if whole.start() == 0 && whole.end() == s.len() {
        caps.get(1).map(|m| m.as_str())
    } else {
        None
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
