//! Scenario, step and expectation types
//!
//! The same types back the built-in catalog (through the builder methods)
//! and YAML scenario files (through serde).

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;

use super::context::{placeholders, value_placeholders, ITEM_KEY};
use super::fixtures::Fixture;
use super::jsonpath::JsonPath;
use crate::common::{Error, Result};
use crate::http::Method;

/// A named, ordered list of steps
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub steps: Vec<Step>,
    fixtures: Vec<Fixture>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            steps: Vec::new(),
            fixtures: Vec::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Append a fixture's steps, pulling in the fixtures it depends on
    /// unless an earlier fixture already provided them
    pub fn fixture(mut self, fixture: Fixture) -> Self {
        self.push_fixture(fixture);
        self
    }

    pub(crate) fn push_fixture(&mut self, fixture: Fixture) {
        for dependency in fixture.requires() {
            if !self.fixtures.contains(dependency) {
                self.push_fixture(*dependency);
            }
        }
        self.steps.extend(fixture.steps());
        self.fixtures.push(fixture);
    }

    /// Check the scenario is runnable before any request is sent
    ///
    /// Every `${key}` must be captured by an earlier step, every path
    /// expression must parse, and every step must expect at least one
    /// status code. `item` is reserved for `for_each`.
    pub fn validate(&self) -> Result<()> {
        if self.steps.is_empty() {
            return Err(Error::Usage(format!(
                "Scenario '{}' has no steps",
                self.name
            )));
        }

        let mut defined: HashSet<&str> = HashSet::new();
        for (i, step) in self.steps.iter().enumerate() {
            let at = || format!("Scenario '{}', step {} '{}'", self.name, i + 1, step.name);

            if !step.path.starts_with('/') {
                return Err(Error::Usage(format!(
                    "{}: path '{}' must start with '/'",
                    at(),
                    step.path
                )));
            }
            if step.expect_status.is_empty() {
                return Err(Error::Usage(format!("{}: no expected status", at())));
            }

            if step.body.is_some() && step.raw_body.is_some() {
                return Err(Error::Usage(format!(
                    "{}: body and raw_body are mutually exclusive",
                    at()
                )));
            }

            let mut refs = placeholders(&step.path)?;
            if let Some(body) = &step.body {
                refs.extend(value_placeholders(body)?);
            }
            if let Some(raw) = &step.raw_body {
                refs.extend(placeholders(raw)?);
            }
            for predicate in &step.expect {
                JsonPath::parse(&predicate.path)?;
                for value in predicate.expected_values() {
                    refs.extend(value_placeholders(value)?);
                }
            }
            for capture in &step.capture {
                if capture.key == ITEM_KEY {
                    return Err(Error::Usage(format!(
                        "{}: '{}' is reserved for for_each elements and cannot be captured",
                        at(),
                        ITEM_KEY
                    )));
                }
                JsonPath::parse(&capture.path)?;
            }

            if let Some(key) = &step.for_each {
                let root = placeholders(&format!("${{{}}}", key))?;
                if root.iter().any(|r| !defined.contains(r.as_str())) {
                    return Err(Error::Usage(format!(
                        "{}: for_each '{}' is not captured by an earlier step",
                        at(),
                        key
                    )));
                }
            }

            for key in &refs {
                let bound_item = key == ITEM_KEY && step.for_each.is_some();
                if !bound_item && !defined.contains(key.as_str()) {
                    return Err(Error::Usage(format!(
                        "{}: '${{{}}}' is used before any step captures it",
                        at(),
                        key
                    )));
                }
            }

            defined.extend(step.capture.iter().map(|c| c.key.as_str()));
        }
        Ok(())
    }
}

/// One request/response assertion
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Step {
    /// Human-readable label shown in the report
    pub name: String,
    pub method: Method,
    /// Path template, may contain `${key}` placeholders
    pub path: String,
    /// JSON body template
    #[serde(default)]
    pub body: Option<Value>,
    /// Body text sent as-is with a JSON content type
    #[serde(default)]
    pub raw_body: Option<String>,
    /// Accepted status codes
    #[serde(rename = "status", default = "default_status")]
    pub expect_status: StatusSet,
    /// Response-field predicates, all of which must hold
    #[serde(default)]
    pub expect: Vec<Predicate>,
    /// Values copied into the session context on success
    #[serde(default)]
    pub capture: Vec<Capture>,
    /// Context key holding an array; the request is sent once per element
    /// with the element bound to `${item}`
    #[serde(default)]
    pub for_each: Option<String>,
}

impl Step {
    pub fn new(method: Method, name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method,
            path: path.into(),
            body: None,
            raw_body: None,
            expect_status: default_status(),
            expect: Vec::new(),
            capture: Vec::new(),
            for_each: None,
        }
    }

    pub fn get(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(Method::Get, name, path)
    }

    pub fn post(name: impl Into<String>, path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, name, path).body(body)
    }

    pub fn delete(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(Method::Delete, name, path)
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn raw_body(mut self, body: impl Into<String>) -> Self {
        self.raw_body = Some(body.into());
        self
    }

    pub fn status(mut self, status: u16) -> Self {
        self.expect_status = StatusSet(vec![status]);
        self
    }

    pub fn status_in(mut self, statuses: &[u16]) -> Self {
        self.expect_status = StatusSet(statuses.to_vec());
        self
    }

    pub fn expect(mut self, predicate: Predicate) -> Self {
        self.expect.push(predicate);
        self
    }

    /// Shorthand for a case-insensitive match on the backend's `error` text
    pub fn expect_error(self, fragment: &str) -> Self {
        self.expect(Predicate::at("error").contains(fragment))
    }

    pub fn capture(mut self, key: impl Into<String>, path: impl Into<String>) -> Self {
        self.capture.push(Capture {
            key: key.into(),
            path: path.into(),
        });
        self
    }

    pub fn for_each(mut self, key: impl Into<String>) -> Self {
        self.for_each = Some(key.into());
        self
    }

    /// Whether the response body has to be decoded at all
    pub fn needs_json(&self) -> bool {
        !self.expect.is_empty() || !self.capture.is_empty()
    }
}

/// Set of acceptable status codes; YAML accepts `200` or `[400, 404]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "StatusSpec")]
pub struct StatusSet(pub Vec<u16>);

impl StatusSet {
    pub fn contains(&self, status: u16) -> bool {
        self.0.contains(&status)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StatusSpec {
    One(u16),
    Many(Vec<u16>),
}

impl From<StatusSpec> for StatusSet {
    fn from(spec: StatusSpec) -> Self {
        match spec {
            StatusSpec::One(status) => StatusSet(vec![status]),
            StatusSpec::Many(statuses) => StatusSet(statuses),
        }
    }
}

fn default_status() -> StatusSet {
    StatusSet(vec![200])
}

/// JSON value kinds for `is_type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonType {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl JsonType {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => JsonType::Null,
            Value::Bool(_) => JsonType::Bool,
            Value::Number(_) => JsonType::Number,
            Value::String(_) => JsonType::String,
            Value::Array(_) => JsonType::Array,
            Value::Object(_) => JsonType::Object,
        }
    }
}

/// Assertion against one field of the response body
///
/// Every populated check must hold. With no checks at all the field only
/// has to exist.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Predicate {
    /// Path expression into the response body
    pub path: String,
    pub equals: Option<Value>,
    pub not_equals: Option<Value>,
    /// `false` asserts the path selects nothing
    pub exists: Option<bool>,
    /// Case-insensitive substring for strings, membership for arrays
    pub contains: Option<Value>,
    pub len: Option<usize>,
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
    pub gt: Option<f64>,
    pub gte: Option<f64>,
    pub lt: Option<f64>,
    pub lte: Option<f64>,
    pub is_type: Option<JsonType>,
}

impl Predicate {
    pub fn at(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn equals(mut self, value: impl Into<Value>) -> Self {
        self.equals = Some(value.into());
        self
    }

    pub fn not_equals(mut self, value: impl Into<Value>) -> Self {
        self.not_equals = Some(value.into());
        self
    }

    pub fn exists(mut self, exists: bool) -> Self {
        self.exists = Some(exists);
        self
    }

    pub fn contains(mut self, value: impl Into<Value>) -> Self {
        self.contains = Some(value.into());
        self
    }

    pub fn len(mut self, len: usize) -> Self {
        self.len = Some(len);
        self
    }

    pub fn min_len(mut self, len: usize) -> Self {
        self.min_len = Some(len);
        self
    }

    pub fn max_len(mut self, len: usize) -> Self {
        self.max_len = Some(len);
        self
    }

    pub fn gt(mut self, bound: f64) -> Self {
        self.gt = Some(bound);
        self
    }

    pub fn gte(mut self, bound: f64) -> Self {
        self.gte = Some(bound);
        self
    }

    pub fn lt(mut self, bound: f64) -> Self {
        self.lt = Some(bound);
        self
    }

    pub fn lte(mut self, bound: f64) -> Self {
        self.lte = Some(bound);
        self
    }

    pub fn is_type(mut self, kind: JsonType) -> Self {
        self.is_type = Some(kind);
        self
    }

    /// Expected values that may carry `${key}` placeholders
    pub fn expected_values(&self) -> impl Iterator<Item = &Value> {
        [&self.equals, &self.not_equals, &self.contains]
            .into_iter()
            .flatten()
    }
}

/// Copy the value at `path` into context key `key`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Capture {
    pub key: String,
    pub path: String,
}
