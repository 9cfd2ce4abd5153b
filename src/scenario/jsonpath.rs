//! Dotted path expressions over JSON responses
//!
//! Grammar, one segment per `.`:
//!
//! - `name`: object field; applied to an array it projects the field over
//!   every element that has it
//! - `3` or `[3]`: array index
//! - `[?field]`, `[?!field]`: keep array elements whose field is truthy/falsy
//! - `[?field==literal]`, `[?field!=literal]`: keep elements by equality; the
//!   literal is read as JSON and falls back to a bare string
//!
//! Brackets may follow a name directly: `suspects[?is_guilty].0.name`.
//! `$` or the empty string selects the whole document.

use serde_json::Value;
use std::fmt;

use crate::common::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Field(String),
    Index(usize),
    Filter(Filter),
}

#[derive(Debug, Clone, PartialEq)]
struct Filter {
    field: String,
    op: FilterOp,
}

#[derive(Debug, Clone, PartialEq)]
enum FilterOp {
    Truthy,
    Falsy,
    Eq(Value),
    Ne(Value),
}

impl Filter {
    fn matches(&self, element: &Value) -> bool {
        let field = element.get(&self.field);
        match &self.op {
            FilterOp::Truthy => field.is_some_and(is_truthy),
            FilterOp::Falsy => !field.is_some_and(is_truthy),
            FilterOp::Eq(expected) => field == Some(expected),
            FilterOp::Ne(expected) => field != Some(expected),
        }
    }
}

/// A parsed path expression
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPath {
    source: String,
    segments: Vec<Segment>,
}

impl JsonPath {
    /// Parse a path expression
    pub fn parse(source: &str) -> Result<Self> {
        let trimmed = source.trim();
        let mut segments = Vec::new();

        if !(trimmed.is_empty() || trimmed == "$") {
            for raw in split_segments(trimmed)? {
                parse_segment(source, &raw, &mut segments)?;
            }
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// The expression as written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Evaluate against a document; `None` when any segment misses
    pub fn select(&self, document: &Value) -> Option<Value> {
        let mut current = document.clone();
        for segment in &self.segments {
            current = apply(segment, current)?;
        }
        Some(current)
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parse and evaluate in one go
pub fn select(document: &Value, path: &str) -> Result<Option<Value>> {
    Ok(JsonPath::parse(path)?.select(document))
}

/// JavaScript-style truthiness, which is what the backend's flags follow
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn apply(segment: &Segment, current: Value) -> Option<Value> {
    match (segment, current) {
        (Segment::Field(name), Value::Object(mut map)) => map.remove(name),
        (Segment::Field(name), Value::Array(items)) => Some(Value::Array(
            items
                .into_iter()
                .filter_map(|mut item| item.as_object_mut().and_then(|m| m.remove(name)))
                .collect(),
        )),
        (Segment::Index(i), Value::Array(mut items)) => {
            if *i < items.len() {
                Some(items.swap_remove(*i))
            } else {
                None
            }
        }
        (Segment::Index(i), Value::Object(mut map)) => map.remove(&i.to_string()),
        (Segment::Filter(filter), Value::Array(items)) => Some(Value::Array(
            items.into_iter().filter(|item| filter.matches(item)).collect(),
        )),
        _ => None,
    }
}

/// Split on `.` outside of brackets
fn split_segments(path: &str) -> Result<Vec<String>> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for c in path.chars() {
        match c {
            '[' => {
                depth += 1;
                current.push(c);
            }
            ']' => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    Error::Usage(format!("Unbalanced ']' in path '{}'", path))
                })?;
                current.push(c);
            }
            '.' if depth == 0 => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    if depth != 0 {
        return Err(Error::Usage(format!("Unclosed '[' in path '{}'", path)));
    }
    parts.push(current);

    if parts.iter().any(|p| p.is_empty()) {
        return Err(Error::Usage(format!("Empty segment in path '{}'", path)));
    }
    Ok(parts)
}

fn parse_segment(path: &str, raw: &str, out: &mut Vec<Segment>) -> Result<()> {
    let (name, mut rest) = match raw.find('[') {
        Some(pos) => raw.split_at(pos),
        None => (raw, ""),
    };

    if !name.is_empty() {
        out.push(match name.parse::<usize>() {
            Ok(i) => Segment::Index(i),
            Err(_) => Segment::Field(name.to_string()),
        });
    }

    while !rest.is_empty() {
        let close = rest
            .find(']')
            .ok_or_else(|| Error::Usage(format!("Unclosed '[' in path '{}'", path)))?;
        let inner = &rest[1..close];
        out.push(parse_bracket(path, inner)?);
        rest = &rest[close + 1..];
        if !rest.is_empty() && !rest.starts_with('[') {
            return Err(Error::Usage(format!(
                "Unexpected '{}' after ']' in path '{}'",
                rest, path
            )));
        }
    }
    Ok(())
}

fn parse_bracket(path: &str, inner: &str) -> Result<Segment> {
    let inner = inner.trim();
    if let Ok(i) = inner.parse::<usize>() {
        return Ok(Segment::Index(i));
    }

    let expr = inner.strip_prefix('?').ok_or_else(|| {
        Error::Usage(format!(
            "Bracket '[{}]' in path '{}' must be an index or a '?' filter",
            inner, path
        ))
    })?;

    let filter = if let Some((field, literal)) = expr.split_once("!=") {
        Filter {
            field: field.trim().to_string(),
            op: FilterOp::Ne(parse_literal(literal)),
        }
    } else if let Some((field, literal)) = expr.split_once("==") {
        Filter {
            field: field.trim().to_string(),
            op: FilterOp::Eq(parse_literal(literal)),
        }
    } else if let Some(field) = expr.strip_prefix('!') {
        Filter {
            field: field.trim().to_string(),
            op: FilterOp::Falsy,
        }
    } else {
        Filter {
            field: expr.trim().to_string(),
            op: FilterOp::Truthy,
        }
    };

    if filter.field.is_empty() {
        return Err(Error::Usage(format!(
            "Filter '[{}]' in path '{}' names no field",
            inner, path
        )));
    }
    Ok(Segment::Filter(filter))
}

fn parse_literal(raw: &str) -> Value {
    let raw = raw.trim();
    if let Some(unquoted) = raw.strip_prefix('\'').and_then(|r| r.strip_suffix('\'')) {
        return Value::String(unquoted.to_string());
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
