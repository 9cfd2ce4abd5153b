//! Predicate evaluation against decoded responses

use serde_json::Value;

use crate::common::{Error, Result};
use crate::http::protocol::preview;
use crate::scenario::{JsonPath, JsonType, Predicate};

/// Check every populated field of `predicate` against `body`
///
/// Expected values must already have context placeholders substituted.
pub fn check(predicate: &Predicate, body: &Value) -> Result<()> {
    let path = JsonPath::parse(&predicate.path)?;
    let selected = path.select(body);

    let actual = match (selected, predicate.exists) {
        (None, Some(false)) => return Ok(()),
        (Some(value), Some(false)) => {
            return Err(fail(&path, format!("expected nothing, found {}", show(&value))));
        }
        (None, _) => return Err(fail(&path, "missing from response".to_string())),
        (Some(value), _) => value,
    };

    if let Some(expected) = &predicate.equals {
        if !json_eq(&actual, expected) {
            return Err(fail(
                &path,
                format!("expected {}, got {}", show(expected), show(&actual)),
            ));
        }
    }

    if let Some(unexpected) = &predicate.not_equals {
        if json_eq(&actual, unexpected) {
            return Err(fail(&path, format!("expected anything but {}", show(unexpected))));
        }
    }

    if let Some(needle) = &predicate.contains {
        if !contains(&actual, needle) {
            return Err(fail(
                &path,
                format!("expected {} to contain {}", show(&actual), show(needle)),
            ));
        }
    }

    if predicate.len.is_some() || predicate.min_len.is_some() || predicate.max_len.is_some() {
        let len = length(&actual).ok_or_else(|| {
            fail(&path, format!("{} has no length", show(&actual)))
        })?;
        if let Some(expected) = predicate.len {
            if len != expected {
                return Err(fail(&path, format!("expected length {}, got {}", expected, len)));
            }
        }
        if let Some(min) = predicate.min_len {
            if len < min {
                return Err(fail(&path, format!("expected length >= {}, got {}", min, len)));
            }
        }
        if let Some(max) = predicate.max_len {
            if len > max {
                return Err(fail(&path, format!("expected length <= {}, got {}", max, len)));
            }
        }
    }

    let bounds: [(Option<f64>, &str, fn(&f64, &f64) -> bool); 4] = [
        (predicate.gt, ">", f64::gt),
        (predicate.gte, ">=", f64::ge),
        (predicate.lt, "<", f64::lt),
        (predicate.lte, "<=", f64::le),
    ];
    for (bound, op, holds) in bounds {
        let Some(bound) = bound else { continue };
        let number = actual
            .as_f64()
            .ok_or_else(|| fail(&path, format!("expected a number, got {}", show(&actual))))?;
        if !holds(&number, &bound) {
            return Err(fail(&path, format!("expected {} {} {}", number, op, bound)));
        }
    }

    if let Some(kind) = predicate.is_type {
        let found = JsonType::of(&actual);
        if found != kind {
            return Err(fail(&path, format!("expected {:?}, got {:?}", kind, found)));
        }
    }

    Ok(())
}

/// Case-insensitive substring match; the one place error text is compared
pub fn text_contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn contains(actual: &Value, needle: &Value) -> bool {
    match (actual, needle) {
        (Value::String(s), Value::String(n)) => text_contains(s, n),
        (Value::Array(items), needle) => items.iter().any(|item| json_eq(item, needle)),
        (Value::Object(map), Value::String(key)) => map.contains_key(key),
        _ => false,
    }
}

/// Equality that treats `1` and `1.0` as the same number
fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn length(value: &Value) -> Option<usize> {
    match value {
        Value::Array(items) => Some(items.len()),
        Value::String(s) => Some(s.chars().count()),
        Value::Object(map) => Some(map.len()),
        _ => None,
    }
}

fn show(value: &Value) -> String {
    preview(&value.to_string())
}

fn fail(path: &JsonPath, message: String) -> Error {
    Error::Assertion(format!("'{}' {}", path, message))
}
