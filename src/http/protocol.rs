//! Request and response types exchanged with the backend

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::common::{Error, Result};

/// HTTP methods used by the backend's REST contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A fully resolved request, context variables already substituted
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the base URL, starting with `/`
    pub path: String,
    pub body: Option<Value>,
    /// Body text sent verbatim as `application/json`, for requests that
    /// must not be well-formed JSON
    pub raw_body: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            raw_body: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_raw_body(mut self, body: impl Into<String>) -> Self {
        self.raw_body = Some(body.into());
        self
    }
}

impl fmt::Display for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Raw response: status plus the undecoded body text
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
    /// `Content-Type` header, when the backend sent one
    pub content_type: Option<String>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Whether the backend labelled the body as something other than JSON
    ///
    /// A missing header says nothing either way.
    pub fn declares_non_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| !ct.to_ascii_lowercase().contains("json"))
    }

    /// Decode the body as JSON
    pub fn json(&self) -> Result<Value> {
        if self.body.trim().is_empty() {
            return Err(Error::MalformedResponse(format!(
                "empty body (status {})",
                self.status
            )));
        }
        serde_json::from_str(&self.body).map_err(|e| {
            Error::MalformedResponse(format!("{} in body '{}'", e, preview(&self.body)))
        })
    }

    /// The backend's `error` text, when the body carries one
    pub fn error_text(&self) -> Option<String> {
        let value: Value = serde_json::from_str(&self.body).ok()?;
        value
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

/// Shorten a body for display in failure messages
pub fn preview(text: &str) -> String {
    const LIMIT: usize = 200;
    if text.chars().count() > LIMIT {
        let cut: String = text.chars().take(LIMIT).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}
