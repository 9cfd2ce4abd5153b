//! HTTP client for the backend under test

use async_trait::async_trait;
use std::time::Duration;

use crate::common::config::Timeouts;
use crate::common::{Error, Result};

use super::protocol::{ApiRequest, ApiResponse};

/// Sends one request and returns the raw response
///
/// Implementations must not retry: a retried request could double-apply a
/// state change such as an evidence unlock.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Origin the paths are resolved against
    fn base_url(&self) -> &str;

    /// Send a request and wait for the full response
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse>;
}

/// `reqwest`-backed transport
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    request_timeout_secs: u64,
}

impl ApiClient {
    /// Create a client for the given origin
    pub fn new(base_url: &str, timeouts: &Timeouts) -> Result<Self> {
        let base_url = validate_base_url(base_url)?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("case-conformance/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            request_timeout_secs: timeouts.request_secs,
        })
    }

    fn classify(&self, url: &str, err: reqwest::Error) -> Error {
        // Connect timeouts report both flags; they mean the backend is unreachable.
        if err.is_connect() {
            Error::connection(url, root_cause(&err))
        } else if err.is_timeout() {
            Error::Timeout(self.request_timeout_secs)
        } else if err.is_decode() || err.is_body() {
            Error::MalformedResponse(root_cause(&err))
        } else {
            Error::connection(url, root_cause(&err))
        }
    }
}

#[async_trait]
impl Transport for ApiClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = format!("{}{}", self.base_url, request.path);
        tracing::debug!(method = %request.method, %url, "sending request");

        let mut builder = self.client.request(request.method.into(), &url);
        if let Some(raw) = &request.raw_body {
            builder = builder
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(raw.clone());
        } else if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| self.classify(&url, e))?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(|e| self.classify(&url, e))?;

        tracing::debug!(status, bytes = body.len(), "received response");
        Ok(ApiResponse {
            status,
            body,
            content_type,
        })
    }
}

/// Check that `raw` is an http(s) origin and normalize away a trailing slash
pub fn validate_base_url(raw: &str) -> Result<String> {
    let url = reqwest::Url::parse(raw)
        .map_err(|e| Error::Usage(format!("Invalid base URL '{}': {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(Error::Usage(format!(
            "Base URL '{}' must use http or https",
            raw
        )));
    }
    if url.host_str().is_none() {
        return Err(Error::Usage(format!("Base URL '{}' has no host", raw)));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(Error::Usage(format!(
            "Base URL '{}' must not carry a query or fragment",
            raw
        )));
    }
    if url.path() != "/" {
        return Err(Error::Usage(format!(
            "Base URL '{}' must be an origin; scenario paths already start with /api",
            raw
        )));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Walk to the innermost error source; reqwest's top-level message only
/// names the URL
fn root_cause(err: &(dyn std::error::Error + 'static)) -> String {
    let mut current = err;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}
