//! Transport seam between the engine and the search backend.
//!
//! All components talk to the backend through the [`Transport`] trait so a
//! deployment can wrap requests (authentication headers, proxies) and tests
//! can substitute a recording fake. [`HttpTransport`] is the production
//! implementation built on a blocking `reqwest` client.
//!
//! Requests are described by a [`BackendRequest`]: the HTTP method, the
//! path segments below the configured base URL, and the body. Segments are
//! percent-encoded by the transport, so document ids may contain any
//! character.

use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::config::BackendConfig;

/// HTTP method used by backend requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Post,
}

/// Request body variants understood by the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    /// Newline-delimited JSON, sent as `application/x-ndjson`.
    NdJson(String),
}

/// A single request against the backend, relative to its base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendRequest {
    pub method: Method,
    pub segments: Vec<String>,
    pub body: RequestBody,
}

impl BackendRequest {
    pub fn new<I, S>(method: Method, segments: I, body: RequestBody) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method,
            segments: segments.into_iter().map(Into::into).collect(),
            body,
        }
    }

    /// The request path joined with `/`, without escaping. Used in logs.
    pub fn path(&self) -> String {
        self.segments.join("/")
    }
}

/// Failure of a single backend request.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection, DNS, TLS or timeout failure.
    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    /// The backend answered with a non-success HTTP status.
    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not valid JSON.
    #[error("could not decode backend response: {0}")]
    Decode(String),
}

/// Sends requests to the search backend.
///
/// Implementations must be usable from several threads at once; the engine
/// shares one transport between all of its components.
pub trait Transport: Send + Sync {
    /// Send a request and return the decoded JSON response body.
    ///
    /// An empty response body decodes to [`Value::Null`].
    fn send(&self, request: &BackendRequest) -> Result<Value, TransportError>;
}

/// Blocking HTTP transport with a fixed per-request timeout and no retries.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    base_url: Url,
}

impl HttpTransport {
    /// Build a transport for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Network`] if the base URL is invalid or the
    /// HTTP client cannot be constructed.
    pub fn new(config: &BackendConfig) -> Result<Self, TransportError> {
        let base_url = Url::parse(&config.url).map_err(|e| TransportError::Network {
            url: config.url.clone(),
            message: e.to_string(),
        })?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TransportError::Network {
                url: config.url.clone(),
                message: e.to_string(),
            })?;
        Ok(Self { client, base_url })
    }

    /// Resolve path segments against the base URL, escaping each segment.
    pub fn url_for(&self, segments: &[String]) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::Network {
                url: self.base_url.to_string(),
                message: "base URL cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &BackendRequest) -> Result<Value, TransportError> {
        let url = self.url_for(&request.segments)?;
        let builder = match request.method {
            Method::Get => self.client.get(url.clone()),
            Method::Put => self.client.put(url.clone()),
            Method::Post => self.client.post(url.clone()),
        };
        let builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::NdJson(lines) => builder
                .header(CONTENT_TYPE, "application/x-ndjson")
                .body(lines.clone()),
        };

        let response = builder.send().map_err(|e| TransportError::Network {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().map_err(|e| TransportError::Network {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| TransportError::Decode(e.to_string()))
    }
}
