//! Outbound HTTP client seam.
//!
//! The handler and the preview fetcher talk to the network through the
//! [`Fetcher`] trait so tests can substitute a fake upstream. The real
//! implementation is a thin reqwest wrapper with a bounded timeout.

use crate::http::Method;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::time::Duration;

/// Outbound request description.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute target URL.
    pub url: String,
    /// Headers to send.
    pub headers: HashMap<String, String>,
    /// Body to send, if any.
    pub body: Option<Bytes>,
}

impl FetchRequest {
    /// Create a new FetchRequest.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Add a header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Outbound response: status plus fully read body.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// HTTP status code from the target.
    pub status: u16,
    /// Complete response body.
    pub body: Bytes,
}

impl FetchResponse {
    /// Body decoded as UTF-8 text, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}

/// How an outbound call failed.
#[derive(Debug, Clone)]
pub enum FetchError {
    /// The call did not complete within the client timeout.
    Timeout { message: String },
    /// Connect, DNS, TLS, or another transport-level failure.
    Transport { message: String },
    /// The target answered with `status` but its body could not be read.
    BodyRead { status: u16, message: String },
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Timeout { message } => write!(f, "timeout: {message}"),
            FetchError::Transport { message } => write!(f, "transport: {message}"),
            FetchError::BodyRead { status, message } => {
                write!(f, "body read after status {status}: {message}")
            }
        }
    }
}

impl std::error::Error for FetchError {}

/// Outbound HTTP client backed by an implementation-defined transport.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Send the request and read the full response body.
    async fn send(&self, request: FetchRequest) -> Result<FetchResponse, FetchError>;
}

/// Real [`Fetcher`] backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher whose calls are bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

fn to_reqwest_method(method: &Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
        Method::Patch => reqwest::Method::PATCH,
        Method::Head => reqwest::Method::HEAD,
        Method::Options => reqwest::Method::OPTIONS,
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn send(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        let mut builder = self
            .client
            .request(to_reqwest_method(&request.method), &request.url);
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    message: e.to_string(),
                }
            } else {
                FetchError::Transport {
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status().as_u16();
        // A body that never finishes is still the call not returning in
        // time, so the timeout classification wins over BodyRead.
        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    message: e.to_string(),
                }
            } else {
                FetchError::BodyRead {
                    status,
                    message: e.to_string(),
                }
            }
        })?;

        Ok(FetchResponse { status, body })
    }
}
