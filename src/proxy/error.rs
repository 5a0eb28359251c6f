//! Proxy error taxonomy and the JSON envelope sent to callers.

use crate::http::{GateResponse, StatusCode};
use serde::{Deserialize, Serialize};

/// What went wrong, as exposed in the envelope's `error` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The expected admin token is not provisioned on the proxy.
    ServerMisconfigured,
    /// The caller sent no admin token header.
    MissingCredential,
    /// The caller's admin token does not match the configured one.
    InvalidCredential,
    /// The path is not in the route table.
    RouteNotFound,
    /// The inbound request body could not be read.
    BadRequestBody,
    /// The upstream call exceeded the forward timeout.
    UpstreamTimeout,
    /// The upstream call failed below HTTP (connect, DNS, TLS).
    UpstreamUnreachable,
    /// The upstream answered but its body could not be read.
    ResponseReadError,
    /// The preview endpoint was called without a `url` parameter.
    MissingParameter,
    /// The preview target could not be fetched.
    PreviewFetchError,
    /// Any fault not covered above.
    Internal,
}

impl ErrorKind {
    /// Wire string for the envelope's `error` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ServerMisconfigured => "ADMIN_TOKEN not configured",
            ErrorKind::MissingCredential => "Missing admin token",
            ErrorKind::InvalidCredential => "Invalid admin token",
            ErrorKind::RouteNotFound => "Not found",
            ErrorKind::BadRequestBody => "Request body error",
            ErrorKind::UpstreamTimeout => "Upstream timeout",
            ErrorKind::UpstreamUnreachable => "Upstream unreachable",
            ErrorKind::ResponseReadError => "Response parsing error",
            ErrorKind::MissingParameter => "URL parameter is required",
            ErrorKind::PreviewFetchError => "Failed to fetch URL",
            ErrorKind::Internal => "Internal proxy error",
        }
    }

    /// Default HTTP status for this kind.
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::ServerMisconfigured => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::MissingCredential => StatusCode::UNAUTHORIZED,
            ErrorKind::InvalidCredential => StatusCode::FORBIDDEN,
            ErrorKind::RouteNotFound => StatusCode::NOT_FOUND,
            ErrorKind::BadRequestBody => StatusCode::BAD_REQUEST,
            ErrorKind::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::UpstreamUnreachable => StatusCode::BAD_GATEWAY,
            ErrorKind::ResponseReadError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::MissingParameter => StatusCode::BAD_REQUEST,
            ErrorKind::PreviewFetchError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Proxy error carrying everything needed to answer the caller.
#[derive(Debug, Clone)]
pub struct GateError {
    /// Error classification.
    pub kind: ErrorKind,
    /// HTTP status to respond with. Usually `kind.status()`; a
    /// response-read fault relays the upstream's own status instead.
    pub status: StatusCode,
    /// Human-readable explanation.
    pub message: String,
    /// Underlying fault text, when there is one.
    pub details: Option<String>,
}

impl GateError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: kind.status(),
            message: message.into(),
            details: None,
        }
    }

    fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Expected admin token not provisioned.
    pub fn misconfigured() -> Self {
        Self::new(
            ErrorKind::ServerMisconfigured,
            "The admin token is not configured on the proxy",
        )
    }

    /// Caller sent no admin token header.
    pub fn missing_credential() -> Self {
        Self::new(
            ErrorKind::MissingCredential,
            "Send the admin token in the X-Admin-Token header",
        )
    }

    /// Caller's admin token does not match.
    pub fn invalid_credential() -> Self {
        Self::new(
            ErrorKind::InvalidCredential,
            "The supplied admin token is not valid",
        )
    }

    /// Path not in the route table. `valid` lists the paths callers may use.
    pub fn route_not_found(path: &str, valid: &str) -> Self {
        Self::new(
            ErrorKind::RouteNotFound,
            format!("Path {path} not found. Valid paths: {valid}"),
        )
    }

    /// Inbound body could not be read.
    pub fn bad_request_body(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequestBody, "Could not read the request body")
            .details(details)
    }

    /// Upstream call exceeded the forward timeout.
    pub fn upstream_timeout(details: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::UpstreamTimeout,
            "The upstream API did not respond within the forward timeout",
        )
        .details(details)
    }

    /// Upstream call failed below HTTP.
    pub fn upstream_unreachable(details: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::UpstreamUnreachable,
            "Could not reach the upstream API",
        )
        .details(details)
    }

    /// Upstream answered with `status` but its body could not be read.
    pub fn response_read(status: StatusCode, details: impl Into<String>) -> Self {
        let mut err = Self::new(
            ErrorKind::ResponseReadError,
            "Could not read the upstream response body",
        )
        .details(details);
        err.status = status;
        err
    }

    /// Preview endpoint called without a `url` parameter.
    pub fn missing_parameter() -> Self {
        Self::new(
            ErrorKind::MissingParameter,
            "The url query parameter is required",
        )
    }

    /// Preview target fetch failed.
    pub fn preview_fetch(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::PreviewFetchError, "Could not fetch the target URL")
            .details(details)
    }

    /// Catch-all for faults without a dedicated kind.
    pub fn internal(details: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::Internal,
            "Unexpected error while handling the request",
        )
        .details(details)
    }
}

impl std::fmt::Display for GateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.status.0, self.kind.as_str(), self.message)
    }
}

impl std::error::Error for GateError {}

impl From<serde_json::Error> for GateError {
    fn from(err: serde_json::Error) -> Self {
        GateError::internal(err.to_string())
    }
}

/// JSON body shape of every synthesized (non-relayed) response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<&GateError> for ErrorEnvelope {
    fn from(err: &GateError) -> Self {
        ErrorEnvelope {
            success: false,
            error: err.kind.as_str().to_string(),
            message: err.message.clone(),
            details: err.details.clone(),
        }
    }
}

impl From<GateError> for GateResponse {
    fn from(err: GateError) -> Self {
        let envelope = ErrorEnvelope::from(&err);
        let body = serde_json::to_vec(&envelope)
            .unwrap_or_else(|_| br#"{"success":false,"error":"Internal proxy error"}"#.to_vec());
        GateResponse::new(err.status)
            .header("Content-Type", "application/json")
            .body(body)
    }
}
