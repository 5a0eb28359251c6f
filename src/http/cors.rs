//! CORS headers for browser callers.
//!
//! The proxy fronts a static admin page served from another origin, so
//! every response it produces must be readable cross-origin. An error
//! without `Access-Control-Allow-Origin` shows up in the browser as an
//! opaque network failure instead of the real status.

use crate::http::response::{GateResponse, StatusCode};

pub const ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";
pub const ALLOW_METHODS: &str = "Access-Control-Allow-Methods";
pub const ALLOW_HEADERS: &str = "Access-Control-Allow-Headers";
pub const MAX_AGE: &str = "Access-Control-Max-Age";

const ANY_ORIGIN: &str = "*";
const PREFLIGHT_METHODS: &str = "GET, POST, OPTIONS";
const FORWARD_METHODS: &str = "POST, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type, X-Admin-Token";
const PREFLIGHT_MAX_AGE: &str = "86400";

/// Answer a CORS preflight: 204, no body, full header set.
pub fn preflight() -> GateResponse {
    GateResponse::new(StatusCode::NO_CONTENT)
        .header(ALLOW_ORIGIN, ANY_ORIGIN)
        .header(ALLOW_METHODS, PREFLIGHT_METHODS)
        .header(ALLOW_HEADERS, ALLOWED_HEADERS)
        .header(MAX_AGE, PREFLIGHT_MAX_AGE)
}

/// Stamp the wildcard allow-origin onto a response if not already set.
pub fn apply(mut response: GateResponse) -> GateResponse {
    response
        .headers
        .entry(ALLOW_ORIGIN.to_string())
        .or_insert_with(|| ANY_ORIGIN.to_string());
    response
}

/// Stamp the header set carried on relayed upstream responses.
pub fn apply_forwarded(response: GateResponse) -> GateResponse {
    apply(response)
        .header(ALLOW_METHODS, FORWARD_METHODS)
        .header(ALLOW_HEADERS, ALLOWED_HEADERS)
}
