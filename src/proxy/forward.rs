//! Forwarding gated requests to the upstream admin API.

use crate::fetch::{FetchError, FetchRequest, Fetcher};
use crate::http::{cors, GateRequest, GateResponse, Method, StatusCode};
use crate::proxy::error::GateError;
use crate::proxy::ADMIN_TOKEN_HEADER;

/// Forward `request`'s body to `upstream_base` + `upstream_path` as a POST
/// carrying the server-held admin token, and relay the outcome.
///
/// Never returns an error: upstream faults become enveloped responses
/// here so every forward-path answer carries the same CORS header set.
pub async fn forward(
    fetcher: &dyn Fetcher,
    upstream_base: &str,
    upstream_path: &str,
    request: &GateRequest,
    token: &str,
) -> GateResponse {
    let target = format!("{upstream_base}{upstream_path}");
    tracing::info!(method = %request.method, endpoint = %upstream_path, "forwarding to upstream");

    let mut outbound = FetchRequest::new(Method::Post, target)
        .header("Content-Type", "application/json")
        .header(ADMIN_TOKEN_HEADER, token);
    // An empty inbound body is sent as no body at all.
    if let Some(body) = request.body.as_ref().filter(|b| !b.is_empty()) {
        outbound = outbound.body(body.clone());
    }

    let response = match fetcher.send(outbound).await {
        Ok(upstream) => {
            let status = StatusCode(upstream.status);
            if status.is_server_error() {
                tracing::warn!(status = status.0, "upstream replied with a server error");
            } else {
                tracing::debug!(status = status.0, "upstream replied");
            }
            GateResponse::new(status)
                .header("Content-Type", "application/json")
                .body(upstream.body)
        }
        Err(FetchError::Timeout { message }) => {
            tracing::warn!(error = %message, "upstream call timed out");
            GateResponse::from(GateError::upstream_timeout(message))
        }
        Err(FetchError::Transport { message }) => {
            tracing::warn!(error = %message, "upstream unreachable");
            GateResponse::from(GateError::upstream_unreachable(message))
        }
        Err(FetchError::BodyRead { status, message }) => {
            tracing::warn!(status, error = %message, "could not read upstream response");
            GateResponse::from(GateError::response_read(StatusCode(status), message))
        }
    };

    cors::apply_forwarded(response)
}
