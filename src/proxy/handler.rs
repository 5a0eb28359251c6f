//! The edge proxy handler, invoked once per inbound request.

use crate::fetch::Fetcher;
use crate::http::{cors, GateRequest, GateResponse, Method};
use crate::preview::{self, PREVIEW_PREFIX};
use crate::proxy::error::GateError;
use crate::proxy::forward;
use crate::proxy::routes::RouteTable;
use crate::proxy::ADMIN_TOKEN_HEADER;
use crate::runtime::GateConfig;
use std::sync::Arc;

/// Handles every inbound request: preflight short-circuit, the
/// unauthenticated preview path, the credential gate, and forwarding.
///
/// Holds only read-only state, so one instance serves all connections.
pub struct ProxyHandler {
    config: GateConfig,
    routes: RouteTable,
    fetcher: Arc<dyn Fetcher>,
}

impl ProxyHandler {
    /// Create a handler with the standard route table.
    pub fn new(config: GateConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            config,
            routes: RouteTable::standard(),
            fetcher,
        }
    }

    /// Replace the route table.
    pub fn with_routes(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    /// Handle one request. Always returns a response, and every response
    /// leaves here with `Access-Control-Allow-Origin` set.
    pub async fn handle(&self, request: GateRequest) -> GateResponse {
        tracing::debug!(method = %request.method, path = %request.path, "handling request");

        let response = match self.dispatch(&request).await {
            Ok(response) => response,
            Err(err) => {
                if err.status.is_client_error() {
                    tracing::debug!(status = err.status.0, error = %err, "request rejected");
                } else {
                    tracing::warn!(status = err.status.0, error = %err, "request failed");
                }
                GateResponse::from(err)
            }
        };

        cors::apply(response)
    }

    async fn dispatch(&self, request: &GateRequest) -> Result<GateResponse, GateError> {
        // Preflights are answered before anything else looks at the
        // request; no credential applies to them.
        if request.method == Method::Options {
            return Ok(cors::preflight());
        }

        // The one route exempt from authentication.
        if request.method == Method::Get && request.path.starts_with(PREVIEW_PREFIX) {
            return preview::fetch_preview(self.fetcher.as_ref(), request).await;
        }

        let token = self.check_credential(request)?;

        match self.routes.find(&request.path) {
            Some(route) => Ok(forward::forward(
                self.fetcher.as_ref(),
                &self.config.upstream_url,
                &route.upstream_path,
                request,
                token,
            )
            .await),
            None => {
                let valid: Vec<&str> = self
                    .routes
                    .public_paths()
                    .chain(std::iter::once(PREVIEW_PREFIX))
                    .collect();
                Err(GateError::route_not_found(&request.path, &valid.join(", ")))
            }
        }
    }

    /// The credential gate. Check order matters: a missing header is a
    /// caller fault (401), an unprovisioned expected token is an operator
    /// fault (500), and only then is a mismatch reported (403).
    fn check_credential(&self, request: &GateRequest) -> Result<&str, GateError> {
        let supplied = request
            .get_header(ADMIN_TOKEN_HEADER)
            .filter(|token| !token.is_empty())
            .ok_or_else(GateError::missing_credential)?;

        let expected = self
            .config
            .admin_token
            .as_deref()
            .ok_or_else(GateError::misconfigured)?;

        if supplied.as_str() != expected {
            return Err(GateError::invalid_credential());
        }

        Ok(expected)
    }
}
