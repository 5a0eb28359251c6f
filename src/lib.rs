//! # edgegate - Admin Block/Unblock Edge Proxy
//!
//! edgegate is a small reverse proxy that fronts a fixed admin API. It
//! lets a static browser page issue block/unblock calls without ever
//! holding the admin secret: the proxy validates a caller-supplied token,
//! injects the server-held one, and forwards the request upstream. It also
//! answers CORS preflights and serves an unauthenticated link-preview
//! endpoint that scrapes Open Graph metadata from arbitrary URLs.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────┐
//! │                Browser (admin page)               │
//! └───────────────────────────────────────────────────┘
//!                         │  X-Admin-Token: <token>
//!                         ▼
//! ┌───────────────────────────────────────────────────┐
//! │                      edgegate                     │
//! │   OPTIONS ────► 204 preflight                     │
//! │   GET /preview ────► arbitrary URL (no auth)      │
//! │   /post, /user ──► credential gate ──► forward    │
//! └───────────────────────────────────────────────────┘
//!                         │  POST + injected secret
//!                         ▼
//! ┌───────────────────────────────────────────────────┐
//! │                 upstream admin API                │
//! └───────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use edgegate::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     // HOST, PORT, ADMIN_TOKEN, UPSTREAM_URL
//!     let config = GateConfig::from_env();
//!     let server = GateServer::new(config)?;
//!     server.run().await
//! }
//! ```
//!
//! ## Inbound surface
//!
//! 1. `OPTIONS <any>`: CORS preflight, answered 204 before anything else.
//! 2. `GET /preview?url=<escaped URL>`: link preview, no credential.
//! 3. `POST /post` and `POST /user`: gated on `X-Admin-Token`, forwarded
//!    to the upstream block endpoints (trailing slashes tolerated).
//! 4. Anything else: 404 with a JSON envelope listing the valid paths.
//!
//! Every response, including every error, carries
//! `Access-Control-Allow-Origin: *` so the calling page can read it.

pub mod fetch;
pub mod http;
pub mod preview;
pub mod proxy;
pub mod runtime;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::fetch::{FetchError, FetchRequest, FetchResponse, Fetcher, HttpFetcher};
    pub use crate::http::{GateRequest, GateResponse, Method, StatusCode};
    pub use crate::preview::LinkPreview;
    pub use crate::proxy::{ErrorEnvelope, ErrorKind, GateError, ProxyHandler, RouteTable};
    pub use crate::runtime::{GateConfig, GateServer};
    pub use async_trait::async_trait;
}

// Re-export for convenience
pub use fetch::{Fetcher, HttpFetcher};
pub use http::{GateRequest, GateResponse};
pub use proxy::{GateError, ProxyHandler};
pub use runtime::{GateConfig, GateServer};
