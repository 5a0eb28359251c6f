//! Proxy configuration.

use serde::{Deserialize, Serialize};

/// Upstream host the admin routes forward to, unless overridden.
pub const DEFAULT_UPSTREAM_URL: &str = "https://mahdaviat.metafa.ir";

/// Configuration for the proxy server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Expected admin token. `None` when not provisioned; the credential
    /// gate reports that per request rather than failing startup.
    pub admin_token: Option<String>,
    /// Upstream base URL, no trailing slash.
    pub upstream_url: String,
    /// Outbound forward timeout in seconds.
    pub forward_timeout: u64,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            admin_token: None,
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            forward_timeout: 30,
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl GateConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Reads `HOST`, `PORT`, `ADMIN_TOKEN`, and `UPSTREAM_URL`. Everything
    /// has a default except the admin token, whose absence surfaces as a
    /// 500 on privileged routes instead of a startup failure.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(host) = std::env::var("HOST") {
            config = config.host(host);
        }
        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse().ok()) {
            config = config.port(port);
        }
        if let Ok(token) = std::env::var("ADMIN_TOKEN") {
            config = config.admin_token(token);
        }
        if let Ok(upstream) = std::env::var("UPSTREAM_URL") {
            config = config.upstream_url(upstream);
        }
        config
    }

    /// Set the host address.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the admin token. An empty string counts as not provisioned.
    pub fn admin_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.admin_token = if token.is_empty() { None } else { Some(token) };
        self
    }

    /// Set the upstream base URL, trimming any trailing slash.
    pub fn upstream_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.upstream_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Set the forward timeout in seconds.
    pub fn forward_timeout(mut self, seconds: u64) -> Self {
        self.forward_timeout = seconds;
        self
    }

    /// Get the bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
