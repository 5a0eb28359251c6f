//! Fixed route table mapping public paths to upstream endpoints.

use serde::{Deserialize, Serialize};

/// A route entry mapping a public path to an upstream path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    /// Public path callers use, e.g. `/post`.
    pub public_path: String,
    /// Upstream path the request is forwarded to.
    pub upstream_path: String,
}

impl Route {
    /// Create a new route.
    pub fn new(public_path: impl Into<String>, upstream_path: impl Into<String>) -> Self {
        Self {
            public_path: public_path.into(),
            upstream_path: upstream_path.into(),
        }
    }
}

/// Immutable route table, defined once at startup.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Build a table from the given routes.
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// The block/unblock admin routes this proxy fronts.
    pub fn standard() -> Self {
        Self::new(vec![
            Route::new("/post", "/api/admin/block/post"),
            Route::new("/user", "/api/admin/block/user"),
        ])
    }

    /// Strip a single trailing slash so `/post/` matches `/post`.
    pub fn normalize(path: &str) -> &str {
        path.strip_suffix('/').unwrap_or(path)
    }

    /// Find the route for a path, after normalization. Exact match only.
    pub fn find(&self, path: &str) -> Option<&Route> {
        let normalized = Self::normalize(path);
        self.routes.iter().find(|r| r.public_path == normalized)
    }

    /// Public paths in table order, for 404 messages.
    pub fn public_paths(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|r| r.public_path.as_str())
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard()
    }
}
