//! The edge proxy core: credential gate, route table, and forwarding.

pub mod error;
pub mod forward;
mod handler;
mod routes;

pub use error::{ErrorEnvelope, ErrorKind, GateError};
pub use forward::forward;
pub use handler::ProxyHandler;
pub use routes::{Route, RouteTable};

/// Header carrying the admin credential, both inbound and outbound.
pub const ADMIN_TOKEN_HEADER: &str = "X-Admin-Token";
