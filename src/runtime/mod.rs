//! The host runtime: configuration and the hyper server loop.

mod config;
mod server;

pub use config::{GateConfig, DEFAULT_UPSTREAM_URL};
pub use server::GateServer;
