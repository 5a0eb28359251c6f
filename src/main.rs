//! edgegate - Admin Block/Unblock Edge Proxy
//!
//! Reads its configuration from the environment and serves until killed.

use edgegate::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting edgegate...");

    let config = GateConfig::from_env();
    let server = GateServer::new(config)?;

    tracing::info!("Try: curl -i -X OPTIONS http://localhost:8080/post");
    tracing::info!(
        "Try: curl -X POST http://localhost:8080/post -H 'X-Admin-Token: <token>' -d '{{\"id\":1}}'"
    );
    tracing::info!("Try: curl 'http://localhost:8080/preview?url=https://example.com'");

    server.run().await
}
