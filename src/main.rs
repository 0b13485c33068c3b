//! Edge gateway binary.
//!
//! ```text
//!     Client Request         ┌──────────────────────────────────────────────┐
//!     ───────────────────────┼─▶ auth gate ─▶ rewrite ─▶ upstream client ───┼──▶ Upstream
//!                            │   (optional)   (origin)    (single attempt)  │
//!     Client Response        │                                              │
//!     ◀──────────────────────┼── sanitize (event streams) ◀─────────────────┼───
//!                            └──────────────────────────────────────────────┘
//! ```
//!
//! Configuration comes from the environment (optionally seeded by the TOML
//! file named in `EDGE_CONFIG`) and is read once at startup.

use std::net::SocketAddr;

use tokio::net::TcpListener;

use edge_gateway::config::load_from_env;
use edge_gateway::http::{HttpServer, UpstreamBase};
use edge_gateway::lifecycle::{wait_for_shutdown, Shutdown};
use edge_gateway::observability::{logging, metrics};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_from_env()?;

    logging::init_logging(&config.observability);

    tracing::info!("edge-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        redirect_mode = %config.upstream.redirect_mode,
        auth_enabled = config.auth.is_enabled(),
        connect_timeout_ms = config.upstream.connect_timeout_ms,
        response_timeout_ms = config.upstream.response_timeout_ms,
        "Configuration loaded"
    );

    let base = UpstreamBase::parse(&config.upstream.base_url)?;
    if base.origin() != config.upstream.base_url.trim_end_matches('/') {
        tracing::warn!(
            configured = %config.upstream.base_url,
            origin = %base.origin(),
            "Upstream base URL carries more than scheme and host; only the origin is used"
        );
    }

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_shutdown().await;
        shutdown.trigger();
    });

    let server = HttpServer::new(config)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
