//! upstream-guard
//!
//! HTTP front end comparing fault-handling strategies against an unreliable
//! upstream.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request      ┌──────────────────────────────────────────────────┐
//!     ────────────────────┼─▶ http server ──▶ orchestrator                   │
//!                         │                    │  direct ──────┐             │
//!                         │                    │  breaker ─────┼─▶ upstream ─┼──▶ Upstream
//!                         │                    │  retry ───────┘   client    │     Service
//!     Client Response     │                    ▼                             │
//!     ◀───────────────────┼── response ◀── CallReport / BatchReport          │
//!                         │                                                  │
//!                         │  Cross-cutting: config, observability,           │
//!                         │  lifecycle (signals + graceful shutdown)         │
//!                         └──────────────────────────────────────────────────┘
//! ```

use upstream_guard::config::loader;
use upstream_guard::http::HttpServer;
use upstream_guard::lifecycle::Shutdown;
use upstream_guard::observability::{logging, metrics};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match loader::load_from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("upstream-guard: configuration error: {e}");
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "upstream-guard starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url(),
        path = %config.upstream.path,
        timeout_ms = config.upstream.timeout_ms,
        error_threshold_percent = config.breaker.error_threshold_percent,
        reset_timeout_ms = config.breaker.reset_timeout_ms,
        max_attempts = config.retry.max_attempts,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let server = HttpServer::new(config)?;
    let listener = server.bind().await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
