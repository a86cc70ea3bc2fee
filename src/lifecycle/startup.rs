//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Bind the listener and begin accepting traffic
//!
//! Fail fast: any startup error is fatal and nothing is served. Logging is
//! installed by the caller before this runs.

use tokio::sync::broadcast;

use crate::config::ForwarderConfig;
use crate::error::StartupError;
use crate::http::HttpServer;
use crate::net::Listener;
use crate::observability::metrics;

/// Bring the forwarder up on `config.listener` and serve until `shutdown`.
///
/// The receiver must be subscribed before any signal can fire; a shutdown
/// requested while subsystems are still starting is honoured once serving.
pub async fn start(
    config: ForwarderConfig,
    shutdown: broadcast::Receiver<()>,
) -> Result<(), StartupError> {
    tracing::info!(
        bind_address = %config.bind_address(),
        upstream = %config.upstream,
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    // Build the client first so a bad target never leaves a bound port behind.
    let server = HttpServer::new(config)?;

    if server.config().observability.metrics_enabled {
        // Validation has already checked the address parses.
        if let Ok(addr) = server.config().observability.metrics_address.parse() {
            metrics::init_metrics(addr)?;
        }
    }

    let listener = Listener::bind(&server.config().listener).await?;

    server
        .run(listener, shutdown)
        .await
        .map_err(StartupError::Serve)
}
