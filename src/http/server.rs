//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with a single catch-all handler
//! - Wire up middleware (tracing)
//! - Serve connections from the bound listener, one task per connection
//! - Forward every request to the upstream and convert failures to a 500
//! - Graceful shutdown with a drain deadline

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::{IntoResponse, Response},
    Router,
};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, watch};
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use crate::config::ForwarderConfig;
use crate::error::StartupError;
use crate::http::forward::Forwarder;
use crate::http::request::{request_target, RequestId};
use crate::net::Listener;
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Forwarder,
}

/// HTTP server for the forwarder.
pub struct HttpServer {
    router: Router,
    config: ForwarderConfig,
    forwarder: Forwarder,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ForwarderConfig) -> Result<Self, StartupError> {
        let forwarder = Forwarder::new(&config)?;

        let state = AppState {
            forwarder: forwarder.clone(),
        };

        let router = Self::build_router(state);
        Ok(Self {
            router,
            config,
            forwarder,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(forward_handler)
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// The request router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr();
        tracing::info!(
            address = %addr,
            upstream = %self.forwarder.target(),
            "HTTP server starting"
        );

        let drain = Duration::from_secs(self.config.lifecycle.drain_secs);
        let (draining_tx, mut draining_rx) = watch::channel(false);

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        let serve = axum::serve(listener.into_inner(), app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
                let _ = draining_tx.send(true);
            })
            .into_future();
        tokio::pin!(serve);

        tokio::select! {
            result = &mut serve => result?,
            _ = async {
                let _ = draining_rx.wait_for(|draining| *draining).await;
                tokio::time::sleep(drain).await;
            } => {
                tracing::warn!(
                    drain_secs = drain.as_secs(),
                    "Drain deadline passed, no longer waiting for open connections"
                );
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ForwarderConfig {
        &self.config
    }
}

/// Catch-all handler: every method, every path.
async fn forward_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = RequestId::new();
    let method = request.method().clone();
    let path = request_target(request.uri()).to_string();
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);

    let span = tracing::info_span!("request", request_id = %request_id, peer = ?peer);

    async move {
        tracing::info!(method = %method, path = %path, "Received request");

        match state.forwarder.forward(request).await {
            Ok(response) => {
                tracing::debug!(status = response.status().as_u16(), "Forwarded");
                metrics::record_request(&method, response.status().as_u16(), start_time);
                response
            }
            Err(e) => {
                tracing::error!(error = %e, kind = e.kind(), "Proxy error");
                metrics::record_upstream_error(e.kind());
                let response = e.into_response();
                metrics::record_request(&method, response.status().as_u16(), start_time);
                response
            }
        }
    }
    .instrument(span)
    .await
}
