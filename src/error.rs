//! Error types for the forwarder.
//!
//! Two classes only: [`StartupError`] is fatal and stops the process before it
//! serves anything, [`ForwardError`] is scoped to a single request and becomes
//! that request's 500 response.

use std::error::Error as StdError;
use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;
use crate::net::listener::ListenerError;

/// Failure to complete one round trip to the upstream.
#[derive(Error, Debug)]
pub enum ForwardError {
    /// The upstream request could not be assembled.
    #[error("invalid upstream request: {0}")]
    InvalidRequest(#[from] axum::http::Error),

    /// Connect + response head did not finish in time.
    #[error("upstream {target} did not respond within {}s", .timeout.as_secs())]
    Timeout { target: String, timeout: Duration },

    /// Connection refused/reset, TLS failure, malformed response, ...
    #[error("{}", error_chain(.0))]
    Upstream(#[from] hyper_util::client::legacy::Error),
}

impl ForwardError {
    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::InvalidRequest(_) => "invalid_request",
            ForwardError::Timeout { .. } => "timeout",
            ForwardError::Upstream(e) if e.is_connect() => "connect",
            ForwardError::Upstream(_) => "upstream",
        }
    }
}

/// Fatal errors raised while bringing the forwarder up.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Listener(#[from] ListenerError),

    #[error("invalid upstream target '{0}'")]
    Target(String),

    #[error("failed to install the rustls crypto provider")]
    CryptoProvider,

    #[error("failed to load native TLS roots: {0}")]
    TlsRoots(#[source] std::io::Error),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("failed to initialise logging: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Render an error followed by each of its sources, `outer: inner: root`.
///
/// hyper's top-level errors are terse ("client error (Connect)"); the useful
/// part ("Connection refused") lives further down the chain.
pub fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        let text = inner.to_string();
        if !out.ends_with(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        source = inner.source();
    }
    out
}
