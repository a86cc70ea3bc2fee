//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Refuse an upstream that points back at the listener itself
//!
//! Returns all validation errors, not just the first.

use std::net::{IpAddr, SocketAddr};

use crate::config::schema::ForwarderConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("upstream.host must not be empty")]
    EmptyUpstreamHost,
    #[error("{0} must not be 0")]
    ZeroPort(&'static str),
    #[error("{0} must be greater than 0")]
    ZeroTimeout(&'static str),
    #[error("unknown log level '{0}'")]
    LogLevel(String),
    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),
    #[error("listener.host '{0}' is not an IP address")]
    ListenerHost(String),
    #[error("upstream {0} is the forwarder's own listening address")]
    SelfLoop(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ForwarderConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.upstream.host.trim().is_empty() {
        errors.push(ValidationError::EmptyUpstreamHost);
    }
    if config.upstream.port == 0 {
        errors.push(ValidationError::ZeroPort("upstream.port"));
    }
    if config.listener.port == 0 {
        errors.push(ValidationError::ZeroPort("listener.port"));
    }
    if config.listener.host.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::ListenerHost(config.listener.host.clone()));
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.connect_secs"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.upstream_secs"));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
        errors.push(ValidationError::LogLevel(config.observability.log_level.clone()));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if is_self_loop(config) {
        errors.push(ValidationError::SelfLoop(config.upstream.to_string()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// True when forwarding would land on our own socket.
fn is_self_loop(config: &ForwarderConfig) -> bool {
    if config.upstream.port != config.listener.port {
        return false;
    }

    let upstream = config.upstream.host.trim_matches(|c| c == '[' || c == ']');
    let upstream_is_local = upstream.eq_ignore_ascii_case("localhost")
        || upstream
            .parse::<IpAddr>()
            .map(|ip| ip.is_loopback() || ip.is_unspecified())
            .unwrap_or(false);

    match config.listener.host.parse::<IpAddr>() {
        Ok(listen) if listen.is_unspecified() => {
            upstream_is_local
                || upstream
                    .parse::<IpAddr>()
                    .map(|ip| ip == listen)
                    .unwrap_or(false)
        }
        Ok(listen) if listen.is_loopback() => upstream_is_local,
        Ok(listen) => upstream
            .parse::<IpAddr>()
            .map(|ip| ip == listen)
            .unwrap_or(false),
        Err(_) => false,
    }
}
