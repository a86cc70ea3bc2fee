//! Metrics collection and exposition.
//!
//! # Metrics
//! - `forwarder_requests_total` (counter): requests by method, status
//! - `forwarder_request_duration_seconds` (histogram): latency to response head
//! - `forwarder_upstream_errors_total` (counter): failed round trips by kind
//!
//! Recording is a no-op until a recorder is installed, so handlers call these
//! unconditionally.

use std::net::SocketAddr;
use std::time::Instant;

use axum::http::Method;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

const STANDARD_METHODS: [&str; 9] = [
    "GET", "POST", "PUT", "DELETE", "HEAD", "OPTIONS", "CONNECT", "PATCH", "TRACE",
];

/// Label for a request method; extension methods collapse into `other`.
pub fn method_label(method: &Method) -> &'static str {
    STANDARD_METHODS
        .iter()
        .copied()
        .find(|known| *known == method.as_str())
        .unwrap_or("other")
}

/// Record one completed request.
pub fn record_request(method: &Method, status: u16, start: Instant) {
    let method = method_label(method);

    ::metrics::counter!(
        "forwarder_requests_total",
        "method" => method,
        "status" => status.to_string()
    )
    .increment(1);

    ::metrics::histogram!("forwarder_request_duration_seconds", "method" => method)
        .record(start.elapsed().as_secs_f64());
}

/// Record a failed upstream round trip.
pub fn record_upstream_error(kind: &'static str) {
    ::metrics::counter!("forwarder_upstream_errors_total", "kind" => kind).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_methods_keep_their_name() {
        assert_eq!(method_label(&Method::GET), "GET");
        assert_eq!(method_label(&Method::PATCH), "PATCH");
    }

    #[test]
    fn extension_methods_share_one_label() {
        for raw in ["PROPFIND", "MKCOL", "X-RANDOM-1234"] {
            let method = Method::from_bytes(raw.as_bytes()).unwrap();
            assert_eq!(method_label(&method), "other");
        }
    }
}
