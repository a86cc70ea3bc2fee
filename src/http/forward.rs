//! Forwarding of one inbound request to the fixed upstream.
//!
//! # Responsibilities
//! - Hold the immutable upstream target and the shared pooled client
//! - Re-address the inbound request at the upstream, leaving method, path,
//!   query, headers and body as received
//! - Bound connect + response head with a timeout
//!
//! One attempt per request: no retries, no circuit breaking. Dropping the
//! returned future (client went away) drops the upstream call with it.

use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use axum::{
    body::Body,
    http::{
        header,
        uri::{Authority, PathAndQuery, Scheme},
        HeaderValue, Request, Response, Uri, Version,
    },
};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::{ForwarderConfig, UpstreamConfig, UpstreamScheme};
use crate::error::{ForwardError, StartupError};
use crate::http::request::strip_hop_by_hop;
use crate::http::response::passthrough;

/// Pooled HTTP/1.1 client that can reach either `http` or `https` upstreams.
pub type UpstreamClient = Client<HttpsConnector<HttpConnector>, Body>;

/// The single backend every request goes to. Never derived from a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    scheme: Scheme,
    authority: Authority,
}

impl UpstreamTarget {
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, StartupError> {
        let authority = Authority::from_str(&config.authority())
            .map_err(|_| StartupError::Target(config.to_string()))?;
        let scheme = match config.scheme {
            UpstreamScheme::Http => Scheme::HTTP,
            UpstreamScheme::Https => Scheme::HTTPS,
        };
        Ok(Self { scheme, authority })
    }

    /// Absolute upstream URI for an inbound path + query.
    pub fn uri_for(&self, path_and_query: PathAndQuery) -> Result<Uri, ForwardError> {
        let uri = Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()?;
        Ok(uri)
    }
}

impl std::fmt::Display for UpstreamTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority)
    }
}

/// Make `ring` the process-wide rustls provider, once.
///
/// rustls refuses to pick one on its own when several backends are compiled
/// in, and connector construction would panic.
fn install_crypto_provider() -> Result<(), StartupError> {
    static INSTALLED: OnceLock<bool> = OnceLock::new();
    let installed = INSTALLED.get_or_init(|| {
        rustls::crypto::CryptoProvider::get_default().is_some()
            || rustls::crypto::ring::default_provider()
                .install_default()
                .is_ok()
    });
    if *installed {
        Ok(())
    } else {
        Err(StartupError::CryptoProvider)
    }
}

/// Relays requests to the upstream target.
#[derive(Clone)]
pub struct Forwarder {
    client: UpstreamClient,
    target: Arc<UpstreamTarget>,
    upstream_timeout: Duration,
}

impl Forwarder {
    /// Build the forwarder and its client from configuration.
    pub fn new(config: &ForwarderConfig) -> Result<Self, StartupError> {
        let target = UpstreamTarget::from_config(&config.upstream)?;
        install_crypto_provider()?;

        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_nodelay(true);
        http.set_connect_timeout(Some(Duration::from_secs(config.timeouts.connect_secs)));

        // Native roots are only required when we actually speak TLS.
        let builder = match config.upstream.scheme {
            UpstreamScheme::Https => HttpsConnectorBuilder::new()
                .with_native_roots()
                .map_err(StartupError::TlsRoots)?,
            UpstreamScheme::Http => HttpsConnectorBuilder::new().with_webpki_roots(),
        };
        let connector = builder.https_or_http().enable_http1().wrap_connector(http);

        let client = Client::builder(TokioExecutor::new()).build(connector);

        tracing::debug!(
            upstream = %target,
            connect_timeout_secs = config.timeouts.connect_secs,
            upstream_timeout_secs = config.timeouts.upstream_secs,
            "Upstream client ready"
        );

        Ok(Self {
            client,
            target: Arc::new(target),
            upstream_timeout: Duration::from_secs(config.timeouts.upstream_secs),
        })
    }

    pub fn target(&self) -> &UpstreamTarget {
        &self.target
    }

    /// Forward one request and return the upstream's response, body streaming.
    pub async fn forward(&self, request: Request<Body>) -> Result<Response<Body>, ForwardError> {
        let upstream_request = self.upstream_request(request)?;

        let response = tokio::time::timeout(
            self.upstream_timeout,
            self.client.request(upstream_request),
        )
        .await
        .map_err(|_| ForwardError::Timeout {
            target: self.target.to_string(),
            timeout: self.upstream_timeout,
        })??;

        Ok(passthrough(response))
    }

    /// Re-address an inbound request at the upstream.
    fn upstream_request(&self, request: Request<Body>) -> Result<Request<Body>, ForwardError> {
        let (mut parts, body) = request.into_parts();

        let path_and_query = parts
            .uri
            .path_and_query()
            .cloned()
            .unwrap_or_else(|| PathAndQuery::from_static("/"));

        // HTTP/2 clients carry the host in :authority; keep what they asked for.
        if !parts.headers.contains_key(header::HOST) {
            if let Some(authority) = parts.uri.authority() {
                if let Ok(host) = HeaderValue::from_str(authority.as_str()) {
                    parts.headers.insert(header::HOST, host);
                }
            }
        }

        strip_hop_by_hop(&mut parts.headers);
        parts.uri = self.target.uri_for(path_and_query)?;

        // The upstream leg is HTTP/1.x.
        if parts.version != Version::HTTP_10 {
            parts.version = Version::HTTP_11;
        }

        Ok(Request::from_parts(parts, body))
    }
}
