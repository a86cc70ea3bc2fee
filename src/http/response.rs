//! Response handling.
//!
//! # Responsibilities
//! - Hand the upstream response back with its body still streaming
//! - Turn a [`ForwardError`] into the single synthesized error response
//!
//! Upstream error statuses (404, 500, ...) are ordinary forwarded responses;
//! only a failed round trip produces the 500 below.

use axum::{
    body::Body,
    http::{header, HeaderValue, Response, StatusCode},
    response::IntoResponse,
};

use crate::error::ForwardError;
use crate::http::request::strip_hop_by_hop;

/// Prefix of every synthesized error body.
pub const PROXY_ERROR_PREFIX: &str = "Proxy error: ";

/// Rebuild the upstream response for the client without buffering its body.
pub fn passthrough(response: Response<hyper::body::Incoming>) -> Response<Body> {
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, Body::new(body))
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> axum::response::Response {
        let body = format!("{}{}", PROXY_ERROR_PREFIX, self);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"))],
            body,
        )
            .into_response()
    }
}
