//! Single-target HTTP forwarder library.
//!
//! Accepts HTTP requests and relays each one, unmodified, to one fixed
//! upstream, streaming the upstream's response back to the caller. A request
//! that cannot complete its round trip gets a `500` with a
//! `Proxy error: <reason>` body; nothing else is affected.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::schema::ForwarderConfig;
pub use error::{ForwardError, StartupError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
