//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, catch-all handler)
//!     → request.rs (request ID, hop-by-hop headers)
//!     → forward.rs (re-address at upstream, send, timeout)
//!     → response.rs (stream upstream response back, or synthesize 500)
//!     → Send to client
//! ```

pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use forward::{Forwarder, UpstreamTarget};
pub use request::RequestId;
pub use response::PROXY_ERROR_PREFIX;
pub use server::HttpServer;
