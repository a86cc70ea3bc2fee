//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (bind, local address)
//!     → Hand off to HTTP layer (one task per connection)
//! ```

pub mod listener;

pub use listener::{Listener, ListenerError};
