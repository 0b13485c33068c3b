//! HTTP edge gateway for a single upstream origin.
//!
//! Optionally gates traffic behind Basic auth, forwards every request to the
//! configured upstream, and relays event-stream responses chunk by chunk with
//! headers rewritten so nothing in between buffers them.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::ProxyConfig;
pub use http::{EdgeDispatcher, HttpServer};
pub use lifecycle::Shutdown;
