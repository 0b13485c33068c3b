//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → dispatcher.rs
//!         → security (Basic auth gate, 401 challenge)
//!         → request.rs (rewrite to upstream origin)
//!         → upstream.rs (single forwarding attempt)
//!         → response.rs (classify, sanitize event streams)
//!             → decode.rs (strip content coding from event streams)
//!     → Send to client, body relayed chunk by chunk
//! ```

pub mod decode;
pub mod dispatcher;
pub mod error;
pub mod request;
pub mod response;
pub mod server;
pub mod upstream;

pub use dispatcher::EdgeDispatcher;
pub use error::ProxyError;
pub use request::{rewrite, OutboundRequest, UpstreamBase, X_REQUEST_ID};
pub use response::{classify, sanitize, ResponseClass};
pub use server::HttpServer;
pub use upstream::UpstreamClient;
