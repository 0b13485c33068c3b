//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (auth gate enabled):
//!     → credentials.rs (decode Basic header, constant-time compare)
//!     → pass: forwarded without its Authorization header
//!     → fail: challenge.rs (401 + WWW-Authenticate, no reason given)
//! ```
//!
//! # Design Decisions
//! - Fail closed: malformed headers are plain rejections
//! - No early exit in comparisons of secret material

pub mod challenge;
pub mod credentials;

pub use challenge::unauthorized_response;
pub use credentials::{authorize, constant_time_eq, verify, AuthFailure};
