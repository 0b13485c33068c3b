//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional TOML file (EDGE_CONFIG)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overlay)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → shared via Arc to the dispatcher
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup and never mutated afterwards
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env, load_config, load_from_env, ConfigError};
pub use schema::{
    AuthConfig, ListenerConfig, LogFormat, ObservabilityConfig, ProxyConfig, RedirectMode,
    StreamingConfig, UpstreamConfig,
};
pub use validation::{validate_config, ValidationError};
