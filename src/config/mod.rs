//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → optional TOML file named by GUARD_CONFIG (loader.rs)
//!     → environment overrides (loader.rs)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → shared by value/Arc with all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no runtime reload
//! - All fields have defaults to allow minimal configs
//! - Unparsable values abort startup before any call is accepted

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use schema::AppConfig;
pub use schema::BatchConfig;
pub use schema::BreakerConfig;
pub use schema::ListenerConfig;
pub use schema::LogFormat;
pub use schema::ObservabilityConfig;
pub use schema::RetryConfig;
pub use schema::UpstreamConfig;
