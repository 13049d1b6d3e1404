//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → FailoverConfig::normalize (inherit default probe targets)
//!     → validation.rs (semantic checks)
//!     → FailoverConfig (validated, immutable)
//!     → handed to probes, coordinator and API at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the interface set is fixed for a run
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ApiConfig, FailoverConfig, HealthConfig, InterfaceConfig, LogFormat, ObservabilityConfig,
    ProbeConfig, ProbeKind, RouteBackend, RouteConfig,
};
pub use validation::ValidationError;
