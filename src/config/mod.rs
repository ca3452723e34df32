//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! built-in defaults
//!     → loader.rs (optional TOML file)
//!     → overrides.rs (command-line flags / environment)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → injected into the store client and handler at construction
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Nothing reads credentials from process-wide state after startup

pub mod loader;
pub mod overrides;
pub mod schema;
pub mod validation;

pub use loader::{load_config, read_config, ConfigError};
pub use overrides::StoreArgs;
pub use schema::{
    ListenerConfig, ObservabilityConfig, ProxyConfig, RedirectConfig, SpoolConfig, StoreConfig,
    TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
