//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (cache_key, status, error)
//!     → spans carrying the request ID (http::request)
//!
//! Consumers:
//!     → stdout, human-readable or JSON lines
//! ```

pub mod logging;

pub use logging::init_logging;
