//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, access log)
//!     → cache::CachingHandler (cache-aside decision)
//!     → response.rs (verbatim forwarding of upstream responses)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdGenerator, X_REQUEST_ID};
pub use response::forward;
pub use server::HttpServer;
