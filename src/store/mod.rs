//! Object store subsystem.
//!
//! # Data Flow
//! ```text
//! cache key
//!     → client.rs (locate: store URL + signing resource)
//!     → signing.rs (Date + Authorization, S3 signature V2)
//!     → HEAD (probe) / PUT (upload with declared length)
//! ```
//!
//! # Design Decisions
//! - Credentials are injected at construction, never read from globals
//! - No retries; transport errors are returned to the caller
//! - Store responses are returned whole so callers can forward them

pub mod client;
pub mod signing;
pub mod types;

pub use client::ObjectStoreClient;
pub use types::{Credentials, ObjectLocation, StoreError, StoreResult};
