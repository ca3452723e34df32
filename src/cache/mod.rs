//! Cache-aside subsystem.
//!
//! # Data Flow
//! ```text
//! GET /<absolute-target-url>
//!     → key.rs (target URL, cache key = URL minus scheme)
//!     → handler.rs (probe store → fetch origin → store → redirect/forward)
//!     → spool.rs (only when the origin omits Content-Length)
//! ```
//!
//! # Design Decisions
//! - Entries are never evicted or invalidated
//! - Concurrent requests for the same key are not deduplicated; the last
//!   successful upload wins
//! - Every branch ends in an explicit `Outcome` variant

pub mod handler;
pub mod key;
pub mod spool;
pub mod types;

pub use handler::{CachingHandler, Outcome, Redirects};
pub use key::{CacheKey, Target};
pub use spool::Spool;
pub use types::{SpoolError, TargetError};
