//! S3 caching proxy library.
//!
//! Serves `GET /<absolute-url>` from an S3-compatible bucket, filling the
//! bucket from the origin on a miss and redirecting clients to the stored
//! object.

pub mod cache;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod store;

pub use cache::CachingHandler;
pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use store::ObjectStoreClient;
