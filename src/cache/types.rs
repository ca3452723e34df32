//! Error definitions for the cache-aside path.

use thiserror::Error;

/// Why an inbound request path is not a usable target.
#[derive(Debug, Error)]
pub enum TargetError {
    /// The path is not an absolute URL.
    #[error("not an absolute URL: {0}")]
    Parse(#[from] url::ParseError),

    /// The URL parsed but has no host to key the cache on.
    #[error("URL has no host: {0}")]
    MissingHost(String),
}

/// Spooling failures.
#[derive(Debug, Error)]
pub enum SpoolError {
    #[error("failed to create spool file: {0}")]
    Create(#[source] std::io::Error),

    #[error("failed to write spool file: {0}")]
    Write(#[source] std::io::Error),

    #[error("failed to rewind spool file: {0}")]
    Rewind(#[source] std::io::Error),

    /// Reading the origin body failed midway.
    #[error("upstream body error: {0}")]
    Upstream(#[source] Box<dyn std::error::Error + Send + Sync>),
}
