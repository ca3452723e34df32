//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the caching proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Object store location and credentials.
    pub store: StoreConfig,

    /// Redirect status codes for cache hits and fresh stores.
    pub redirects: RedirectConfig,

    /// Spooling of bodies with unknown length.
    pub spool: SpoolConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Object store configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Bucket where fetched resources are cached.
    pub bucket: String,

    /// Store host, optionally with a port (e.g., "s3.amazonaws.com").
    pub endpoint: String,

    /// Address objects as `<endpoint>/<bucket>/<key>` instead of
    /// `<bucket>.<endpoint>/<key>`.
    pub path_style: bool,

    /// Access key identifier used in the `Authorization` header.
    pub access_key: String,

    /// Secret key used to sign requests. Never logged.
    pub secret_key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            endpoint: "s3.amazonaws.com".to_string(),
            path_style: false,
            access_key: String::new(),
            secret_key: String::new(),
        }
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .field("path_style", &self.path_style)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Redirect status codes.
///
/// A hit points at an object that has been in the store for a while, so it
/// defaults to a permanent redirect. A freshly stored object defaults to a
/// temporary one.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RedirectConfig {
    /// Status used when the probe finds the object (default 301).
    pub hit_status: u16,

    /// Status used right after a successful store (default 302).
    pub stored_status: u16,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            hit_status: 301,
            stored_status: 302,
        }
    }
}

/// Spool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SpoolConfig {
    /// Directory for spool files. Falls back to the OS temp dir.
    pub directory: Option<PathBuf>,

    /// File name prefix for spool files.
    pub prefix: String,
}

impl Default for SpoolConfig {
    fn default() -> Self {
        Self {
            directory: None,
            prefix: "upload".to_string(),
        }
    }
}

impl SpoolConfig {
    /// Directory spools are created in.
    pub fn directory(&self) -> PathBuf {
        self.directory.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Outbound connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Inbound request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 300,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines instead of the human-readable format.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
