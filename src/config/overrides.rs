//! Command-line and environment overrides.
//!
//! Shared by the server and `cache-cli` so both resolve store settings the
//! same way.

use std::path::PathBuf;

use clap::Args;

use crate::config::schema::{ProxyConfig, StoreConfig};

/// Object store flags. Each one falls back to an environment variable.
#[derive(Debug, Clone, Default, Args)]
pub struct StoreArgs {
    /// S3 bucket where to cache the files
    #[arg(long, env = "S3_BUCKET_NAME")]
    pub bucket: Option<String>,

    /// S3 access key ID
    #[arg(long, env = "AWS_ACCESS_KEY_ID")]
    pub access_key: Option<String>,

    /// S3 secret key
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Store host[:port]
    #[arg(long, env = "S3_ENDPOINT")]
    pub store_endpoint: Option<String>,

    /// Use path-style object URLs (<endpoint>/<bucket>/<key>)
    #[arg(long)]
    pub path_style: bool,
}

impl StoreArgs {
    /// Overlay the flags that were given onto `store`.
    pub fn apply(&self, store: &mut StoreConfig) {
        if let Some(bucket) = &self.bucket {
            store.bucket = bucket.clone();
        }
        if let Some(access_key) = &self.access_key {
            store.access_key = access_key.clone();
        }
        if let Some(secret_key) = &self.secret_key {
            store.secret_key = secret_key.clone();
        }
        if let Some(endpoint) = &self.store_endpoint {
            store.endpoint = endpoint.clone();
        }
        if self.path_style {
            store.path_style = true;
        }
    }
}

/// Overlay listener and spool flags onto a loaded configuration.
pub fn apply_server_overrides(
    config: &mut ProxyConfig,
    addr: Option<&str>,
    spool_dir: Option<PathBuf>,
    store: &StoreArgs,
) {
    if let Some(addr) = addr {
        config.listener.bind_address = addr.to_string();
    }
    if let Some(dir) = spool_dir {
        config.spool.directory = Some(dir);
    }
    store.apply(&mut config.store);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_file_values() {
        let mut config = ProxyConfig::default();
        config.store.bucket = "from-file".into();
        config.store.access_key = "file-key".into();

        let args = StoreArgs {
            bucket: Some("from-flag".into()),
            store_endpoint: Some("127.0.0.1:9000".into()),
            path_style: true,
            ..StoreArgs::default()
        };
        apply_server_overrides(&mut config, Some("127.0.0.1:8081"), None, &args);

        assert_eq!(config.store.bucket, "from-flag");
        assert_eq!(config.store.access_key, "file-key");
        assert_eq!(config.store.endpoint, "127.0.0.1:9000");
        assert!(config.store.path_style);
        assert_eq!(config.listener.bind_address, "127.0.0.1:8081");
        assert!(config.spool.directory.is_none());
    }

    #[test]
    fn absent_path_style_flag_keeps_file_setting() {
        let mut store = StoreConfig {
            path_style: true,
            ..StoreConfig::default()
        };
        StoreArgs::default().apply(&mut store);
        assert!(store.path_style);
    }
}
