//! Target URL extraction and cache key derivation.
//!
//! An inbound request for `/http://example.com/logo.png?v=2` targets
//! `http://example.com/logo.png?v=2` and is cached under
//! `example.com/logo.png?v=2`.

use url::{Position, Url};

use crate::cache::types::TargetError;

/// The absolute URL a client asked the proxy to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    url: Url,
}

impl Target {
    /// Parse the target out of a request path (with query), dropping the
    /// leading separator.
    pub fn from_request_path(path_and_query: &str) -> Result<Self, TargetError> {
        let raw = path_and_query.strip_prefix('/').unwrap_or(path_and_query);
        let url = Url::parse(raw)?;

        // The key is built from the authority onward, so a host is required.
        if url.host_str().map_or(true, str::is_empty) {
            return Err(TargetError::MissingHost(raw.to_string()));
        }

        Ok(Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Cache key for this target.
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::from_url(&self.url)
    }
}

/// Object path inside the store: the target URL without its scheme.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Everything between `scheme://` and the fragment.
    pub fn from_url(url: &Url) -> Self {
        Self(url[Position::BeforeUsername..Position::AfterQuery].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
