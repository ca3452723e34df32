//! Store credentials, object locations and error definitions.

use thiserror::Error;
use url::Url;

/// Signing credentials injected at construction.
#[derive(Clone)]
pub struct Credentials {
    access_key: String,
    secret_key: String,
}

impl Credentials {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub(crate) fn secret_key(&self) -> &str {
        &self.secret_key
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Where an object lives in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    /// Absolute URL clients are redirected to and requests are sent to.
    pub url: Url,
    /// Canonicalized resource for signing: `/<bucket>/<encoded-key>`.
    pub resource: String,
}

impl std::fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// Errors that can occur while talking to the object store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request never produced a response (connect, I/O, body stream).
    #[error("store transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The store URL built for a key did not parse.
    #[error("invalid store url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// A header value could not be encoded.
    #[error("invalid {0} header value")]
    InvalidHeader(&'static str),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
