//! Cache-aside request handling.
//!
//! # State Machine
//! ```text
//! Start → MethodChecked → TargetParsed → Probed
//!     Probed(hit)  → Hit (redirect, permanent by default)
//!     Probed(miss) → OriginFetched
//!         transport error → OriginUnreachable (502)
//!         status != 200   → OriginRejected (forward verbatim)
//!         status == 200   → Stored
//!             store 200       → Stored (redirect, temporary by default)
//!             store non-200   → StoreRejected (forward verbatim)
//!             store transport → StoreFailed (502)
//!             no spool file   → Uncached (origin served, nothing stored)
//!             spool failure   → SpoolFailed (502)
//! ```
//!
//! Every request ends in exactly one [`Outcome`]; nothing is retried and no
//! state outlives the request.

use std::time::Duration;

use axum::body::Body;
use axum::http::header::{ALLOW, CONTENT_TYPE, LOCATION};
use axum::http::{HeaderValue, Method, Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};

use crate::cache::key::{CacheKey, Target};
use crate::cache::spool::Spool;
use crate::cache::types::{SpoolError, TargetError};
use crate::config::{ProxyConfig, RedirectConfig, SpoolConfig};
use crate::http::response::forward;
use crate::store::{ObjectLocation, ObjectStoreClient, StoreError};

/// Redirect statuses resolved from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redirects {
    pub hit: StatusCode,
    pub stored: StatusCode,
}

impl Default for Redirects {
    fn default() -> Self {
        Self {
            hit: StatusCode::MOVED_PERMANENTLY,
            stored: StatusCode::FOUND,
        }
    }
}

impl From<&RedirectConfig> for Redirects {
    fn from(config: &RedirectConfig) -> Self {
        let defaults = Self::default();
        Self {
            hit: redirect_status(config.hit_status).unwrap_or(defaults.hit),
            stored: redirect_status(config.stored_status).unwrap_or(defaults.stored),
        }
    }
}

fn redirect_status(code: u16) -> Option<StatusCode> {
    StatusCode::from_u16(code)
        .ok()
        .filter(StatusCode::is_redirection)
}

/// Terminal state of one request.
#[derive(Debug)]
pub enum Outcome {
    /// Anything but GET.
    MethodNotAllowed,
    /// The path is not an absolute URL.
    MalformedTarget(TargetError),
    /// The store already holds the object.
    Hit(ObjectLocation),
    /// The origin could not be reached.
    OriginUnreachable(reqwest::Error),
    /// The origin answered with something other than 200.
    OriginRejected(reqwest::Response),
    /// The origin body was uploaded and accepted.
    Stored(ObjectLocation),
    /// No spool could be created for a body of unknown length; the origin
    /// response is served as is and nothing is stored.
    Uncached(reqwest::Response),
    /// The store answered the upload with something other than 200.
    StoreRejected(reqwest::Response),
    /// The store could not be addressed or reached.
    StoreFailed(StoreError),
    /// A body of unknown length could not be captured.
    SpoolFailed(SpoolError),
}

impl Outcome {
    /// Status the client will see, when known without the upstream response.
    pub fn status(&self, redirects: &Redirects) -> StatusCode {
        match self {
            Outcome::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Outcome::MalformedTarget(_) => StatusCode::BAD_REQUEST,
            Outcome::Hit(_) => redirects.hit,
            Outcome::Stored(_) => redirects.stored,
            Outcome::OriginRejected(upstream)
            | Outcome::Uncached(upstream)
            | Outcome::StoreRejected(upstream) => upstream.status(),
            Outcome::OriginUnreachable(_)
            | Outcome::StoreFailed(_)
            | Outcome::SpoolFailed(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Variant name, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Outcome::MethodNotAllowed => "method_not_allowed",
            Outcome::MalformedTarget(_) => "malformed_target",
            Outcome::Hit(_) => "hit",
            Outcome::OriginUnreachable(_) => "origin_unreachable",
            Outcome::OriginRejected(_) => "origin_rejected",
            Outcome::Stored(_) => "stored",
            Outcome::Uncached(_) => "uncached",
            Outcome::StoreRejected(_) => "store_rejected",
            Outcome::StoreFailed(_) => "store_failed",
            Outcome::SpoolFailed(_) => "spool_failed",
        }
    }

    /// Render the client response.
    pub fn into_response(self, redirects: &Redirects) -> Response {
        match self {
            Outcome::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                [(ALLOW, "GET")],
                "Method not allowed",
            )
                .into_response(),
            Outcome::MalformedTarget(e) => {
                (StatusCode::BAD_REQUEST, format!("Parse error: {}", e)).into_response()
            }
            Outcome::Hit(location) => redirect(redirects.hit, &location),
            Outcome::Stored(location) => redirect(redirects.stored, &location),
            Outcome::OriginRejected(upstream)
            | Outcome::Uncached(upstream)
            | Outcome::StoreRejected(upstream) => forward(upstream),
            Outcome::OriginUnreachable(_) => {
                (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
            }
            Outcome::StoreFailed(_) | Outcome::SpoolFailed(_) => {
                (StatusCode::BAD_GATEWAY, "Cache store failed").into_response()
            }
        }
    }
}

fn redirect(status: StatusCode, location: &ObjectLocation) -> Response {
    match HeaderValue::from_str(location.url.as_str()) {
        Ok(value) => {
            let mut response = Response::new(Body::empty());
            *response.status_mut() = status;
            response.headers_mut().insert(LOCATION, value);
            response
        }
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Invalid store location").into_response(),
    }
}

/// Serves targets from the object store, filling it from the origin on miss.
#[derive(Debug, Clone)]
pub struct CachingHandler {
    store: ObjectStoreClient,
    origin: reqwest::Client,
    redirects: Redirects,
    spool: SpoolConfig,
}

impl CachingHandler {
    /// Build the handler and its outbound clients from configuration.
    pub fn new(config: &ProxyConfig) -> Result<Self, StoreError> {
        let connect_timeout = Duration::from_secs(config.timeouts.connect_secs);
        let store = ObjectStoreClient::new(&config.store, connect_timeout)?;
        let origin = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(Self::from_parts(
            store,
            origin,
            Redirects::from(&config.redirects),
            config.spool.clone(),
        ))
    }

    /// Assemble a handler from already-built collaborators.
    pub fn from_parts(
        store: ObjectStoreClient,
        origin: reqwest::Client,
        redirects: Redirects,
        spool: SpoolConfig,
    ) -> Self {
        Self {
            store,
            origin,
            redirects,
            spool,
        }
    }

    /// Handle one inbound request end to end.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let outcome = self.resolve(request.method(), request.uri()).await;
        tracing::debug!(
            outcome = outcome.name(),
            status = %outcome.status(&self.redirects),
            "Request resolved"
        );
        outcome.into_response(&self.redirects)
    }

    /// Walk the state machine for a request and return where it ended.
    pub async fn resolve(&self, method: &Method, uri: &Uri) -> Outcome {
        if method != Method::GET {
            tracing::debug!(method = %method, "Rejecting non-GET request");
            return Outcome::MethodNotAllowed;
        }

        let path = uri.path_and_query().map_or(uri.path(), |pq| pq.as_str());
        let target = match Target::from_request_path(path) {
            Ok(target) => target,
            Err(e) => {
                tracing::info!(path = %path, error = %e, "Malformed target");
                return Outcome::MalformedTarget(e);
            }
        };

        let key = target.cache_key();
        let location = match self.store.locate(key.as_str()) {
            Ok(location) => location,
            Err(e) => {
                tracing::error!(cache_key = %key, error = %e, "Cannot address store object");
                return Outcome::StoreFailed(e);
            }
        };

        match self.store.probe(&location).await {
            Ok(StatusCode::OK) => {
                tracing::info!(cache_key = %key, "Cache hit");
                return Outcome::Hit(location);
            }
            Ok(status) => {
                tracing::info!(cache_key = %key, status = %status, "Cache miss");
            }
            Err(e) => {
                tracing::warn!(cache_key = %key, error = %e, "Store probe failed, treating as miss");
            }
        }

        let upstream = match self.origin.get(target.url().clone()).send().await {
            Ok(upstream) => upstream,
            Err(e) => {
                tracing::error!(cache_key = %key, error = %e, "Upstream request failed");
                return Outcome::OriginUnreachable(e);
            }
        };

        if upstream.status() != StatusCode::OK {
            tracing::warn!(cache_key = %key, status = %upstream.status(), "Upstream error, forwarding");
            return Outcome::OriginRejected(upstream);
        }

        self.store_upstream(&key, location, upstream).await
    }

    /// Upload a 200 origin response and decide the final outcome.
    async fn store_upstream(
        &self,
        key: &CacheKey,
        location: ObjectLocation,
        upstream: reqwest::Response,
    ) -> Outcome {
        let content_type = upstream.headers().get(CONTENT_TYPE).cloned();

        let stored = match upstream.content_length() {
            Some(length) => {
                tracing::info!(cache_key = %key, size = length, "Storing in cache");
                let body = reqwest::Body::wrap_stream(upstream.bytes_stream());
                self.store
                    .put(&location, body, length, content_type.as_ref())
                    .await
            }
            None => {
                // Nothing has been read from the origin yet, so it can still
                // be served without caching.
                let mut spool =
                    match Spool::create(&self.spool.directory(), &self.spool.prefix).await {
                        Ok(spool) => spool,
                        Err(e) => {
                            tracing::error!(cache_key = %key, error = %e, "Cannot create spool, serving upstream uncached");
                            return Outcome::Uncached(upstream);
                        }
                    };

                // The spool lives until the upload attempt finishes and is
                // deleted when it goes out of scope.
                if let Err(e) = self.spool_body(key, &mut spool, upstream).await {
                    tracing::error!(cache_key = %key, error = %e, "Spooling upstream failed");
                    return Outcome::SpoolFailed(e);
                }
                let reader = match spool.reader().await {
                    Ok(reader) => reader,
                    Err(e) => {
                        tracing::error!(cache_key = %key, error = %e, "Spooling upstream failed");
                        return Outcome::SpoolFailed(e);
                    }
                };

                tracing::info!(cache_key = %key, size = spool.len(), "Storing spooled body in cache");
                self.store
                    .put(
                        &location,
                        reqwest::Body::from(reader),
                        spool.len(),
                        content_type.as_ref(),
                    )
                    .await
            }
        };

        match stored {
            Ok(response) if response.status() == StatusCode::OK => {
                tracing::info!(cache_key = %key, "Stored in cache");
                Outcome::Stored(location)
            }
            Ok(response) => {
                tracing::warn!(cache_key = %key, status = %response.status(), "Store rejected upload, forwarding");
                Outcome::StoreRejected(response)
            }
            Err(e) => {
                tracing::error!(cache_key = %key, error = %e, "Store upload failed");
                Outcome::StoreFailed(e)
            }
        }
    }

    async fn spool_body(
        &self,
        key: &CacheKey,
        spool: &mut Spool,
        upstream: reqwest::Response,
    ) -> Result<u64, SpoolError> {
        tracing::debug!(cache_key = %key, path = ?spool.path(), "Spooling upstream body of unknown length");
        spool.fill(upstream.bytes_stream()).await
    }
}
