//! Request correlation and access logging.
//!
//! # Responsibilities
//! - Generate a unique request ID (random 128-bit, hex) unless the client sent one
//! - Log each inbound request (peer, method, URI, headers)
//! - Log each outbound response (status, latency, headers)
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Handler logs run inside a span carrying the ID; the handler itself
//!   never reads it and works without this layer

use std::net::SocketAddr;
use std::time::Instant;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Instrument;
use uuid::Uuid;

/// Header carrying the correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Mints request IDs: 32 lowercase hex characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdGenerator;

impl MakeRequestId for RequestIdGenerator {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().simple().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Access-log middleware. Expects the request ID layer to run first.
pub async fn access_log(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());

    let span = tracing::info_span!("request", request_id = %request_id);
    async move {
        tracing::info!(
            peer = %peer,
            method = %request.method(),
            uri = %request.uri(),
            headers = %headers_json(request.headers()),
            "->"
        );

        let response = next.run(request).await;

        tracing::info!(
            status = response.status().as_u16(),
            duration = ?start.elapsed(),
            headers = %headers_json(response.headers()),
            "<-"
        );
        response
    }
    .instrument(span)
    .await
}

/// Render headers as a JSON object of name → list of values.
pub fn headers_json(headers: &HeaderMap) -> String {
    let mut map = serde_json::Map::new();
    for name in headers.keys() {
        let values: Vec<serde_json::Value> = headers
            .get_all(name)
            .iter()
            .map(|v| serde_json::Value::String(String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect();
        map.insert(name.as_str().to_string(), serde_json::Value::Array(values));
    }
    serde_json::Value::Object(map).to_string()
}
