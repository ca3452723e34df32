//! Response handling and transformation.
//!
//! # Responsibilities
//! - Copy an upstream (origin or store) response onto the client response
//! - Preserve status and every header value, multi-valued ones included
//! - Stream the body through without buffering it
//!
//! # Design Decisions
//! - Hop-by-hop headers are connection-scoped and stripped; the server
//!   applies its own framing
//! - A client disconnect mid-body surfaces as a write error and ends the
//!   request; nothing is retried

use axum::body::Body;
use axum::http::header::HeaderName;
use axum::response::Response;

/// Headers that only describe a single connection.
fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

/// Turn an upstream response into the client response, byte for byte.
pub fn forward(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let headers = upstream.headers().clone();

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;

    let out = response.headers_mut();
    for (name, value) in headers.iter() {
        if !is_hop_by_hop(name) {
            out.append(name.clone(), value.clone());
        }
    }

    response
}
