//! Response handling and transformation.
//!
//! # Responsibilities
//! - Turn a buffered upstream reply into the client response
//! - Strip hop-by-hop headers in both directions
//!
//! # Design Decisions
//! - The upstream body is fully buffered, so a failed read never reaches the
//!   client as a truncated body
//! - Hop-by-hop headers stripped automatically
//! - Upstream errors map to 502 (see `DispatchError`)

use axum::body::{Body, Bytes};
use axum::http::header::{HeaderMap, HeaderName, CONNECTION};
use axum::http::{Response, StatusCode};

/// Connection-scoped headers that must not be forwarded (RFC 9110 §7.6.1).
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

/// Assemble the client response from already transformed parts.
pub fn build_response(status: StatusCode, headers: HeaderMap, body: Bytes) -> Response<Body> {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
