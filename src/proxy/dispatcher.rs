//! Proxy dispatch.
//!
//! # States
//! ```text
//! Received → Matched → Forwarded → HeaderTransformed → Completed
//!     └────→ Unmatched (404, no upstream call)
//! ```
//!
//! Upstream failures leave the dispatch in `Matched` and surface as
//! `DispatchError::UpstreamUnavailable` / `UpstreamProtocolError` (502).
//!
//! # Design Decisions
//! - One upstream attempt per request, no retries
//! - Request and response bodies are buffered
//! - Cancellation follows the caller: dropping `dispatch` drops the upstream call

use std::fmt;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};

use crate::error::DispatchError;
use crate::http::request::{upstream_headers, RequestIdExt};
use crate::http::response::{build_response, strip_hop_by_hop};
use crate::proxy::upstream::{Upstream, UpstreamRequest};
use crate::routing::{headers, RouteTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPhase {
    Received,
    Matched,
    Forwarded,
    HeaderTransformed,
    Completed,
    Unmatched,
}

impl DispatchPhase {
    pub fn can_advance_to(self, next: DispatchPhase) -> bool {
        use DispatchPhase::*;
        matches!(
            (self, next),
            (Received, Matched)
                | (Received, Unmatched)
                | (Matched, Forwarded)
                | (Forwarded, HeaderTransformed)
                | (HeaderTransformed, Completed)
        )
    }
}

impl fmt::Display for DispatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Tracks the phase of one dispatch for logging.
struct Progress<'a> {
    phase: DispatchPhase,
    request_id: &'a str,
}

impl<'a> Progress<'a> {
    fn new(request_id: &'a str) -> Self {
        Self {
            phase: DispatchPhase::Received,
            request_id,
        }
    }

    fn advance(&mut self, next: DispatchPhase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "illegal dispatch transition {} -> {}",
            self.phase,
            next
        );
        tracing::trace!(
            request_id = %self.request_id,
            from = %self.phase,
            to = %next,
            "Dispatch transition"
        );
        self.phase = next;
    }
}

/// A response produced by a matched route.
#[derive(Debug)]
pub struct Forwarded {
    pub route_id: String,
    pub response: Response<Body>,
}

/// Matches, rewrites, forwards and transforms proxied requests.
pub struct Dispatcher<U> {
    routes: Arc<RouteTable>,
    upstream: U,
    max_body_bytes: usize,
}

impl<U: Upstream> Dispatcher<U> {
    pub fn new(routes: Arc<RouteTable>, upstream: U, max_body_bytes: usize) -> Self {
        Self {
            routes,
            upstream,
            max_body_bytes,
        }
    }

    pub fn routes(&self) -> &Arc<RouteTable> {
        &self.routes
    }

    pub async fn dispatch(&self, request: Request<Body>) -> Result<Forwarded, DispatchError> {
        let (parts, body) = request.into_parts();
        let request_id = parts.headers.request_id().to_owned();
        let mut progress = Progress::new(&request_id);

        let Some(matched) = self.routes.match_request(&parts) else {
            progress.advance(DispatchPhase::Unmatched);
            tracing::warn!(
                request_id = %request_id,
                method = %parts.method,
                path = %parts.uri.path(),
                "No route matched"
            );
            return Err(DispatchError::NoRouteMatched {
                path: parts.uri.path().to_string(),
            });
        };
        progress.advance(DispatchPhase::Matched);

        let route = matched.route;
        let path = matched.rewritten_path(parts.uri.path());
        let url = route.upstream_url(&path, parts.uri.query());

        let body = axum::body::to_bytes(body, self.max_body_bytes)
            .await
            .map_err(|e| DispatchError::InvalidRequestBody(e.to_string()))?;

        tracing::debug!(
            request_id = %request_id,
            route = %route.id,
            method = %parts.method,
            upstream = %url,
            "Forwarding request"
        );

        let reply = self
            .upstream
            .forward(UpstreamRequest {
                method: parts.method,
                url,
                headers: upstream_headers(parts.headers),
                body,
            })
            .await
            .map_err(|e| {
                tracing::error!(request_id = %request_id, route = %route.id, error = %e, "Upstream error");
                DispatchError::from_upstream(&route.id, e)
            })?;
        progress.advance(DispatchPhase::Forwarded);

        let mut response_headers = reply.headers;
        strip_hop_by_hop(&mut response_headers);
        headers::apply_all(&route.response_headers, &mut response_headers);
        progress.advance(DispatchPhase::HeaderTransformed);

        let response = build_response(reply.status, response_headers, reply.body);
        progress.advance(DispatchPhase::Completed);

        tracing::debug!(
            request_id = %request_id,
            route = %route.id,
            status = %response.status(),
            "Request completed"
        );

        Ok(Forwarded {
            route_id: route.id.clone(),
            response,
        })
    }
}
