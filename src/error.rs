//! Error types shared across the gateway.
//!
//! Startup failures ([`GatewayError`], [`RouteError`]) are fatal and bubble up
//! to `main`. Request-path failures ([`DispatchError`]) are always turned into
//! an HTTP response at the dispatch boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::client::ClientError;
use crate::config::loader::ConfigError;

/// Why a route definition could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteErrorKind {
    #[error("invalid path pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: &'static str },

    #[error("invalid upstream uri '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("invalid method '{0}'")]
    InvalidMethod(String),

    #[error("invalid header name '{0}'")]
    InvalidHeaderName(String),

    #[error("invalid value for header '{0}'")]
    InvalidHeaderValue(String),

    #[error("set_path and strip_prefix cannot be combined")]
    ConflictingRewrite,

    #[error("duplicate route id")]
    DuplicateId,
}

/// A route definition that failed to compile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("route '{id}': {kind}")]
pub struct RouteError {
    pub id: String,
    pub kind: RouteErrorKind,
}

impl RouteError {
    pub fn new(id: impl Into<String>, kind: RouteErrorKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }
}

/// Failure of a single upstream exchange.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Connection refused, DNS failure or timeout.
    #[error("upstream unavailable: {0}")]
    Unavailable(String),

    /// The upstream answered with something that is not a usable HTTP reply.
    #[error("upstream protocol error: {0}")]
    Protocol(String),
}

/// Errors produced while dispatching a proxied request.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no route matches '{path}'")]
    NoRouteMatched { path: String },

    #[error("invalid request body: {0}")]
    InvalidRequestBody(String),

    #[error("upstream for route '{route}' is unavailable: {reason}")]
    UpstreamUnavailable { route: String, reason: String },

    #[error("upstream for route '{route}' sent an invalid response: {reason}")]
    UpstreamProtocolError { route: String, reason: String },

    #[error("gateway is shutting down")]
    ShuttingDown,
}

impl DispatchError {
    /// Attach the route id to a transport failure.
    pub fn from_upstream(route: &str, err: UpstreamError) -> Self {
        match err {
            UpstreamError::Unavailable(reason) => DispatchError::UpstreamUnavailable {
                route: route.to_string(),
                reason,
            },
            UpstreamError::Protocol(reason) => DispatchError::UpstreamProtocolError {
                route: route.to_string(),
                reason,
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::NoRouteMatched { .. } => StatusCode::NOT_FOUND,
            DispatchError::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            DispatchError::UpstreamUnavailable { .. }
            | DispatchError::UpstreamProtocolError { .. } => StatusCode::BAD_GATEWAY,
            DispatchError::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::NoRouteMatched { .. } => "NO_ROUTE_MATCHED",
            DispatchError::InvalidRequestBody(_) => "INVALID_REQUEST_BODY",
            DispatchError::UpstreamUnavailable { .. } => "UPSTREAM_UNAVAILABLE",
            DispatchError::UpstreamProtocolError { .. } => "UPSTREAM_PROTOCOL_ERROR",
            DispatchError::ShuttingDown => "SHUTTING_DOWN",
        }
    }

    /// Route the error belongs to, if matching got that far.
    pub fn route_id(&self) -> Option<&str> {
        match self {
            DispatchError::UpstreamUnavailable { route, .. }
            | DispatchError::UpstreamProtocolError { route, .. } => Some(route),
            _ => None,
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        }));

        (self.status(), body).into_response()
    }
}

/// Fatal startup errors.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("sample client: {0}")]
    SampleClient(#[from] ClientError),

    #[error("invalid address '{0}'")]
    Address(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type GatewayResult<T> = Result<T, GatewayError>;
