//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Compile every route to surface pattern/URI/header problems
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use tokio::sync::Semaphore;

use crate::config::schema::GatewayConfig;
use crate::error::{RouteError, RouteErrorKind};
use crate::routing::Route;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("graphql.path must start with '/'")]
    GraphqlPath,

    #[error("graphql.path '{0}' must be a literal path without ':', '*', '{{' or '}}'")]
    GraphqlPathSyntax(String),

    #[error("graphql.path '{0}' collides with the admin endpoints under /admin/")]
    GraphqlAdminOverlap(String),

    #[error("listener.max_connections must not exceed {max}")]
    TooManyConnections { max: usize },

    #[error("sample_client.base_url: {0}")]
    SampleClientUrl(String),

    #[error("admin.api_key must be set when admin is enabled")]
    AdminKey,
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    let positive = [
        ("listener.max_connections", config.listener.max_connections as u64),
        ("security.max_body_size", config.security.max_body_size as u64),
        ("timeouts.connect_secs", config.timeouts.connect_secs),
        ("timeouts.upstream_secs", config.timeouts.upstream_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero(field));
        }
    }

    if config.listener.max_connections > Semaphore::MAX_PERMITS {
        errors.push(ValidationError::TooManyConnections {
            max: Semaphore::MAX_PERMITS,
        });
    }

    let mut ids = HashSet::new();
    for route in &config.routes {
        if !ids.insert(route.id.as_str()) {
            errors.push(RouteError::new(&route.id, RouteErrorKind::DuplicateId).into());
        }
        if let Err(e) = Route::from_config(route) {
            errors.push(e.into());
        }
    }

    if config.graphql.enabled {
        check_graphql_path(&mut errors, &config.graphql.path, config.admin.enabled);
    }

    if config.sample_client.enabled {
        if let Err(e) = url::Url::parse(&config.sample_client.base_url) {
            errors.push(ValidationError::SampleClientUrl(e.to_string()));
        }
    }

    if config.admin.enabled && config.admin.api_key.trim().is_empty() {
        errors.push(ValidationError::AdminKey);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// The GraphQL path is mounted as an axum route, so it must be a plain literal.
fn check_graphql_path(errors: &mut Vec<ValidationError>, path: &str, admin_enabled: bool) {
    if !path.starts_with('/') {
        errors.push(ValidationError::GraphqlPath);
    }
    if path.contains([':', '*', '{', '}']) {
        errors.push(ValidationError::GraphqlPathSyntax(path.to_string()));
    }
    if admin_enabled && path.starts_with("/admin/") {
        errors.push(ValidationError::GraphqlAdminOverlap(path.to_string()));
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
