//! Route lookup.
//!
//! # Responsibilities
//! - Compile route configs into immutable routes
//! - Look up matching route for request
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan in registration order; first match wins
//! - Explicit NoMatch rather than silent default

use std::collections::HashSet;

use axum::http::request::Parts;
use url::Url;

use crate::config::RouteConfig;
use crate::error::{RouteError, RouteErrorKind};
use crate::routing::headers::{self, HeaderOp};
use crate::routing::matcher::{
    AndMatcher, HeaderMatcher, HostMatcher, Matcher, MethodMatcher, PathPattern, PathVariables,
};
use crate::routing::rewrite::PathRewrite;

/// A compiled route.
#[derive(Debug)]
pub struct Route {
    pub id: String,
    pub path: PathPattern,
    /// Host, method and header conditions.
    pub predicate: AndMatcher,
    pub rewrite: PathRewrite,
    pub upstream: Url,
    pub response_headers: Vec<HeaderOp>,
}

impl Route {
    pub fn from_config(config: &RouteConfig) -> Result<Self, RouteError> {
        Self::compile(config).map_err(|kind| RouteError::new(&config.id, kind))
    }

    fn compile(config: &RouteConfig) -> Result<Self, RouteErrorKind> {
        let path = PathPattern::parse(&config.path)?;

        let mut conditions: Vec<Box<dyn Matcher>> = Vec::new();
        if let Some(host) = &config.host {
            conditions.push(Box::new(HostMatcher::new(host)));
        }
        if !config.methods.is_empty() {
            conditions.push(Box::new(MethodMatcher::parse(&config.methods)?));
        }
        for header in &config.headers {
            conditions.push(Box::new(HeaderMatcher::parse(
                &header.name,
                header.value.as_deref(),
            )?));
        }

        let rewrite = match (&config.set_path, config.strip_prefix) {
            (Some(_), Some(_)) => return Err(RouteErrorKind::ConflictingRewrite),
            (Some(template), None) => PathRewrite::Set(template.clone()),
            (None, Some(n)) => PathRewrite::StripPrefix(n),
            (None, None) => PathRewrite::Keep,
        };

        Ok(Self {
            id: config.id.clone(),
            path,
            predicate: AndMatcher::new(conditions),
            rewrite,
            upstream: parse_upstream(&config.uri)?,
            response_headers: headers::compile(config)?,
        })
    }

    /// Upstream URL for an already rewritten path.
    ///
    /// Scheme and authority come from the route; the route URI's own path is
    /// not used.
    pub fn upstream_url(&self, path: &str, query: Option<&str>) -> Url {
        let mut url = self.upstream.clone();
        url.set_path(path);
        url.set_query(query);
        url.set_fragment(None);
        url
    }
}

fn parse_upstream(uri: &str) -> Result<Url, RouteErrorKind> {
    let invalid = |reason: &str| RouteErrorKind::InvalidUri {
        uri: uri.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(uri).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host"));
    }
    Ok(url)
}

/// Result of a successful lookup.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    pub route: &'a Route,
    pub variables: PathVariables,
}

impl RouteMatch<'_> {
    pub fn rewritten_path(&self, original: &str) -> String {
        self.route.rewrite.apply(original, &self.variables)
    }
}

/// Ordered, immutable route table.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// Compile all routes, keeping configuration order.
    pub fn from_config(configs: &[RouteConfig]) -> Result<Self, RouteError> {
        let mut seen = HashSet::new();
        let mut routes = Vec::with_capacity(configs.len());
        for config in configs {
            if !seen.insert(config.id.as_str()) {
                return Err(RouteError::new(&config.id, RouteErrorKind::DuplicateId));
            }
            routes.push(Route::from_config(config)?);
        }
        Ok(Self::new(routes))
    }

    /// First route, in registration order, whose path and predicate match.
    pub fn match_request(&self, req: &Parts) -> Option<RouteMatch<'_>> {
        let path = req.uri.path();
        self.routes.iter().find_map(|route| {
            let variables = route.path.captures(path)?;
            route
                .predicate
                .matches(req)
                .then_some(RouteMatch { route, variables })
        })
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
