//! Route matching logic.
//!
//! # Responsibilities
//! - Match the request path against a pattern (exact, `{name}` segments, `/**`)
//! - Match host header (exact match, case-insensitive)
//! - Match method and required headers
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - Host matching is case-insensitive (per HTTP spec)
//! - Path matching is case-sensitive
//! - Empty condition = always matches (wildcard)
//! - No regex to guarantee O(n) matching

use std::collections::HashMap;
use std::fmt;

use axum::http::header::{HeaderName, HeaderValue, HOST};
use axum::http::request::Parts;
use axum::http::Method;

use crate::error::RouteErrorKind;

/// Variables captured by `{name}` segments.
pub type PathVariables = HashMap<String, String>;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + fmt::Debug + fmt::Display {
    /// Returns true if the request matches this condition.
    fn matches(&self, req: &Parts) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternKind {
    Exact,
    Template {
        segments: Vec<Segment>,
        catch_all: bool,
    },
}

/// Compiled path pattern.
///
/// A pattern without `{...}` or `**` compares the whole path for equality,
/// so `/proxy` does not match `/proxy/` or `/proxy/x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    kind: PatternKind,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Result<Self, RouteErrorKind> {
        let invalid = |reason| RouteErrorKind::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };

        if !pattern.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }
        if !pattern.contains('{') && !pattern.contains('}') && !pattern.contains("**") {
            return Ok(Self {
                raw: pattern.to_string(),
                kind: PatternKind::Exact,
            });
        }

        let (body, catch_all) = match pattern.strip_suffix("/**") {
            Some(rest) => (rest, true),
            None => (pattern, false),
        };
        if body.contains("**") {
            return Err(invalid("'**' is only allowed as the last segment"));
        }

        let mut segments = Vec::new();
        for segment in body.split('/').skip(1) {
            let parsed = match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) if name.is_empty() || name.contains(['{', '}']) => {
                    return Err(invalid("variable names must be non-empty"));
                }
                Some(name) => {
                    if segments.contains(&Segment::Variable(name.to_string())) {
                        return Err(invalid("variable names must be unique"));
                    }
                    Segment::Variable(name.to_string())
                }
                None if segment.contains(['{', '}']) => {
                    return Err(invalid("a variable must span a whole segment"));
                }
                None => Segment::Literal(segment.to_string()),
            };
            segments.push(parsed);
        }

        Ok(Self {
            raw: pattern.to_string(),
            kind: PatternKind::Template { segments, catch_all },
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match `path`, returning captured variables on success.
    pub fn captures(&self, path: &str) -> Option<PathVariables> {
        let (segments, catch_all) = match &self.kind {
            PatternKind::Exact => return (path == self.raw).then(PathVariables::new),
            PatternKind::Template {
                segments,
                catch_all,
            } => (segments, *catch_all),
        };

        let mut actual = path.split('/');
        if actual.next() != Some("") {
            return None;
        }

        let mut variables = PathVariables::new();
        for segment in segments {
            let value = actual.next()?;
            match segment {
                Segment::Literal(expected) if expected != value => return None,
                Segment::Literal(_) => {}
                Segment::Variable(_) if value.is_empty() => return None,
                Segment::Variable(name) => {
                    variables.insert(name.clone(), value.to_string());
                }
            }
        }

        if !catch_all && actual.next().is_some() {
            return None;
        }
        Some(variables)
    }
}

impl Matcher for PathPattern {
    fn matches(&self, req: &Parts) -> bool {
        self.captures(req.uri.path()).is_some()
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path={}", self.raw)
    }
}

/// Matches the Host header.
#[derive(Debug, Clone)]
pub struct HostMatcher {
    expected_host: String,
}

impl HostMatcher {
    /// Create a new host matcher.
    /// The host is normalized to lowercase for case-insensitive matching.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            expected_host: host.into().to_lowercase(),
        }
    }

    fn host_matches(&self, host: &str) -> bool {
        let host = host.to_lowercase();
        if host == self.expected_host {
            return true;
        }
        // "example.com" also matches "example.com:8080"
        !self.expected_host.contains(':')
            && host
                .rsplit_once(':')
                .is_some_and(|(name, _port)| name == self.expected_host)
    }
}

impl Matcher for HostMatcher {
    fn matches(&self, req: &Parts) -> bool {
        req.headers
            .get(HOST)
            .and_then(|h| h.to_str().ok())
            .or_else(|| req.uri.authority().map(|a| a.as_str()))
            .map(|h| self.host_matches(h))
            .unwrap_or(false)
    }
}

impl fmt::Display for HostMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Host={}", self.expected_host)
    }
}

/// Matches one of a set of methods.
#[derive(Debug, Clone)]
pub struct MethodMatcher {
    methods: Vec<Method>,
}

impl MethodMatcher {
    pub fn new(methods: Vec<Method>) -> Self {
        Self { methods }
    }

    pub fn parse<S: AsRef<str>>(methods: &[S]) -> Result<Self, RouteErrorKind> {
        methods
            .iter()
            .map(|m| {
                let m = m.as_ref();
                Method::from_bytes(m.to_uppercase().as_bytes())
                    .map_err(|_| RouteErrorKind::InvalidMethod(m.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }
}

impl Matcher for MethodMatcher {
    fn matches(&self, req: &Parts) -> bool {
        self.methods.contains(&req.method)
    }
}

impl fmt::Display for MethodMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let methods: Vec<&str> = self.methods.iter().map(Method::as_str).collect();
        write!(f, "Method={}", methods.join(","))
    }
}

/// Requires a header, optionally with an exact value.
#[derive(Debug, Clone)]
pub struct HeaderMatcher {
    name: HeaderName,
    value: Option<HeaderValue>,
}

impl HeaderMatcher {
    pub fn parse(name: &str, value: Option<&str>) -> Result<Self, RouteErrorKind> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| RouteErrorKind::InvalidHeaderName(name.to_string()))?;
        let value = value
            .map(|v| {
                HeaderValue::from_str(v)
                    .map_err(|_| RouteErrorKind::InvalidHeaderValue(name.to_string()))
            })
            .transpose()?;
        Ok(Self { name, value })
    }
}

impl Matcher for HeaderMatcher {
    fn matches(&self, req: &Parts) -> bool {
        let mut values = req.headers.get_all(&self.name).iter();
        match &self.value {
            Some(expected) => values.any(|v| v == expected),
            None => values.next().is_some(),
        }
    }
}

impl fmt::Display for HeaderMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value.as_ref().and_then(|v| v.to_str().ok()) {
            Some(value) => write!(f, "Header={}:{}", self.name, value),
            None => write!(f, "Header={}", self.name),
        }
    }
}

/// Combines multiple matchers with AND semantics.
#[derive(Debug, Default)]
pub struct AndMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AndMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

impl Matcher for AndMatcher {
    fn matches(&self, req: &Parts) -> bool {
        // All matchers must pass (AND)
        self.matchers.iter().all(|m| m.matches(req))
    }
}

impl fmt::Display for AndMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, m) in self.matchers.iter().enumerate() {
            if i > 0 {
                write!(f, " && ")?;
            }
            write!(f, "{}", m)?;
        }
        Ok(())
    }
}
