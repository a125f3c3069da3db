//! Response header transforms.
//!
//! Append, replace and remove are distinct operations so a route never
//! overwrites an upstream header by accident.

use std::fmt;

use axum::http::header::{HeaderMap, HeaderName, HeaderValue};

use crate::config::schema::RouteConfig;
use crate::error::RouteErrorKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderOp {
    /// Append a value, keeping existing values of the same name.
    Add { name: HeaderName, value: HeaderValue },
    /// Replace all values of the header.
    Set { name: HeaderName, value: HeaderValue },
    /// Remove every value of the header.
    Remove { name: HeaderName },
}

impl HeaderOp {
    pub fn add(name: &str, value: &str) -> Result<Self, RouteErrorKind> {
        let (name, value) = parse_pair(name, value)?;
        Ok(HeaderOp::Add { name, value })
    }

    pub fn set(name: &str, value: &str) -> Result<Self, RouteErrorKind> {
        let (name, value) = parse_pair(name, value)?;
        Ok(HeaderOp::Set { name, value })
    }

    pub fn remove(name: &str) -> Result<Self, RouteErrorKind> {
        Ok(HeaderOp::Remove {
            name: parse_name(name)?,
        })
    }

    pub fn apply(&self, headers: &mut HeaderMap) {
        match self {
            HeaderOp::Add { name, value } => {
                headers.append(name.clone(), value.clone());
            }
            HeaderOp::Set { name, value } => {
                headers.insert(name.clone(), value.clone());
            }
            HeaderOp::Remove { name } => {
                headers.remove(name);
            }
        }
    }
}

impl fmt::Display for HeaderOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: &HeaderValue| v.to_str().unwrap_or("<binary>").to_string();
        match self {
            HeaderOp::Add { name, value } => write!(f, "AddResponseHeader={}:{}", name, show(value)),
            HeaderOp::Set { name, value } => write!(f, "SetResponseHeader={}:{}", name, show(value)),
            HeaderOp::Remove { name } => write!(f, "RemoveResponseHeader={}", name),
        }
    }
}

/// Compile a route's header rules: removes, then sets, then adds.
pub fn compile(config: &RouteConfig) -> Result<Vec<HeaderOp>, RouteErrorKind> {
    let removes = config
        .remove_response_headers
        .iter()
        .map(|name| HeaderOp::remove(name));
    let sets = config
        .set_response_headers
        .iter()
        .map(|h| HeaderOp::set(&h.name, &h.value));
    let adds = config
        .add_response_headers
        .iter()
        .map(|h| HeaderOp::add(&h.name, &h.value));

    removes.chain(sets).chain(adds).collect()
}

/// Apply operations in order.
pub fn apply_all(ops: &[HeaderOp], headers: &mut HeaderMap) {
    for op in ops {
        op.apply(headers);
    }
}

fn parse_name(name: &str) -> Result<HeaderName, RouteErrorKind> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| RouteErrorKind::InvalidHeaderName(name.to_string()))
}

fn parse_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), RouteErrorKind> {
    let name = parse_name(name)?;
    let value = HeaderValue::from_str(value)
        .map_err(|_| RouteErrorKind::InvalidHeaderValue(name.to_string()))?;
    Ok((name, value))
}
