//! Path rewriting applied between matching and forwarding.

use std::fmt;

use crate::routing::matcher::PathVariables;

/// How the matched path is turned into the upstream path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PathRewrite {
    /// Forward the original path.
    #[default]
    Keep,
    /// Replace the path. `{name}` placeholders are filled from the pattern's
    /// captured variables; unknown placeholders are kept verbatim.
    Set(String),
    /// Drop the first `n` path segments.
    StripPrefix(usize),
}

impl PathRewrite {
    pub fn apply(&self, path: &str, variables: &PathVariables) -> String {
        match self {
            PathRewrite::Keep => path.to_string(),
            PathRewrite::Set(template) => expand(template, variables),
            PathRewrite::StripPrefix(n) => strip_segments(path, *n),
        }
    }
}

impl fmt::Display for PathRewrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathRewrite::Keep => write!(f, "KeepPath"),
            PathRewrite::Set(template) => write!(f, "SetPath={}", template),
            PathRewrite::StripPrefix(n) => write!(f, "StripPrefix={}", n),
        }
    }
}

fn expand(template: &str, variables: &PathVariables) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match tail.find('}') {
            Some(end) => {
                let name = &tail[1..end];
                match variables.get(name) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&tail[..=end]),
                }
                rest = &tail[end + 1..];
            }
            None => {
                out.push_str(tail);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn strip_segments(path: &str, n: usize) -> String {
    let remaining: Vec<&str> = path.split('/').skip(1).skip(n).collect();
    format!("/{}", remaining.join("/"))
}
