//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path, headers)
//!     → router.rs (route lookup, registration order)
//!     → matcher.rs (path pattern + host/method/header conditions)
//!     → Return: RouteMatch (route + path variables) or NoMatch
//!
//! After a match:
//!     rewrite.rs  → upstream path
//!     headers.rs  → response header transform
//!
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → Compile patterns, predicates, header ops
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path
//! - Deterministic: same input always matches same route
//! - First match wins (registration order)

pub mod headers;
pub mod matcher;
pub mod rewrite;
pub mod router;

pub use headers::HeaderOp;
pub use matcher::{Matcher, PathPattern, PathVariables};
pub use rewrite::PathRewrite;
pub use router::{Route, RouteMatch, RouteTable};
