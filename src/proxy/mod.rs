//! Reverse proxy subsystem.
//!
//! # Data Flow
//! ```text
//! Request<Body>
//!     → dispatcher.rs (match → rewrite → forward → transform)
//!     → upstream.rs (single buffered exchange with the upstream)
//!     → Response<Body> or DispatchError (404 / 400 / 502)
//! ```

pub mod dispatcher;
pub mod upstream;

pub use dispatcher::{DispatchPhase, Dispatcher, Forwarded};
pub use upstream::{HttpUpstream, Upstream, UpstreamRequest, UpstreamResponse};
