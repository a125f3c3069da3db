//! HTTP gateway: a declarative reverse proxy alongside a GraphQL endpoint.

pub mod admin;
pub mod client;
pub mod config;
pub mod error;
pub mod graphql;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod routing;

pub use config::schema::GatewayConfig;
pub use error::{DispatchError, GatewayError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
