//! Admin endpoints: status and the compiled route table.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::routing::RouteTable;

#[derive(Clone)]
pub struct AdminState {
    pub routes: Arc<RouteTable>,
    pub api_key: Arc<str>,
}

pub fn setup_admin_router<S>(state: AdminState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/routes", get(get_routes))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
