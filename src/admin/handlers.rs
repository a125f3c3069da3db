use axum::{extract::State, Json};
use serde::Serialize;

use crate::admin::AdminState;
use crate::routing::Route;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub routes: usize,
}

/// One route as shown by `/admin/routes`.
#[derive(Debug, Serialize)]
pub struct RouteSummary {
    pub id: String,
    pub predicate: String,
    pub uri: String,
    pub filters: Vec<String>,
}

impl From<&Route> for RouteSummary {
    fn from(route: &Route) -> Self {
        let predicate = if route.predicate.is_empty() {
            route.path.to_string()
        } else {
            format!("{} && {}", route.path, route.predicate)
        };

        let filters = std::iter::once(route.rewrite.to_string())
            .chain(route.response_headers.iter().map(ToString::to_string))
            .collect();

        Self {
            id: route.id.clone(),
            predicate,
            uri: route.upstream.to_string(),
            filters,
        }
    }
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        routes: state.routes.len(),
    })
}

pub async fn get_routes(State(state): State<AdminState>) -> Json<Vec<RouteSummary>> {
    Json(state.routes.routes().iter().map(RouteSummary::from).collect())
}
