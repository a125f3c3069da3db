//! GraphQL endpoint.
//!
//! Sets up:
//! - `POST {path}`: the GraphQL endpoint
//! - `GET {path}`: GraphiQL UI

pub mod schema;

use async_graphql::http::GraphiQLSource;
use axum::{
    extract::State,
    response::Html,
    routing::get,
    Json, Router,
};

pub use schema::{build_schema, Customer, CustomerSchema, QueryRoot};

/// GraphQL routes mounted at `path`, independent of the outer router state.
pub fn routes<S>(path: &str, schema: CustomerSchema) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let ui = GraphiQLSource::build().endpoint(path).finish();

    Router::new()
        .route(
            path,
            get(move || {
                let ui = ui.clone();
                async move { Html(ui) }
            })
            .post(graphql_handler),
        )
        .with_state(schema)
}

async fn graphql_handler(
    State(schema): State<CustomerSchema>,
    Json(request): Json<async_graphql::Request>,
) -> Json<async_graphql::Response> {
    Json(schema.execute(request).await)
}
