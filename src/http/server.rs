//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Mount GraphQL and admin routes ahead of the proxy fallback
//! - Wire up middleware (tracing, timeout, body limit, request ID)
//! - Dispatch everything else to the proxy
//! - Observability (metrics, correlation IDs)

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, Semaphore};
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin::{setup_admin_router, AdminState};
use crate::config::loader::ConfigError;
use crate::config::validation::validate_config;
use crate::config::GatewayConfig;
use crate::error::{DispatchError, GatewayResult};
use crate::graphql;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::observability::metrics;
use crate::proxy::{Dispatcher, HttpUpstream};
use crate::routing::RouteTable;

/// Application state injected into the proxy handler.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher<HttpUpstream>>,
    /// Bounds the number of proxied requests in flight.
    pub in_flight: Arc<Semaphore>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    in_flight: Arc<Semaphore>,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// The configuration is validated first, so values that axum or tokio
    /// would reject surface as errors instead of panics.
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let routes = Arc::new(RouteTable::from_config(&config.routes)?);
        let upstream = HttpUpstream::new(&config.timeouts)?;
        let dispatcher = Dispatcher::new(routes.clone(), upstream, config.security.max_body_size);

        for route in routes.routes() {
            tracing::info!(route = %route.id, path = %route.path.as_str(), upstream = %route.upstream, "Route registered");
        }

        let in_flight = Arc::new(Semaphore::new(config.listener.max_connections));
        let state = AppState {
            dispatcher: Arc::new(dispatcher),
            in_flight: in_flight.clone(),
        };

        let router = Self::build_router(&config, state, routes);
        Ok(Self {
            router,
            in_flight,
            config,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState, routes: Arc<RouteTable>) -> Router {
        let mut router = Router::new();

        if config.graphql.enabled {
            router = router.merge(graphql::routes(&config.graphql.path, graphql::build_schema()));
        }
        if config.admin.enabled {
            router = router.merge(setup_admin_router(AdminState {
                routes,
                api_key: Arc::from(config.admin.api_key.as_str()),
            }));
        }

        router
            .fallback(proxy_handler)
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// The assembled application, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    ///
    /// Requests still queued for a permit at that point are answered with 503.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let in_flight = self.in_flight;
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                in_flight.close();
                tracing::info!("Draining in-flight requests");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Proxy fallback handler: everything not served locally.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();

    let _permit = match state.in_flight.acquire().await {
        Ok(permit) => permit,
        Err(_) => {
            let err = DispatchError::ShuttingDown;
            metrics::record_request(&method, err.status().as_u16(), "none", start_time);
            return err.into_response();
        }
    };

    match state.dispatcher.dispatch(request).await {
        Ok(forwarded) => {
            metrics::record_request(
                &method,
                forwarded.response.status().as_u16(),
                &forwarded.route_id,
                start_time,
            );
            forwarded.response
        }
        Err(e) => {
            metrics::record_request(
                &method,
                e.status().as_u16(),
                e.route_id().unwrap_or("none"),
                start_time,
            );
            e.into_response()
        }
    }
}
