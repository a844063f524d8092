//! HTTP API server for timed marketplace bid submission.
//!
//! Exposes the bid endpoint, a health check and Prometheus metrics,
//! with structured logging (tracing) on every request.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::{Clock, SystemClock, TimingGate};
use marketplace::{HttpTransport, MarketplaceError, Transport};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::PurchaseOrchestrator;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::bids::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<T, C>(state: Arc<AppState<T, C>>, metrics_handle: PrometheusHandle) -> Router
where
    T: Transport + Clone + 'static,
    C: Clock + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/start_bot", post(routes::bids::start_bot::<T, C>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Builds the application state around any transport and clock.
pub fn create_state<T, C>(transport: T, clock: C, config: &Config) -> Arc<AppState<T, C>>
where
    T: Transport + Clone,
    C: Clock,
{
    let orchestrator = PurchaseOrchestrator::new(
        transport,
        Arc::new(config.marketplace.clone()),
        TimingGate::new(clock, config.market_offset),
        config.orchestrator.clone(),
    );

    Arc::new(AppState {
        orchestrator,
        default_credential: config.default_credential.clone(),
        default_nds_rate_id: config.nds_rate_id,
        timing: config.timing,
    })
}

/// Creates the production state: HTTPS transport and the system clock.
pub fn create_default_state(
    config: &Config,
) -> Result<Arc<AppState<HttpTransport, SystemClock>>, MarketplaceError> {
    let transport = HttpTransport::new(&config.marketplace)?;
    Ok(create_state(transport, SystemClock, config))
}
