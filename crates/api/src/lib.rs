//! HTTP API server for the order allocation system.
//!
//! Provides REST endpoints for placing orders and settling reservations,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use broker::{BrokerClient, BrokerTransport};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<T: BrokerTransport>(
    state: Arc<AppState<T>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<T>))
        .route("/orders", post(routes::orders::create::<T>))
        .route("/reservations/{id}", get(routes::reservations::get::<T>))
        .route(
            "/reservations/{id}/release",
            post(routes::reservations::release::<T>),
        )
        .route(
            "/reservations/{id}/confirm",
            post(routes::reservations::confirm::<T>),
        )
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

/// Creates the default application state over the given broker transport.
///
/// The catalog and inventory handles are returned alongside the state so
/// callers can seed vendor listings and script inventory behavior.
pub fn create_default_state<T: BrokerTransport>(
    transport: T,
    config: &config::Config,
) -> (
    Arc<AppState<T>>,
    allocation::InMemoryVendorCatalog,
    allocation::InMemoryInventoryClient,
) {
    use allocation::{BrokerPublisher, CoordinatorConfig, ReservationCoordinator};
    use resilience::GuardRegistry;
    use selection::SelectionEngine;
    use tokio_util::sync::CancellationToken;

    let broker = BrokerClient::new(transport, config.broker.clone());
    let guards = Arc::new(GuardRegistry::new(config.guard.clone()));
    let catalog = allocation::InMemoryVendorCatalog::new();
    let inventory = allocation::InMemoryInventoryClient::new();

    let coordinator = ReservationCoordinator::new(
        catalog.clone(),
        inventory.clone(),
        BrokerPublisher::new(broker.clone()),
        SelectionEngine::new(config.weights),
        guards.clone(),
        CoordinatorConfig {
            reservation_ttl: config.reservation_ttl,
        },
    );

    let state = Arc::new(AppState {
        coordinator: Arc::new(coordinator),
        broker,
        guards,
        shutdown: CancellationToken::new(),
    });

    (state, catalog, inventory)
}
