//! HTTP adapter for the order engine.
//!
//! Exposes the lifecycle, stock, refund and timeout operations as REST
//! endpoints with structured logging (tracing) and Prometheus metrics.
//! Transport stays mechanical: handlers bind requests, call one engine
//! operation and map the error taxonomy onto status codes.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use engine::{
    EngineConfig, InMemoryProductCatalog, InMemoryUserDirectory, OrderLifecycle, RefundWorkflow,
    ReservationTracker, TimeoutDispatcher, TokioSpawner,
};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Stores;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create))
        .route("/orders", get(routes::orders::list))
        .route("/orders/stats", get(routes::orders::stats))
        .route("/orders/{order_no}", get(routes::orders::get))
        .route("/orders/{order_no}/pay", post(routes::orders::pay))
        .route("/orders/{order_no}/cancel", post(routes::orders::cancel))
        .route("/orders/{order_no}/ship", post(routes::orders::ship))
        .route("/orders/{order_no}/receipt", post(routes::orders::receipt))
        .route("/stock/reserve", post(routes::stock::reserve))
        .route("/stock/release", post(routes::stock::release))
        .route("/stock/confirm", post(routes::stock::confirm))
        .route("/refunds", post(routes::refunds::apply))
        .route("/refunds/{refund_no}/process", post(routes::refunds::process))
        .route("/timeouts/process", post(routes::timeouts::process))
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

/// Wires the engine services over in-memory stores and collaborator
/// doubles. Returns the clients alongside the state so callers (the
/// binary, tests) can seed catalog and directory data.
pub fn create_default_state() -> (Arc<AppState>, InMemoryProductCatalog, InMemoryUserDirectory) {
    let stores = Stores::in_memory();
    let catalog = InMemoryProductCatalog::new();
    let users = InMemoryUserDirectory::new();
    let config = EngineConfig::default();

    let tracker = ReservationTracker::new(
        stores.clone(),
        Arc::new(catalog.clone()),
        config.clone(),
    );
    let lifecycle = OrderLifecycle::new(
        stores.clone(),
        tracker.clone(),
        Arc::new(catalog.clone()),
        Arc::new(users.clone()),
        Arc::new(TokioSpawner::new()),
        config,
    );
    let dispatcher = TimeoutDispatcher::new(stores.clone(), lifecycle.clone());
    let refunds = RefundWorkflow::new(stores);

    let state = Arc::new(AppState {
        lifecycle,
        tracker,
        dispatcher,
        refunds,
    });

    (state, catalog, users)
}
