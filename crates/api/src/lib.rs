//! HTTP API server for the storefront core.
//!
//! Exposes the cart, order, admin, loyalty and promotion endpoints with
//! structured logging (tracing) and Prometheus metrics. Callers are
//! identified by headers set by the upstream auth proxy (see [`identity`]).

pub mod config;
pub mod error;
pub mod identity;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use domain::LoyaltyConfig;
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::ops::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::ops::health::<S>))
        // Cart
        .route("/cart", get(routes::cart::get::<S>))
        .route("/cart/items", post(routes::cart::add_item::<S>))
        .route(
            "/cart/items/{line_id}",
            patch(routes::cart::set_quantity::<S>).delete(routes::cart::remove_item::<S>),
        )
        // Orders
        .route(
            "/orders",
            post(routes::orders::create::<S>).get(routes::orders::list::<S>),
        )
        .route("/orders/{id}", get(routes::orders::get::<S>))
        // Admin
        .route("/admin/orders", get(routes::admin::list::<S>))
        .route("/admin/orders/{id}", get(routes::admin::get::<S>))
        .route(
            "/admin/orders/{id}/status",
            patch(routes::admin::update_status::<S>),
        )
        .route(
            "/admin/orders/{id}/loyalty",
            post(routes::admin::accrue_loyalty::<S>),
        )
        // Loyalty and promotions
        .route("/loyalty", get(routes::loyalty::status::<S>))
        .route("/loyalty/redeem", post(routes::loyalty::redeem::<S>))
        .route(
            "/promotions/validate",
            post(routes::promotions::validate::<S>),
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

/// Builds the shared state over `store`.
pub fn create_state<S: Store + Clone + 'static>(
    store: S,
    loyalty: LoyaltyConfig,
    backend: &'static str,
) -> Arc<AppState<S>> {
    Arc::new(AppState::new(store, loyalty, backend))
}
