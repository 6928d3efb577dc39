//! Health check and Prometheus metrics endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend: &'static str,
}

/// GET /health: liveness plus the active storage backend.
pub async fn health<S>(State(state): State<Arc<AppState<S>>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        backend: state.backend,
    })
}

/// GET /metrics: Prometheus text exposition.
pub async fn metrics(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        handle.render(),
    )
}

/// Registers help text for the storefront metrics with the installed recorder.
pub fn describe_metrics() {
    metrics::describe_counter!("orders_created_total", "Orders committed by checkout");
    metrics::describe_counter!(
        "orders_failed_total",
        "Checkouts rejected or rolled back, labelled by error code"
    );
    metrics::describe_histogram!(
        "checkout_duration_seconds",
        metrics::Unit::Seconds,
        "Wall time of successful checkouts"
    );
    metrics::describe_counter!("inventory_reservations_total", "Stock reservations taken");
    metrics::describe_counter!("inventory_releases_total", "Stock reservations returned");
    metrics::describe_counter!("loyalty_points_earned_total", "Points credited to users");
    metrics::describe_counter!("loyalty_points_redeemed_total", "Points spent by users");
}
