//! Prometheus metrics endpoint.
//!
//! Series are recorded elsewhere: allocation outcomes and reservation
//! settlement in the allocation crate, publish/buffer counters in the broker
//! crate. This handler only renders whatever the installed recorder holds.

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;

/// GET /metrics — renders the Prometheus exposition text.
pub async fn get(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        handle.render(),
    )
}
