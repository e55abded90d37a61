//! Health check endpoint.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use broker::{BrokerTransport, ConnectionState};
use resilience::CircuitState;
use serde::Serialize;

use crate::routes::orders::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub dependencies: Dependencies,
}

#[derive(Serialize)]
pub struct Dependencies {
    pub broker: BrokerHealth,
    pub circuits: BTreeMap<String, &'static str>,
}

#[derive(Serialize)]
pub struct BrokerHealth {
    pub state: ConnectionState,
    pub pending_events: usize,
    pub evicted_events: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// GET /health — returns system health with dependency detail.
///
/// A broker outage or an open circuit reports as `degraded`, not as a
/// failure: the server keeps taking orders and buffers events while the
/// broker reconnects, so the response status stays 200.
pub async fn check<T: BrokerTransport>(
    State(state): State<Arc<AppState<T>>>,
) -> Json<HealthResponse> {
    let broker = state.broker.status().await;
    let circuits = state.guards.circuit_states().await;

    let any_open = circuits
        .iter()
        .any(|(_, circuit)| *circuit == CircuitState::Open);
    let status = if broker.state.is_connected() && !any_open {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        dependencies: Dependencies {
            broker: BrokerHealth {
                state: broker.state,
                pending_events: broker.pending_count,
                evicted_events: broker.evicted_count,
                last_error: broker.last_error,
            },
            circuits: circuits
                .into_iter()
                .map(|(target, circuit)| (target, circuit.as_str()))
                .collect(),
        },
    })
}
