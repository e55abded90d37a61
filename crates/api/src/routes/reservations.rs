//! Reservation lookup and settlement endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use broker::BrokerTransport;
use common::ReservationId;

use crate::error::ApiError;
use crate::routes::orders::{AppState, ReservationResponse, reservation_response};

/// GET /reservations/:id — look up a reservation by ID.
#[tracing::instrument(skip(state))]
pub async fn get<T: BrokerTransport>(
    State(state): State<Arc<AppState<T>>>,
    Path(id): Path<String>,
) -> Result<Json<ReservationResponse>, ApiError> {
    let reservation_id = ReservationId::new(id);
    let reservation = state
        .coordinator
        .reservation(&reservation_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Reservation {reservation_id} not found")))?;

    Ok(Json(reservation_response(&reservation)))
}

/// POST /reservations/:id/release — return the held stock to the vendor.
///
/// Releasing an already-settled reservation returns its current state
/// unchanged, so retries are safe.
#[tracing::instrument(skip(state))]
pub async fn release<T: BrokerTransport>(
    State(state): State<Arc<AppState<T>>>,
    Path(id): Path<String>,
) -> Result<Json<ReservationResponse>, ApiError> {
    let reservation = state.coordinator.release(&ReservationId::new(id)).await?;
    Ok(Json(reservation_response(&reservation)))
}

/// POST /reservations/:id/confirm — commit the hold after the vendor's
/// acknowledgement.
#[tracing::instrument(skip(state))]
pub async fn confirm<T: BrokerTransport>(
    State(state): State<Arc<AppState<T>>>,
    Path(id): Path<String>,
) -> Result<Json<ReservationResponse>, ApiError> {
    let reservation = state.coordinator.confirm(&ReservationId::new(id)).await?;
    Ok(Json(reservation_response(&reservation)))
}
