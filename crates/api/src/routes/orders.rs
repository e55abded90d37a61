//! Order intake endpoint.

use std::sync::Arc;

use allocation::{BrokerPublisher, InMemoryInventoryClient, InMemoryVendorCatalog, ReservationCoordinator};
use axum::Json;
use axum::extract::State;
use broker::{BrokerClient, BrokerTransport};
use domain::{GeoPoint, LineItem, Order, Reservation, SelectionCriteria};
use resilience::GuardRegistry;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::ApiError;

/// Coordinator wiring used by the API: in-memory collaborator clients
/// over a pluggable broker transport.
pub type ApiCoordinator<T> =
    ReservationCoordinator<InMemoryVendorCatalog, InMemoryInventoryClient, BrokerPublisher<T>>;

/// Shared application state accessible from all handlers.
pub struct AppState<T: BrokerTransport> {
    pub coordinator: Arc<ApiCoordinator<T>>,
    pub broker: BrokerClient<T>,
    pub guards: Arc<GuardRegistry>,
    /// Cancelled on shutdown; aborts in-flight allocations.
    pub shutdown: CancellationToken,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemRequest>,
    pub delivery_location: LocationRequest,
    #[serde(default)]
    pub urgent: bool,
    #[serde(default)]
    pub criteria: SelectionCriteria,
}

#[derive(Deserialize)]
pub struct OrderItemRequest {
    pub product_id: String,
    pub size: String,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct LocationRequest {
    pub lat: f64,
    pub lon: f64,
}

// -- Response types --

#[derive(Serialize)]
pub struct ReservationResponse {
    pub reservation_id: String,
    pub order_id: String,
    pub vendor_id: String,
    pub location_id: String,
    pub quantity: u32,
    pub state: String,
    pub reserved_at: String,
    pub expires_at: String,
}

pub(crate) fn reservation_response(reservation: &Reservation) -> ReservationResponse {
    ReservationResponse {
        reservation_id: reservation.id().to_string(),
        order_id: reservation.order_id().to_string(),
        vendor_id: reservation.vendor_id().to_string(),
        location_id: reservation.location_id().to_string(),
        quantity: reservation.quantity(),
        state: reservation.state().to_string(),
        reserved_at: reservation.reserved_at().to_rfc3339(),
        expires_at: reservation.expires_at().to_rfc3339(),
    }
}

// -- Handlers --

/// POST /orders — place an order and allocate stock for it.
///
/// Ranks the vendors able to serve the order and returns the reservation
/// placed with the best one.
#[tracing::instrument(skip(state, req))]
pub async fn create<T: BrokerTransport>(
    State(state): State<Arc<AppState<T>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(axum::http::StatusCode, Json<ReservationResponse>), ApiError> {
    let delivery_location = GeoPoint::new(req.delivery_location.lat, req.delivery_location.lon)?;

    let items: Vec<LineItem> = req
        .items
        .into_iter()
        .map(|item| LineItem::new(item.product_id, item.size, item.quantity))
        .collect();

    let order = Order::new(items, delivery_location, req.urgent, req.criteria)?;
    let reservation = state.coordinator.allocate(&order, &state.shutdown).await?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(reservation_response(&reservation)),
    ))
}
