//! Order lifecycle events published to the message broker.

use chrono::{DateTime, Utc};
use common::{OrderId, ReservationId, VendorId};
use serde::{Deserialize, Serialize};

/// Events emitted as an order moves through allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    /// Stock was reserved at a vendor for the order.
    Reserved(ReservedData),

    /// No vendor could fulfill the order.
    AllocationFailed(AllocationFailedData),

    /// A pending reservation lapsed without confirmation.
    ReservationExpired(ReservationExpiredData),
}

impl OrderEvent {
    /// Returns the broker subject this event is published on.
    pub fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::Reserved(_) => "order.reserved",
            OrderEvent::AllocationFailed(_) => "order.allocation_failed",
            OrderEvent::ReservationExpired(_) => "order.reservation_expired",
        }
    }

    /// Serializes the event to a JSON value for the wire.
    pub fn payload_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Data for the order.reserved event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservedData {
    /// The order that was allocated.
    pub order_id: OrderId,

    /// The vendor holding the stock.
    pub vendor_id: VendorId,

    /// Reservation reference assigned by the vendor's inventory system.
    pub reservation_id: ReservationId,

    /// When the reservation was placed.
    pub timestamp: DateTime<Utc>,
}

/// Data for the order.allocation_failed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationFailedData {
    /// The order that could not be allocated.
    pub order_id: OrderId,

    /// One failure reason per candidate tried, in trial order.
    pub reasons: Vec<String>,

    /// When allocation gave up.
    pub timestamp: DateTime<Utc>,
}

/// Data for the order.reservation_expired event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationExpiredData {
    /// The order whose hold lapsed.
    pub order_id: OrderId,

    /// The vendor that was holding the stock.
    pub vendor_id: VendorId,

    /// The lapsed reservation.
    pub reservation_id: ReservationId,

    /// When the expiry was detected.
    pub timestamp: DateTime<Utc>,
}

// Convenience constructors for events
impl OrderEvent {
    /// Creates an order.reserved event stamped now.
    pub fn reserved(order_id: OrderId, vendor_id: VendorId, reservation_id: ReservationId) -> Self {
        OrderEvent::Reserved(ReservedData {
            order_id,
            vendor_id,
            reservation_id,
            timestamp: Utc::now(),
        })
    }

    /// Creates an order.allocation_failed event stamped now.
    pub fn allocation_failed(order_id: OrderId, reasons: Vec<String>) -> Self {
        OrderEvent::AllocationFailed(AllocationFailedData {
            order_id,
            reasons,
            timestamp: Utc::now(),
        })
    }

    /// Creates an order.reservation_expired event stamped now.
    pub fn reservation_expired(
        order_id: OrderId,
        vendor_id: VendorId,
        reservation_id: ReservationId,
    ) -> Self {
        OrderEvent::ReservationExpired(ReservationExpiredData {
            order_id,
            vendor_id,
            reservation_id,
            timestamp: Utc::now(),
        })
    }
}
