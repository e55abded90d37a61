//! Domain model for the order fulfillment system.
//!
//! This crate provides the core domain types:
//! - Order and line items with a vendor-selection criterion
//! - VendorCandidate, the transient per-request view of a vendor/location
//! - Reservation with its lifecycle state machine
//! - Domain events published over the message broker
//! - Geographic coordinates and great-circle distance

pub mod error;
pub mod events;
pub mod geo;
pub mod order;
pub mod reservation;
pub mod vendor;

pub use error::DomainError;
pub use events::{AllocationFailedData, OrderEvent, ReservationExpiredData, ReservedData};
pub use geo::GeoPoint;
pub use order::{LineItem, Order, ProductId, SelectionCriteria};
pub use reservation::{Reservation, ReservationState};
pub use vendor::{Money, VendorCandidate, urgency_surcharge};
