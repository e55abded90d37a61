//! Shared identifier types used across the order fulfillment crates.

pub mod types;

pub use types::{LocationId, OrderId, ReservationId, VendorId};
