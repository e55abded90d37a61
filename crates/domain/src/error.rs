//! Domain error types.

use thiserror::Error;

use crate::order::ProductId;
use crate::reservation::ReservationState;

/// Errors that can occur when constructing or transitioning domain objects.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An order must contain at least one line item.
    #[error("Order has no line items")]
    EmptyLineItems,

    /// A line item quantity must be at least one.
    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: ProductId, quantity: u32 },

    /// Latitude must be within [-90, 90] and longitude within [-180, 180].
    #[error("Invalid coordinates: lat {lat}, lon {lon}")]
    InvalidCoordinates { lat: f64, lon: f64 },

    /// The reservation state machine forbids the requested transition.
    #[error("Invalid reservation transition: {from} -> {to}")]
    InvalidTransition {
        from: ReservationState,
        to: ReservationState,
    },
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
