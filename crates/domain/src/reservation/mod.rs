//! Stock reservation record and its lifecycle.

mod state;

pub use state::ReservationState;

use chrono::{DateTime, Duration, Utc};
use common::{LocationId, OrderId, ReservationId, VendorId};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};
use crate::order::LineItem;

/// A stock hold placed against a vendor location for a single order.
///
/// The hold starts out pending and moves to exactly one of the terminal
/// states; the vendor, location, and held items never change after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    /// Identifier assigned by the vendor's inventory system.
    id: ReservationId,

    /// The order this hold belongs to.
    order_id: OrderId,

    /// The vendor holding the stock.
    vendor_id: VendorId,

    /// The vendor location the stock is held at.
    location_id: LocationId,

    /// The items and quantities held.
    items: Vec<LineItem>,

    /// Current lifecycle state.
    state: ReservationState,

    /// When the hold was placed.
    reserved_at: DateTime<Utc>,

    /// When a still-pending hold lapses.
    expires_at: DateTime<Utc>,
}

// Query methods
impl Reservation {
    /// Returns the reservation identifier.
    pub fn id(&self) -> &ReservationId {
        &self.id
    }

    /// Returns the order this reservation belongs to.
    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    /// Returns the vendor holding the stock.
    pub fn vendor_id(&self) -> VendorId {
        self.vendor_id
    }

    /// Returns the vendor location the stock is held at.
    pub fn location_id(&self) -> LocationId {
        self.location_id
    }

    /// Returns the held items.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Returns the total number of units held across all items.
    pub fn quantity(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Returns the current state.
    pub fn state(&self) -> ReservationState {
        self.state
    }

    /// Returns when the hold was placed.
    pub fn reserved_at(&self) -> DateTime<Utc> {
        self.reserved_at
    }

    /// Returns when a still-pending hold lapses.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns true if the hold is pending and its deadline has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.state.is_active() && now >= self.expires_at
    }
}

// Transition methods
impl Reservation {
    /// Creates a new pending reservation expiring `ttl` from now.
    pub fn pending(
        id: ReservationId,
        order_id: OrderId,
        vendor_id: VendorId,
        location_id: LocationId,
        items: Vec<LineItem>,
        ttl: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            order_id,
            vendor_id,
            location_id,
            items,
            state: ReservationState::Pending,
            reserved_at: now,
            expires_at: now + ttl,
        }
    }

    /// Marks the reservation confirmed after the vendor acknowledged it.
    pub fn confirm(&mut self) -> Result<()> {
        if !self.state.can_confirm() {
            return Err(DomainError::InvalidTransition {
                from: self.state,
                to: ReservationState::Confirmed,
            });
        }
        self.state = ReservationState::Confirmed;
        Ok(())
    }

    /// Marks the held stock as returned to the vendor.
    pub fn release(&mut self) -> Result<()> {
        if !self.state.can_release() {
            return Err(DomainError::InvalidTransition {
                from: self.state,
                to: ReservationState::Released,
            });
        }
        self.state = ReservationState::Released;
        Ok(())
    }

    /// Marks a pending hold as lapsed.
    pub fn expire(&mut self) -> Result<()> {
        if !self.state.can_expire() {
            return Err(DomainError::InvalidTransition {
                from: self.state,
                to: ReservationState::Expired,
            });
        }
        self.state = ReservationState::Expired;
        Ok(())
    }
}
