//! Reservation state machine.

use serde::{Deserialize, Serialize};

/// The state of a stock reservation in its lifecycle.
///
/// State transitions:
/// ```text
/// Pending ──┬──► Confirmed
///           ├──► Released
///           └──► Expired
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReservationState {
    /// Stock is held at the vendor, awaiting confirmation or release.
    #[default]
    Pending,

    /// The vendor has acknowledged the reservation (terminal state).
    Confirmed,

    /// The held stock was returned to the vendor (terminal state).
    Released,

    /// The hold lapsed without confirmation (terminal state).
    Expired,
}

impl ReservationState {
    /// Returns true if the reservation can be confirmed in this state.
    pub fn can_confirm(&self) -> bool {
        matches!(self, ReservationState::Pending)
    }

    /// Returns true if the reservation can be released in this state.
    pub fn can_release(&self) -> bool {
        matches!(self, ReservationState::Pending)
    }

    /// Returns true if the reservation can expire in this state.
    pub fn can_expire(&self) -> bool {
        matches!(self, ReservationState::Pending)
    }

    /// Returns true if stock is currently held by this reservation.
    pub fn is_active(&self) -> bool {
        matches!(self, ReservationState::Pending)
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReservationState::Confirmed | ReservationState::Released | ReservationState::Expired
        )
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationState::Pending => "pending",
            ReservationState::Confirmed => "confirmed",
            ReservationState::Released => "released",
            ReservationState::Expired => "expired",
        }
    }
}

impl std::fmt::Display for ReservationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
