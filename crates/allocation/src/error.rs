//! Allocation error types.

use common::{OrderId, ReservationId, VendorId};
use domain::DomainError;
use thiserror::Error;

/// How one candidate's reservation trial failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The vendor answered and definitively declined the hold.
    Rejected,

    /// Retries were exhausted against an unreachable location.
    Exhausted,

    /// The inventory circuit was open; no call was attempted.
    CircuitOpen,
}

impl FailureKind {
    /// Returns the kind as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Rejected => "rejected",
            FailureKind::Exhausted => "exhausted",
            FailureKind::CircuitOpen => "circuit_open",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One failed candidate trial, kept in trial order for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFailure {
    /// The vendor that could not take the hold.
    pub vendor_id: VendorId,

    /// How the trial failed.
    pub kind: FailureKind,

    /// Human-readable reason, carried into the failure event.
    pub reason: String,
}

impl std::fmt::Display for CandidateFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "vendor {} ({}): {}", self.vendor_id, self.kind, self.reason)
    }
}

/// Errors that can occur while allocating or settling reservations.
#[derive(Debug, Error)]
pub enum AllocationError {
    /// Every ranked candidate was tried and none accepted the hold.
    #[error("no vendor could fulfill order {order_id}: {} candidates failed", failures.len())]
    AllCandidatesFailed {
        order_id: OrderId,
        failures: Vec<CandidateFailure>,
    },

    /// The catalog produced no candidate with stock on hand.
    #[error("no candidates: {0}")]
    NoCandidates(#[from] selection::SelectionError),

    /// The vendor catalog could not be reached.
    #[error("vendor catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// The inventory collaborator could not complete a required call.
    #[error("inventory service failure: {0}")]
    Inventory(String),

    /// No reservation with this id is known.
    #[error("reservation {0} not found")]
    ReservationNotFound(ReservationId),

    /// Another allocation for the same order is already running.
    #[error("allocation for order {order_id} is already in progress")]
    AllocationInProgress { order_id: OrderId },

    /// The caller cancelled the allocation.
    #[error("allocation for order {order_id} was cancelled")]
    Cancelled { order_id: OrderId },

    /// A domain rule rejected the operation.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// Event payload serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for allocation operations.
pub type Result<T> = std::result::Result<T, AllocationError>;
