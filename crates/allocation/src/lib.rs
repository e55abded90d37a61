//! Order allocation.
//!
//! Coordinates vendor selection and stock reservation for incoming orders:
//! candidates come from the vendor catalog, get ranked by the selection
//! engine, and are tried best-first until one location accepts a hold.
//! Outbound calls run through per-target call guards, and lifecycle events
//! go out through the resilient broker client.

pub mod coordinator;
pub mod error;
pub mod services;
pub mod store;
pub mod sweep;

pub use coordinator::{CoordinatorConfig, ReservationCoordinator};
pub use error::{AllocationError, CandidateFailure, FailureKind, Result};
pub use services::{
    BrokerPublisher, EventPublisher, InMemoryEventPublisher, InMemoryInventoryClient,
    InMemoryVendorCatalog, InventoryClient, ReservationAck, VendorCatalog, VendorListing,
};
pub use store::ReservationStore;
pub use sweep::run_expiry_sweep;
