//! Collaborator seams and their in-memory implementations.

pub mod catalog;
pub mod inventory;
pub mod publisher;

pub use catalog::{InMemoryVendorCatalog, VendorCatalog, VendorListing};
pub use inventory::{InMemoryInventoryClient, InventoryClient, ReservationAck};
pub use publisher::{BrokerPublisher, EventPublisher, InMemoryEventPublisher};
