//! Vendor selection engine.
//!
//! Given the candidate set for an order, produces a deterministic best-first
//! ranking by one of the single-dimension criteria or a weighted composite of
//! distance, cost, rating, and availability.

pub mod engine;
pub mod error;
pub mod weights;

pub use engine::SelectionEngine;
pub use error::{Result, SelectionError};
pub use weights::SelectionWeights;
