//! Scoring weights for the composite ranking.

use serde::{Deserialize, Serialize};

/// Relative importance of each scoring dimension.
///
/// Weights are applied as-is; callers overriding the defaults are expected
/// to keep them summing to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionWeights {
    /// Weight on distance from the delivery point (lower is better).
    pub distance: f64,

    /// Weight on total cost (lower is better).
    pub cost: f64,

    /// Weight on vendor rating (higher is better).
    pub quality: f64,

    /// Weight on available stock (higher is better).
    pub availability: f64,
}

impl Default for SelectionWeights {
    fn default() -> Self {
        Self {
            distance: 0.4,
            cost: 0.3,
            quality: 0.2,
            availability: 0.1,
        }
    }
}
