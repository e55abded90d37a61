//! Candidate ranking.

use domain::{SelectionCriteria, VendorCandidate};

use crate::error::{Result, SelectionError};
use crate::weights::SelectionWeights;

/// Ranks vendor candidates for one order.
///
/// Ranking is deterministic for identical input: every float comparison goes
/// through `total_cmp` and ties fall back to distance, then vendor id.
pub struct SelectionEngine {
    weights: SelectionWeights,
}

impl SelectionEngine {
    /// Creates an engine with the given weights.
    pub fn new(weights: SelectionWeights) -> Self {
        Self { weights }
    }

    /// Creates an engine with the default weights.
    pub fn with_defaults() -> Self {
        Self::new(SelectionWeights::default())
    }

    /// Returns the weights in use.
    pub fn weights(&self) -> SelectionWeights {
        self.weights
    }

    /// Orders candidates best-first for the given criterion.
    ///
    /// Candidates with zero available stock are dropped before scoring.
    /// `quantity` feeds the total cost of each candidate; it does not filter.
    pub fn rank(
        &self,
        criteria: SelectionCriteria,
        quantity: u32,
        candidates: Vec<VendorCandidate>,
    ) -> Result<Vec<VendorCandidate>> {
        let mut eligible: Vec<VendorCandidate> = candidates
            .into_iter()
            .filter(|c| c.available_quantity > 0)
            .collect();

        if eligible.is_empty() {
            return Err(SelectionError::NoCandidatesAvailable);
        }

        tracing::debug!(
            criteria = %criteria,
            candidates = eligible.len(),
            "ranking vendor candidates"
        );

        match criteria {
            SelectionCriteria::LowestPrice => {
                eligible.sort_by(|a, b| {
                    a.total_cost(quantity)
                        .cents()
                        .cmp(&b.total_cost(quantity).cents())
                        .then(a.distance_km.total_cmp(&b.distance_km))
                        .then(a.vendor_id.cmp(&b.vendor_id))
                });
            }
            SelectionCriteria::FastestDelivery => {
                eligible.sort_by(|a, b| {
                    a.estimated_delivery_hours
                        .total_cmp(&b.estimated_delivery_hours)
                        .then(a.distance_km.total_cmp(&b.distance_km))
                        .then(a.vendor_id.cmp(&b.vendor_id))
                });
            }
            SelectionCriteria::ClosestDistance => {
                eligible.sort_by(|a, b| {
                    a.distance_km
                        .total_cmp(&b.distance_km)
                        .then(a.vendor_id.cmp(&b.vendor_id))
                });
            }
            SelectionCriteria::HighestRating => {
                eligible.sort_by(|a, b| {
                    b.rating
                        .total_cmp(&a.rating)
                        .then(a.distance_km.total_cmp(&b.distance_km))
                        .then(a.vendor_id.cmp(&b.vendor_id))
                });
            }
            SelectionCriteria::BestOverall => {
                let scores = self.composite_scores(quantity, &eligible);
                let mut scored: Vec<(f64, VendorCandidate)> =
                    scores.into_iter().zip(eligible).collect();
                scored.sort_by(|(sa, a), (sb, b)| {
                    sa.total_cmp(sb)
                        .then(a.distance_km.total_cmp(&b.distance_km))
                        .then(a.vendor_id.cmp(&b.vendor_id))
                });
                eligible = scored.into_iter().map(|(_, c)| c).collect();
            }
        }

        Ok(eligible)
    }

    /// Composite score per candidate; lower is better.
    ///
    /// Each dimension is min-max normalized across this candidate set only,
    /// so scores from different ranking calls are not comparable. Dimensions
    /// where higher raw values are better (rating, availability) are inverted.
    fn composite_scores(&self, quantity: u32, candidates: &[VendorCandidate]) -> Vec<f64> {
        let distances = normalize(candidates.iter().map(|c| c.distance_km).collect());
        let costs = normalize(
            candidates
                .iter()
                .map(|c| c.total_cost(quantity).as_f64())
                .collect(),
        );
        let ratings = normalize(candidates.iter().map(|c| c.rating).collect());
        let availability = normalize(
            candidates
                .iter()
                .map(|c| c.available_quantity as f64)
                .collect(),
        );

        (0..candidates.len())
            .map(|i| {
                self.weights.distance * distances[i]
                    + self.weights.cost * costs[i]
                    + self.weights.quality * (1.0 - ratings[i])
                    + self.weights.availability * (1.0 - availability[i])
            })
            .collect()
    }
}

impl Default for SelectionEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Min-max normalization into [0, 1]; a flat dimension maps to all zeros.
fn normalize(values: Vec<f64>) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if range <= f64::EPSILON {
        return vec![0.0; values.len()];
    }
    values.into_iter().map(|v| (v - min) / range).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{LocationId, VendorId};
    use domain::Money;
    use uuid::Uuid;

    fn vendor(n: u128) -> VendorId {
        VendorId::from(Uuid::from_u128(n))
    }

    fn candidate(
        vendor_id: VendorId,
        price_dollars: i64,
        distance_km: f64,
        rating: f64,
    ) -> VendorCandidate {
        VendorCandidate {
            vendor_id,
            location_id: LocationId::new(),
            distance_km,
            unit_price: Money::from_dollars(price_dollars),
            delivery_fee: Money::zero(),
            surcharge: Money::zero(),
            estimated_delivery_hours: distance_km / 10.0,
            rating,
            available_quantity: 10,
        }
    }

    /// The three-vendor setup: A=$100 at 5km rated 4.5, B=$90 at 20km rated
    /// 4.0, C=$110 at 2km rated 4.8.
    fn abc() -> (VendorId, VendorId, VendorId, Vec<VendorCandidate>) {
        let (a, b, c) = (vendor(1), vendor(2), vendor(3));
        let candidates = vec![
            candidate(a, 100, 5.0, 4.5),
            candidate(b, 90, 20.0, 4.0),
            candidate(c, 110, 2.0, 4.8),
        ];
        (a, b, c, candidates)
    }

    fn ranked_vendors(
        criteria: SelectionCriteria,
        candidates: Vec<VendorCandidate>,
    ) -> Vec<VendorId> {
        SelectionEngine::with_defaults()
            .rank(criteria, 1, candidates)
            .unwrap()
            .into_iter()
            .map(|c| c.vendor_id)
            .collect()
    }

    #[test]
    fn test_lowest_price_orders_by_total_cost() {
        let (a, b, c, candidates) = abc();
        let ranked = ranked_vendors(SelectionCriteria::LowestPrice, candidates);
        assert_eq!(ranked, vec![b, a, c]);
    }

    #[test]
    fn test_closest_distance() {
        let (a, b, c, candidates) = abc();
        let ranked = ranked_vendors(SelectionCriteria::ClosestDistance, candidates);
        assert_eq!(ranked, vec![c, a, b]);
    }

    #[test]
    fn test_highest_rating() {
        let (a, b, c, candidates) = abc();
        let ranked = ranked_vendors(SelectionCriteria::HighestRating, candidates);
        assert_eq!(ranked, vec![c, a, b]);
    }

    #[test]
    fn test_fastest_delivery() {
        let (a, b, c, candidates) = abc();
        let ranked = ranked_vendors(SelectionCriteria::FastestDelivery, candidates);
        assert_eq!(ranked, vec![c, a, b]);
    }

    #[test]
    fn test_best_overall_balances_dimensions() {
        // Normalized by hand: A scores ~0.392, C 0.4, B 0.7.
        let (a, b, c, candidates) = abc();
        let ranked = ranked_vendors(SelectionCriteria::BestOverall, candidates);
        assert_eq!(ranked, vec![a, c, b]);
    }

    #[test]
    fn test_lowest_price_includes_fees() {
        let (a, b) = (vendor(1), vendor(2));
        let mut cheap_unit = candidate(a, 90, 5.0, 4.5);
        cheap_unit.delivery_fee = Money::from_dollars(30);
        let pricier_unit = candidate(b, 100, 5.0, 4.5);

        let ranked = ranked_vendors(SelectionCriteria::LowestPrice, vec![cheap_unit, pricier_unit]);
        // $90 + $30 fee loses to a flat $100.
        assert_eq!(ranked, vec![b, a]);
    }

    #[test]
    fn test_zero_availability_is_excluded() {
        let (a, b, _c, mut candidates) = abc();
        candidates[0].available_quantity = 0;

        let ranked = ranked_vendors(SelectionCriteria::LowestPrice, candidates);
        assert!(!ranked.contains(&a));
        assert_eq!(ranked[0], b);
    }

    #[test]
    fn test_all_unavailable_is_an_error() {
        let (_, _, _, mut candidates) = abc();
        for c in &mut candidates {
            c.available_quantity = 0;
        }

        let result = SelectionEngine::with_defaults().rank(
            SelectionCriteria::LowestPrice,
            1,
            candidates,
        );
        assert!(matches!(result, Err(SelectionError::NoCandidatesAvailable)));
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let result =
            SelectionEngine::with_defaults().rank(SelectionCriteria::BestOverall, 1, vec![]);
        assert!(matches!(result, Err(SelectionError::NoCandidatesAvailable)));
    }

    #[test]
    fn test_price_tie_breaks_on_distance_then_vendor() {
        let (a, b, c) = (vendor(1), vendor(2), vendor(3));
        let candidates = vec![
            candidate(c, 100, 5.0, 4.0),
            candidate(b, 100, 5.0, 4.0),
            candidate(a, 100, 3.0, 4.0),
        ];

        let ranked = ranked_vendors(SelectionCriteria::LowestPrice, candidates);
        // Same price: closer candidate first, then ascending vendor id.
        assert_eq!(ranked, vec![a, b, c]);
    }

    #[test]
    fn test_ranking_is_input_order_independent() {
        let (_, _, _, candidates) = abc();
        let mut reversed = candidates.clone();
        reversed.reverse();

        let forward = ranked_vendors(SelectionCriteria::BestOverall, candidates);
        let backward = ranked_vendors(SelectionCriteria::BestOverall, reversed);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_identical_candidates_normalize_flat() {
        let (a, b) = (vendor(1), vendor(2));
        let candidates = vec![candidate(b, 100, 5.0, 4.5), candidate(a, 100, 5.0, 4.5)];

        // Every dimension is flat; ordering falls through to vendor id.
        let ranked = ranked_vendors(SelectionCriteria::BestOverall, candidates);
        assert_eq!(ranked, vec![a, b]);
    }

    #[test]
    fn test_custom_weights_change_ranking() {
        let distance_only = SelectionEngine::new(SelectionWeights {
            distance: 1.0,
            cost: 0.0,
            quality: 0.0,
            availability: 0.0,
        });
        let (a, b, c, candidates) = abc();

        let ranked: Vec<VendorId> = distance_only
            .rank(SelectionCriteria::BestOverall, 1, candidates)
            .unwrap()
            .into_iter()
            .map(|v| v.vendor_id)
            .collect();
        assert_eq!(ranked, vec![c, a, b]);
    }

    #[test]
    fn test_availability_weight_prefers_deeper_stock() {
        let availability_only = SelectionEngine::new(SelectionWeights {
            distance: 0.0,
            cost: 0.0,
            quality: 0.0,
            availability: 1.0,
        });
        let (a, b) = (vendor(1), vendor(2));
        let mut shallow = candidate(a, 100, 5.0, 4.5);
        shallow.available_quantity = 2;
        let mut deep = candidate(b, 100, 5.0, 4.5);
        deep.available_quantity = 50;

        let ranked: Vec<VendorId> = availability_only
            .rank(SelectionCriteria::BestOverall, 1, vec![shallow, deep])
            .unwrap()
            .into_iter()
            .map(|v| v.vendor_id)
            .collect();
        assert_eq!(ranked, vec![b, a]);
    }
}
