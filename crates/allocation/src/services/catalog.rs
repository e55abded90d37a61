//! Vendor catalog collaborator.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{LocationId, VendorId};
use domain::{GeoPoint, Money, Order, VendorCandidate, urgency_surcharge};
use resilience::CallError;

/// Looks up which vendor locations could fulfill an order.
///
/// Implementations classify their failures through [`CallError`] so the
/// coordinator's call guard knows what to retry.
#[async_trait]
pub trait VendorCatalog: Send + Sync {
    /// Returns the candidate set for the order, with distances and
    /// urgency surcharges already computed against its delivery location.
    async fn candidates_for(&self, order: &Order) -> std::result::Result<Vec<VendorCandidate>, CallError>;
}

/// A vendor location as the in-memory catalog knows it.
#[derive(Debug, Clone)]
pub struct VendorListing {
    pub vendor_id: VendorId,
    pub location_id: LocationId,
    pub location: GeoPoint,
    pub unit_price: Money,
    pub delivery_fee: Money,
    pub estimated_delivery_hours: f64,
    pub rating: f64,
    pub available_quantity: u32,
}

/// In-memory vendor catalog for tests and local runs.
#[derive(Clone)]
pub struct InMemoryVendorCatalog {
    state: Arc<RwLock<CatalogState>>,
}

struct CatalogState {
    listings: Vec<VendorListing>,
    urgency_multiplier: f64,
    fail_on_lookup: bool,
    lookups: u32,
}

impl InMemoryVendorCatalog {
    /// Creates an empty catalog with a 1.5x urgency multiplier.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(CatalogState {
                listings: Vec::new(),
                urgency_multiplier: 1.5,
                fail_on_lookup: false,
                lookups: 0,
            })),
        }
    }

    /// Adds a vendor location to the catalog.
    pub fn add_listing(&self, listing: VendorListing) {
        self.state.write().unwrap().listings.push(listing);
    }

    /// Sets the delivery fee multiplier applied to urgent orders.
    pub fn set_urgency_multiplier(&self, multiplier: f64) {
        self.state.write().unwrap().urgency_multiplier = multiplier;
    }

    /// Makes subsequent lookups fail with a transient error.
    pub fn set_fail_on_lookup(&self, fail: bool) {
        self.state.write().unwrap().fail_on_lookup = fail;
    }

    /// Number of lookups performed, including failed ones.
    pub fn lookup_count(&self) -> u32 {
        self.state.read().unwrap().lookups
    }
}

impl Default for InMemoryVendorCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VendorCatalog for InMemoryVendorCatalog {
    async fn candidates_for(&self, order: &Order) -> std::result::Result<Vec<VendorCandidate>, CallError> {
        let mut state = self.state.write().unwrap();
        state.lookups += 1;
        if state.fail_on_lookup {
            return Err(CallError::Transient("catalog lookup timed out".to_string()));
        }

        let multiplier = state.urgency_multiplier;
        let candidates = state
            .listings
            .iter()
            .map(|listing| {
                let surcharge = if order.urgent {
                    urgency_surcharge(listing.delivery_fee, multiplier)
                } else {
                    Money::zero()
                };
                VendorCandidate {
                    vendor_id: listing.vendor_id,
                    location_id: listing.location_id,
                    distance_km: order.delivery_location.distance_km(&listing.location),
                    unit_price: listing.unit_price,
                    delivery_fee: listing.delivery_fee,
                    surcharge,
                    estimated_delivery_hours: listing.estimated_delivery_hours,
                    rating: listing.rating,
                    available_quantity: listing.available_quantity,
                }
            })
            .collect();
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{LineItem, SelectionCriteria};

    fn lagos() -> GeoPoint {
        GeoPoint::new(6.5244, 3.3792).unwrap()
    }

    fn listing_at(location: GeoPoint) -> VendorListing {
        VendorListing {
            vendor_id: VendorId::new(),
            location_id: LocationId::new(),
            location,
            unit_price: Money::from_cents(10_000),
            delivery_fee: Money::from_cents(1_000),
            estimated_delivery_hours: 24.0,
            rating: 4.5,
            available_quantity: 10,
        }
    }

    fn order(urgent: bool) -> Order {
        Order::new(
            vec![LineItem::new("GAS-12KG", "12kg", 2)],
            lagos(),
            urgent,
            SelectionCriteria::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_computes_distance_from_delivery_location() {
        let catalog = InMemoryVendorCatalog::new();
        catalog.add_listing(listing_at(lagos()));
        // One degree of latitude north, roughly 111 km away.
        catalog.add_listing(listing_at(GeoPoint::new(7.5244, 3.3792).unwrap()));

        let candidates = catalog.candidates_for(&order(false)).await.unwrap();

        assert!(candidates[0].distance_km < 0.001);
        assert!((candidates[1].distance_km - 111.2).abs() < 1.0);
    }

    #[tokio::test]
    async fn test_urgent_orders_carry_surcharge() {
        let catalog = InMemoryVendorCatalog::new();
        catalog.add_listing(listing_at(lagos()));

        let plain = catalog.candidates_for(&order(false)).await.unwrap();
        assert!(plain[0].surcharge.is_zero());

        // 1.5x multiplier on a $10.00 fee adds $5.00.
        let urgent = catalog.candidates_for(&order(true)).await.unwrap();
        assert_eq!(urgent[0].surcharge, Money::from_cents(500));
    }

    #[tokio::test]
    async fn test_lookup_failure_is_transient() {
        let catalog = InMemoryVendorCatalog::new();
        catalog.set_fail_on_lookup(true);

        let result = catalog.candidates_for(&order(false)).await;

        assert!(matches!(result, Err(CallError::Transient(_))));
        assert_eq!(catalog.lookup_count(), 1);
    }
}
