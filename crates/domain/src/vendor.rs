//! Vendor candidates and pricing value objects.

use common::{LocationId, VendorId};
use serde::{Deserialize, Serialize};

/// Money amount represented in cents to avoid floating point issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in cents (e.g., 1000 = $10.00)
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Creates a new Money amount from a dollar value.
    pub fn from_dollars(dollars: i64) -> Self {
        Self {
            cents: dollars * 100,
        }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }

    /// Multiplies by a quantity.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money {
            cents: self.cents * quantity as i64,
        }
    }

    /// The amount as a float, for scoring math only.
    pub fn as_f64(&self) -> f64 {
        self.cents as f64 / 100.0
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-${}.{:02}", (self.cents / 100).abs(), self.cents.abs() % 100)
        } else {
            write!(f, "${}.{:02}", self.cents / 100, self.cents % 100)
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents + rhs.cents,
        }
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents - rhs.cents,
        }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.cents += rhs.cents;
    }
}

/// Computes the urgency surcharge on a delivery fee.
///
/// A multiplier of 1.5 means the delivery fee grows by half; the surcharge is
/// the extra portion only, kept separate from the base fee on the candidate.
pub fn urgency_surcharge(delivery_fee: Money, multiplier: f64) -> Money {
    let extra = delivery_fee.cents() as f64 * (multiplier - 1.0);
    Money::from_cents(extra.round() as i64)
}

/// A vendor/location pairing eligible to fulfill an order.
///
/// Computed per request from the catalog collaborator and never persisted;
/// all metrics are snapshots taken at ranking time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorCandidate {
    /// The vendor offering the stock.
    pub vendor_id: VendorId,

    /// The stocking location the order would ship from.
    pub location_id: LocationId,

    /// Distance from the location to the delivery point, in kilometers.
    pub distance_km: f64,

    /// Price per unit.
    pub unit_price: Money,

    /// Flat delivery fee for this location/delivery pair.
    pub delivery_fee: Money,

    /// Urgency surcharge, zero for non-urgent orders.
    pub surcharge: Money,

    /// Estimated delivery time in hours.
    pub estimated_delivery_hours: f64,

    /// Vendor rating on a 0-5 scale.
    pub rating: f64,

    /// Units available at this location.
    pub available_quantity: u32,
}

impl VendorCandidate {
    /// Total cost to fulfill `quantity` units from this candidate.
    pub fn total_cost(&self, quantity: u32) -> Money {
        self.unit_price.multiply(quantity) + self.delivery_fee + self.surcharge
    }
}
