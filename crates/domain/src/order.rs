//! Orders, line items, and vendor-selection criteria.

use common::OrderId;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};
use crate::geo::GeoPoint;

/// Product identifier (SKU).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Creates a new product ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the product ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ProductId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A single ordered product with its variant and quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// The product identifier.
    pub product_id: ProductId,

    /// Product variant label (e.g. "12kg").
    pub size: String,

    /// Quantity ordered.
    pub quantity: u32,
}

impl LineItem {
    /// Creates a new line item.
    pub fn new(product_id: impl Into<ProductId>, size: impl Into<String>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            size: size.into(),
            quantity,
        }
    }
}

/// How vendors are ranked for an order.
///
/// The single-dimension criteria sort on one metric directly; `BestOverall`
/// combines distance, cost, quality, and availability with configurable weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SelectionCriteria {
    /// Lowest total cost (unit price, delivery fee, surcharge) first.
    LowestPrice,

    /// Shortest estimated delivery time first.
    FastestDelivery,

    /// Shortest distance to the delivery location first.
    ClosestDistance,

    /// Highest vendor rating first.
    HighestRating,

    /// Weighted multi-criteria score.
    #[default]
    BestOverall,
}

impl SelectionCriteria {
    /// Returns the criterion name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionCriteria::LowestPrice => "lowest_price",
            SelectionCriteria::FastestDelivery => "fastest_delivery",
            SelectionCriteria::ClosestDistance => "closest_distance",
            SelectionCriteria::HighestRating => "highest_rating",
            SelectionCriteria::BestOverall => "best_overall",
        }
    }
}

impl std::fmt::Display for SelectionCriteria {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SelectionCriteria {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "lowest_price" => Ok(SelectionCriteria::LowestPrice),
            "fastest_delivery" => Ok(SelectionCriteria::FastestDelivery),
            "closest_distance" => Ok(SelectionCriteria::ClosestDistance),
            "highest_rating" => Ok(SelectionCriteria::HighestRating),
            "best_overall" => Ok(SelectionCriteria::BestOverall),
            other => Err(format!("unknown selection criteria: {other}")),
        }
    }
}

/// A buyer order awaiting vendor selection and stock reservation.
///
/// Orders are immutable once a reservation has been accepted for them;
/// the coordinator owns that lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// The order identifier.
    pub id: OrderId,

    /// Ordered line items; never empty.
    pub items: Vec<LineItem>,

    /// Where the order is to be delivered.
    pub delivery_location: GeoPoint,

    /// Urgent orders carry a delivery surcharge and prefer faster fulfillment.
    pub urgent: bool,

    /// How candidate vendors are ranked for this order.
    pub criteria: SelectionCriteria,
}

impl Order {
    /// Creates a new order, validating that it has at least one line item
    /// and that every quantity is positive.
    pub fn new(
        items: Vec<LineItem>,
        delivery_location: GeoPoint,
        urgent: bool,
        criteria: SelectionCriteria,
    ) -> Result<Self> {
        if items.is_empty() {
            return Err(DomainError::EmptyLineItems);
        }
        for item in &items {
            if item.quantity == 0 {
                return Err(DomainError::InvalidQuantity {
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                });
            }
        }

        Ok(Self {
            id: OrderId::new(),
            items,
            delivery_location,
            urgent,
            criteria,
        })
    }

    /// Total quantity across all line items.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}
