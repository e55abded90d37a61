//! Inventory collaborator client.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{LocationId, OrderId, ReservationId};
use domain::LineItem;
use resilience::CallError;

/// Acknowledgement returned by the inventory collaborator for a new hold.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationAck {
    /// Reservation reference assigned by the collaborator.
    pub reservation_id: ReservationId,
}

/// Stock operations against vendor inventory.
///
/// The collaborator is the system of record for stock counts. Failures are
/// classified through [`CallError`]: a definitive rejection (insufficient
/// stock, unknown location) must not be retried, a transient one may be.
#[async_trait]
pub trait InventoryClient: Send + Sync {
    /// Places a hold for the order's items at the given location.
    async fn reserve(
        &self,
        location_id: LocationId,
        order_id: OrderId,
        items: &[LineItem],
    ) -> std::result::Result<ReservationAck, CallError>;

    /// Releases a hold. Releasing an unknown hold succeeds.
    async fn release(&self, reservation_id: &ReservationId) -> std::result::Result<(), CallError>;

    /// Commits a pending hold.
    async fn confirm(&self, reservation_id: &ReservationId) -> std::result::Result<(), CallError>;
}

/// Scripted reserve outcome for one location.
#[derive(Debug, Clone)]
enum ReserveScript {
    Accept,
    Reject(String),
    Transient(String),
}

#[derive(Debug)]
struct Hold {
    order_id: OrderId,
    quantity: u32,
    confirmed: bool,
}

/// In-memory inventory client for tests and local runs.
///
/// Reserve outcomes are scripted per location and default to accepting;
/// accepted holds are kept so tests can assert on what the collaborator
/// would be holding.
#[derive(Clone)]
pub struct InMemoryInventoryClient {
    state: Arc<RwLock<InventoryState>>,
}

#[derive(Default)]
struct InventoryState {
    scripts: HashMap<LocationId, ReserveScript>,
    holds: HashMap<ReservationId, Hold>,
    reserve_calls: HashMap<LocationId, u32>,
    next_id: u32,
    fail_on_confirm: bool,
    fail_on_release: bool,
}

impl InMemoryInventoryClient {
    /// Creates a client that accepts every reservation.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(InventoryState::default())),
        }
    }

    /// Scripts the location to decline every reserve with the reason.
    pub fn set_reject_at(&self, location_id: LocationId, reason: &str) {
        self.state
            .write()
            .unwrap()
            .scripts
            .insert(location_id, ReserveScript::Reject(reason.to_string()));
    }

    /// Scripts the location to fail every reserve transiently.
    pub fn set_transient_at(&self, location_id: LocationId, reason: &str) {
        self.state
            .write()
            .unwrap()
            .scripts
            .insert(location_id, ReserveScript::Transient(reason.to_string()));
    }

    /// Restores the accepting behavior for the location.
    pub fn set_accept_at(&self, location_id: LocationId) {
        self.state
            .write()
            .unwrap()
            .scripts
            .insert(location_id, ReserveScript::Accept);
    }

    /// Makes confirm calls fail transiently.
    pub fn set_fail_on_confirm(&self, fail: bool) {
        self.state.write().unwrap().fail_on_confirm = fail;
    }

    /// Makes release calls fail transiently.
    pub fn set_fail_on_release(&self, fail: bool) {
        self.state.write().unwrap().fail_on_release = fail;
    }

    /// Number of holds currently placed.
    pub fn hold_count(&self) -> usize {
        self.state.read().unwrap().holds.len()
    }

    /// Number of holds placed for the order.
    pub fn holds_for_order(&self, order_id: OrderId) -> usize {
        self.state
            .read()
            .unwrap()
            .holds
            .values()
            .filter(|h| h.order_id == order_id)
            .count()
    }

    /// Units held under the reservation, if it exists.
    pub fn hold_quantity(&self, reservation_id: &ReservationId) -> Option<u32> {
        self.state
            .read()
            .unwrap()
            .holds
            .get(reservation_id)
            .map(|h| h.quantity)
    }

    /// Returns true if the hold exists and was confirmed.
    pub fn is_confirmed(&self, reservation_id: &ReservationId) -> bool {
        self.state
            .read()
            .unwrap()
            .holds
            .get(reservation_id)
            .map(|h| h.confirmed)
            .unwrap_or(false)
    }

    /// Number of reserve calls made against the location.
    pub fn reserve_calls(&self, location_id: LocationId) -> u32 {
        self.state
            .read()
            .unwrap()
            .reserve_calls
            .get(&location_id)
            .copied()
            .unwrap_or(0)
    }
}

impl Default for InMemoryInventoryClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InventoryClient for InMemoryInventoryClient {
    async fn reserve(
        &self,
        location_id: LocationId,
        order_id: OrderId,
        items: &[LineItem],
    ) -> std::result::Result<ReservationAck, CallError> {
        let mut state = self.state.write().unwrap();
        *state.reserve_calls.entry(location_id).or_insert(0) += 1;

        let script = state
            .scripts
            .get(&location_id)
            .cloned()
            .unwrap_or(ReserveScript::Accept);
        match script {
            ReserveScript::Reject(reason) => Err(CallError::Rejected(reason)),
            ReserveScript::Transient(reason) => Err(CallError::Transient(reason)),
            ReserveScript::Accept => {
                state.next_id += 1;
                let reservation_id = ReservationId::new(format!("RES-{:04}", state.next_id));
                let quantity = items.iter().map(|item| item.quantity).sum();
                state.holds.insert(
                    reservation_id.clone(),
                    Hold {
                        order_id,
                        quantity,
                        confirmed: false,
                    },
                );
                Ok(ReservationAck { reservation_id })
            }
        }
    }

    async fn release(&self, reservation_id: &ReservationId) -> std::result::Result<(), CallError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_release {
            return Err(CallError::Transient("inventory unreachable".to_string()));
        }
        state.holds.remove(reservation_id);
        Ok(())
    }

    async fn confirm(&self, reservation_id: &ReservationId) -> std::result::Result<(), CallError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_confirm {
            return Err(CallError::Transient("inventory unreachable".to_string()));
        }
        match state.holds.get_mut(reservation_id) {
            Some(hold) => {
                hold.confirmed = true;
                Ok(())
            }
            None => Err(CallError::Rejected(format!(
                "unknown reservation {reservation_id}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<LineItem> {
        vec![LineItem::new("GAS-12KG", "12kg", 2)]
    }

    #[tokio::test]
    async fn test_reserve_assigns_sequential_ids() {
        let client = InMemoryInventoryClient::new();
        let location = LocationId::new();

        let first = client.reserve(location, OrderId::new(), &items()).await.unwrap();
        let second = client.reserve(location, OrderId::new(), &items()).await.unwrap();

        assert_eq!(first.reservation_id.as_str(), "RES-0001");
        assert_eq!(second.reservation_id.as_str(), "RES-0002");
        assert_eq!(client.hold_count(), 2);
        assert_eq!(client.hold_quantity(&first.reservation_id), Some(2));
        assert_eq!(client.reserve_calls(location), 2);
    }

    #[tokio::test]
    async fn test_scripted_outcomes_per_location() {
        let client = InMemoryInventoryClient::new();
        let rejecting = LocationId::new();
        let flaky = LocationId::new();
        client.set_reject_at(rejecting, "insufficient stock");
        client.set_transient_at(flaky, "connection refused");

        let rejected = client.reserve(rejecting, OrderId::new(), &items()).await;
        assert!(matches!(rejected, Err(CallError::Rejected(_))));

        let transient = client.reserve(flaky, OrderId::new(), &items()).await;
        assert!(matches!(transient, Err(CallError::Transient(_))));

        client.set_accept_at(rejecting);
        assert!(client.reserve(rejecting, OrderId::new(), &items()).await.is_ok());
    }

    #[tokio::test]
    async fn test_release_removes_hold_and_tolerates_unknown() {
        let client = InMemoryInventoryClient::new();
        let ack = client
            .reserve(LocationId::new(), OrderId::new(), &items())
            .await
            .unwrap();

        client.release(&ack.reservation_id).await.unwrap();
        assert_eq!(client.hold_count(), 0);

        client.release(&ReservationId::new("RES-9999")).await.unwrap();
    }

    #[tokio::test]
    async fn test_confirm_marks_hold() {
        let client = InMemoryInventoryClient::new();
        let ack = client
            .reserve(LocationId::new(), OrderId::new(), &items())
            .await
            .unwrap();

        client.confirm(&ack.reservation_id).await.unwrap();
        assert!(client.is_confirmed(&ack.reservation_id));

        let unknown = client.confirm(&ReservationId::new("RES-9999")).await;
        assert!(matches!(unknown, Err(CallError::Rejected(_))));
    }
}
