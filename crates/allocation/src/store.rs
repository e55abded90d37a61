//! Local reservation book.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{OrderId, ReservationId};
use domain::{DomainError, Reservation, ReservationState};
use tokio::sync::RwLock;

use crate::error::{AllocationError, Result};

/// In-process book of reservations placed by this service.
///
/// The inventory collaborator remains the system of record for stock; this
/// book owns the reservation lifecycle and enforces that an order holds at
/// most one pending reservation at a time.
#[derive(Clone, Default)]
pub struct ReservationStore {
    inner: Arc<RwLock<Book>>,
}

#[derive(Default)]
struct Book {
    by_id: HashMap<ReservationId, Reservation>,
    in_flight: HashSet<OrderId>,
}

impl ReservationStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the order for allocation.
    ///
    /// Returns the existing reservation when the order already holds a
    /// pending one, and errs when another allocation for the same order is
    /// in flight. A `None` claim must be matched with [`finish_allocation`].
    ///
    /// [`finish_allocation`]: ReservationStore::finish_allocation
    pub async fn begin_allocation(&self, order_id: OrderId) -> Result<Option<Reservation>> {
        let mut book = self.inner.write().await;
        if let Some(existing) = book
            .by_id
            .values()
            .find(|r| r.order_id() == order_id && r.state() == ReservationState::Pending)
        {
            return Ok(Some(existing.clone()));
        }
        if !book.in_flight.insert(order_id) {
            return Err(AllocationError::AllocationInProgress { order_id });
        }
        Ok(None)
    }

    /// Releases the claim taken by [`begin_allocation`].
    ///
    /// [`begin_allocation`]: ReservationStore::begin_allocation
    pub async fn finish_allocation(&self, order_id: OrderId) {
        self.inner.write().await.in_flight.remove(&order_id);
    }

    /// Records a reservation.
    pub async fn insert(&self, reservation: Reservation) {
        let mut book = self.inner.write().await;
        book.by_id.insert(reservation.id().clone(), reservation);
    }

    /// Looks up a reservation by id.
    pub async fn get(&self, id: &ReservationId) -> Option<Reservation> {
        self.inner.read().await.by_id.get(id).cloned()
    }

    /// The pending reservation for the order, if any.
    pub async fn pending_for_order(&self, order_id: OrderId) -> Option<Reservation> {
        self.inner
            .read()
            .await
            .by_id
            .values()
            .find(|r| r.order_id() == order_id && r.state() == ReservationState::Pending)
            .cloned()
    }

    /// Applies a state transition atomically.
    ///
    /// Returns the updated reservation, or `None` when the id is unknown.
    /// The book is left untouched when the transition is refused.
    pub async fn transition<F>(
        &self,
        id: &ReservationId,
        apply: F,
    ) -> std::result::Result<Option<Reservation>, DomainError>
    where
        F: FnOnce(&mut Reservation) -> std::result::Result<(), DomainError>,
    {
        let mut book = self.inner.write().await;
        match book.by_id.get_mut(id) {
            Some(reservation) => {
                apply(reservation)?;
                Ok(Some(reservation.clone()))
            }
            None => Ok(None),
        }
    }

    /// Pending reservations whose deadline has passed.
    pub async fn expired(&self, now: DateTime<Utc>) -> Vec<Reservation> {
        self.inner
            .read()
            .await
            .by_id
            .values()
            .filter(|r| r.is_expired(now))
            .cloned()
            .collect()
    }

    /// Number of pending reservations.
    pub async fn pending_count(&self) -> usize {
        self.inner
            .read()
            .await
            .by_id
            .values()
            .filter(|r| r.state() == ReservationState::Pending)
            .count()
    }
}
