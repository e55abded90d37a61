//! Reservation coordination across catalog, selection, and inventory.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use common::{ReservationId, VendorId};
use domain::{DomainError, Order, OrderEvent, Reservation, ReservationState};
use resilience::{GuardRegistry, ResilienceError};
use selection::SelectionEngine;
use tokio_util::sync::CancellationToken;

use crate::error::{AllocationError, CandidateFailure, FailureKind, Result};
use crate::services::{EventPublisher, InventoryClient, VendorCatalog};
use crate::store::ReservationStore;

const CATALOG_TARGET: &str = "catalog";
const INVENTORY_TARGET: &str = "inventory";

/// Coordinator settings.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// How long a pending reservation is held before it expires.
    pub reservation_ttl: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            reservation_ttl: Duration::hours(24),
        }
    }
}

/// Drives order allocation end to end.
///
/// For each order the coordinator pulls candidates from the catalog, ranks
/// them, and tries them best-first until one location accepts a hold. Every
/// outbound call runs through the per-target call guards, so a vendor
/// outage degrades into skipping that candidate rather than failing the
/// whole order.
pub struct ReservationCoordinator<C, I, P>
where
    C: VendorCatalog,
    I: InventoryClient,
    P: EventPublisher,
{
    catalog: C,
    inventory: I,
    publisher: P,
    engine: SelectionEngine,
    guards: Arc<GuardRegistry>,
    store: ReservationStore,
    config: CoordinatorConfig,
}

impl<C, I, P> ReservationCoordinator<C, I, P>
where
    C: VendorCatalog,
    I: InventoryClient,
    P: EventPublisher,
{
    /// Creates a coordinator over the given collaborators.
    pub fn new(
        catalog: C,
        inventory: I,
        publisher: P,
        engine: SelectionEngine,
        guards: Arc<GuardRegistry>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            catalog,
            inventory,
            publisher,
            engine,
            guards,
            store: ReservationStore::new(),
            config,
        }
    }

    /// Looks up a reservation by id.
    pub async fn reservation(&self, id: &ReservationId) -> Option<Reservation> {
        self.store.get(id).await
    }

    /// Number of reservations currently pending.
    pub async fn pending_count(&self) -> usize {
        self.store.pending_count().await
    }

    /// Allocates stock for the order, trying ranked candidates in turn.
    ///
    /// Returns the existing reservation when the order already holds a
    /// pending one. On success an `order.reserved` event is published; when
    /// every candidate fails, `order.allocation_failed` carries the
    /// per-candidate reasons and the error lists them too.
    #[tracing::instrument(
        skip(self, order, cancel),
        fields(order_id = %order.id, criteria = %order.criteria)
    )]
    pub async fn allocate(&self, order: &Order, cancel: &CancellationToken) -> Result<Reservation> {
        metrics::counter!("allocations_total").increment(1);
        let started = Instant::now();

        if let Some(existing) = self.store.begin_allocation(order.id).await? {
            tracing::info!(
                reservation_id = %existing.id(),
                "order already holds a pending reservation"
            );
            return Ok(existing);
        }

        let result = self.try_allocate(order, cancel).await;
        self.store.finish_allocation(order.id).await;

        match &result {
            Ok(reservation) => {
                metrics::counter!("allocations_completed").increment(1);
                tracing::info!(
                    vendor_id = %reservation.vendor_id(),
                    reservation_id = %reservation.id(),
                    duration_ms = started.elapsed().as_millis() as u64,
                    "order allocated"
                );
            }
            Err(err) => {
                metrics::counter!("allocations_failed").increment(1);
                tracing::warn!(error = %err, "allocation failed");
            }
        }
        metrics::histogram!("allocation_duration_seconds").record(started.elapsed().as_secs_f64());

        result
    }

    async fn try_allocate(&self, order: &Order, cancel: &CancellationToken) -> Result<Reservation> {
        if cancel.is_cancelled() {
            return Err(AllocationError::Cancelled { order_id: order.id });
        }

        let catalog_guard = self.guards.guard(CATALOG_TARGET);
        let candidates = catalog_guard
            .execute(|| self.catalog.candidates_for(order))
            .await
            .map_err(|err| AllocationError::CatalogUnavailable(err.to_string()))?;

        let quantity = order.total_quantity();
        let ranked = self.engine.rank(order.criteria, quantity, candidates)?;
        tracing::debug!(candidates = ranked.len(), "trying candidates best-first");

        let inventory_guard = self.guards.guard(INVENTORY_TARGET);
        let mut failures: Vec<CandidateFailure> = Vec::new();

        for candidate in &ranked {
            if cancel.is_cancelled() {
                tracing::warn!("allocation cancelled before trying all candidates");
                return Err(AllocationError::Cancelled { order_id: order.id });
            }

            let outcome = inventory_guard
                .execute(|| self.inventory.reserve(candidate.location_id, order.id, &order.items))
                .await;

            match outcome {
                Ok(ack) => {
                    if cancel.is_cancelled() {
                        // The hold was accepted; give it back before aborting.
                        tracing::warn!(
                            reservation_id = %ack.reservation_id,
                            "allocation cancelled after accept, releasing hold"
                        );
                        self.release_remote(&ack.reservation_id).await;
                        return Err(AllocationError::Cancelled { order_id: order.id });
                    }

                    let reservation = Reservation::pending(
                        ack.reservation_id,
                        order.id,
                        candidate.vendor_id,
                        candidate.location_id,
                        order.items.clone(),
                        self.config.reservation_ttl,
                    );
                    self.store.insert(reservation.clone()).await;

                    let event = OrderEvent::reserved(
                        order.id,
                        reservation.vendor_id(),
                        reservation.id().clone(),
                    );
                    self.publisher.publish(&event).await?;

                    return Ok(reservation);
                }
                Err(err) => failures.push(classify_failure(candidate.vendor_id, err)),
            }
        }

        let reasons = failures.iter().map(|f| f.to_string()).collect();
        self.publisher
            .publish(&OrderEvent::allocation_failed(order.id, reasons))
            .await?;

        Err(AllocationError::AllCandidatesFailed {
            order_id: order.id,
            failures,
        })
    }

    /// Releases a pending reservation, returning held stock to the vendor.
    ///
    /// Release is triggered by several uncoordinated paths (buyer
    /// cancellation, payment timeout, expiry), so releasing an already
    /// settled reservation is a no-op success.
    #[tracing::instrument(skip(self), fields(reservation_id = %reservation_id))]
    pub async fn release(&self, reservation_id: &ReservationId) -> Result<Reservation> {
        let Some(reservation) = self.store.get(reservation_id).await else {
            return Err(AllocationError::ReservationNotFound(reservation_id.clone()));
        };
        if !reservation.state().can_release() {
            tracing::debug!(
                state = %reservation.state(),
                "release on settled reservation is a no-op"
            );
            return Ok(reservation);
        }

        self.release_remote(reservation_id).await;

        match self.store.transition(reservation_id, |r| r.release()).await {
            Ok(Some(updated)) => {
                metrics::counter!("reservations_released_total").increment(1);
                tracing::info!(order_id = %updated.order_id(), "reservation released");
                Ok(updated)
            }
            Ok(None) => Err(AllocationError::ReservationNotFound(reservation_id.clone())),
            Err(_) => {
                // Lost a race with another settling path; the hold is gone
                // either way.
                match self.store.get(reservation_id).await {
                    Some(current) => Ok(current),
                    None => Err(AllocationError::ReservationNotFound(reservation_id.clone())),
                }
            }
        }
    }

    /// Confirms a pending reservation with the vendor.
    ///
    /// The local state moves only after the collaborator acknowledges; if
    /// the remote confirm fails, the reservation stays pending.
    #[tracing::instrument(skip(self), fields(reservation_id = %reservation_id))]
    pub async fn confirm(&self, reservation_id: &ReservationId) -> Result<Reservation> {
        let Some(reservation) = self.store.get(reservation_id).await else {
            return Err(AllocationError::ReservationNotFound(reservation_id.clone()));
        };
        if !reservation.state().can_confirm() {
            return Err(AllocationError::Domain(DomainError::InvalidTransition {
                from: reservation.state(),
                to: ReservationState::Confirmed,
            }));
        }

        let guard = self.guards.guard(INVENTORY_TARGET);
        guard
            .execute(|| self.inventory.confirm(reservation_id))
            .await
            .map_err(|err| AllocationError::Inventory(err.to_string()))?;

        match self.store.transition(reservation_id, |r| r.confirm()).await {
            Ok(Some(updated)) => {
                metrics::counter!("reservations_confirmed_total").increment(1);
                tracing::info!(order_id = %updated.order_id(), "reservation confirmed");
                Ok(updated)
            }
            Ok(None) => Err(AllocationError::ReservationNotFound(reservation_id.clone())),
            Err(err) => Err(AllocationError::Domain(err)),
        }
    }

    /// Expires pending reservations whose deadline has passed.
    ///
    /// Each stale hold is released at the vendor, marked expired locally,
    /// and announced with an `order.reservation_expired` event. Returns the
    /// reservations that were expired.
    pub async fn expire_stale(&self, now: DateTime<Utc>) -> Result<Vec<Reservation>> {
        let stale = self.store.expired(now).await;
        let mut expired = Vec::with_capacity(stale.len());

        for reservation in stale {
            let id = reservation.id().clone();
            self.release_remote(&id).await;

            match self.store.transition(&id, |r| r.expire()).await {
                Ok(Some(updated)) => {
                    let event = OrderEvent::reservation_expired(
                        updated.order_id(),
                        updated.vendor_id(),
                        updated.id().clone(),
                    );
                    self.publisher.publish(&event).await?;
                    metrics::counter!("reservations_expired_total").increment(1);
                    tracing::warn!(
                        reservation_id = %updated.id(),
                        order_id = %updated.order_id(),
                        expired_at = %updated.expires_at(),
                        "pending reservation expired"
                    );
                    expired.push(updated);
                }
                Ok(None) => {}
                Err(_) => {
                    tracing::debug!(reservation_id = %id, "stale reservation already settled");
                }
            }
        }

        Ok(expired)
    }

    /// Best-effort release at the inventory collaborator.
    ///
    /// A failed remote release is logged and absorbed; the collaborator's
    /// own hold expiry reconciles it eventually.
    async fn release_remote(&self, reservation_id: &ReservationId) {
        let guard = self.guards.guard(INVENTORY_TARGET);
        if let Err(err) = guard
            .execute(|| self.inventory.release(reservation_id))
            .await
        {
            metrics::counter!("remote_release_failures_total").increment(1);
            tracing::error!(%reservation_id, error = %err, "remote release failed");
        }
    }
}

/// Classifies one candidate's guarded-call failure.
fn classify_failure(vendor_id: VendorId, err: ResilienceError) -> CandidateFailure {
    match err {
        ResilienceError::Rejected(reason) => {
            tracing::info!(%vendor_id, %reason, "vendor declined the hold");
            CandidateFailure {
                vendor_id,
                kind: FailureKind::Rejected,
                reason,
            }
        }
        ResilienceError::RetriesExhausted {
            attempts,
            last_error,
        } => {
            tracing::warn!(
                %vendor_id,
                attempts,
                error = %last_error,
                "vendor unreachable, moving to next candidate"
            );
            CandidateFailure {
                vendor_id,
                kind: FailureKind::Exhausted,
                reason: last_error,
            }
        }
        ResilienceError::CircuitOpen { target } => {
            tracing::warn!(
                %vendor_id,
                %target,
                "circuit open, skipping candidate without calling"
            );
            CandidateFailure {
                vendor_id,
                kind: FailureKind::CircuitOpen,
                reason: format!("circuit open for {target}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::LocationId;
    use domain::{GeoPoint, LineItem, Money, SelectionCriteria};
    use resilience::CallError;

    use crate::services::{
        InMemoryEventPublisher, InMemoryInventoryClient, InMemoryVendorCatalog, VendorListing,
    };

    type TestCoordinator = ReservationCoordinator<
        InMemoryVendorCatalog,
        InMemoryInventoryClient,
        InMemoryEventPublisher,
    >;

    fn setup() -> (
        TestCoordinator,
        InMemoryVendorCatalog,
        InMemoryInventoryClient,
        InMemoryEventPublisher,
        Arc<GuardRegistry>,
    ) {
        setup_with_ttl(Duration::hours(24))
    }

    fn setup_with_ttl(
        ttl: Duration,
    ) -> (
        TestCoordinator,
        InMemoryVendorCatalog,
        InMemoryInventoryClient,
        InMemoryEventPublisher,
        Arc<GuardRegistry>,
    ) {
        let catalog = InMemoryVendorCatalog::new();
        let inventory = InMemoryInventoryClient::new();
        let publisher = InMemoryEventPublisher::new();
        let guards = Arc::new(GuardRegistry::default());
        let coordinator = ReservationCoordinator::new(
            catalog.clone(),
            inventory.clone(),
            publisher.clone(),
            SelectionEngine::with_defaults(),
            guards.clone(),
            CoordinatorConfig {
                reservation_ttl: ttl,
            },
        );
        (coordinator, catalog, inventory, publisher, guards)
    }

    fn listing(km_north: f64, unit_cents: i64, rating: f64, available: u32) -> VendorListing {
        VendorListing {
            vendor_id: VendorId::new(),
            location_id: LocationId::new(),
            // One degree of latitude is roughly 111.2 km.
            location: GeoPoint::new(km_north / 111.1949, 0.0).unwrap(),
            unit_price: Money::from_cents(unit_cents),
            delivery_fee: Money::from_cents(500),
            estimated_delivery_hours: 24.0,
            rating,
            available_quantity: available,
        }
    }

    fn order(criteria: SelectionCriteria) -> Order {
        Order::new(
            vec![LineItem::new("GAS-12KG", "12kg", 2)],
            GeoPoint::new(0.0, 0.0).unwrap(),
            false,
            criteria,
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_allocates_cheapest_vendor_first() {
        let (coordinator, catalog, inventory, publisher, _) = setup();
        let a = listing(5.0, 10_000, 4.5, 10);
        let b = listing(20.0, 9_000, 4.0, 10);
        let c = listing(2.0, 11_000, 4.8, 10);
        let (vendor_b, location_b) = (b.vendor_id, b.location_id);
        catalog.add_listing(a);
        catalog.add_listing(b);
        catalog.add_listing(c);

        let order = order(SelectionCriteria::LowestPrice);
        let reservation = coordinator
            .allocate(&order, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(reservation.vendor_id(), vendor_b);
        assert_eq!(reservation.location_id(), location_b);
        assert_eq!(reservation.state(), ReservationState::Pending);
        assert_eq!(reservation.quantity(), 2);
        assert_eq!(inventory.reserve_calls(location_b), 1);
        assert_eq!(inventory.hold_count(), 1);

        assert_eq!(publisher.event_types(), vec!["order.reserved"]);
        let events = publisher.events();
        let OrderEvent::Reserved(data) = &events[0] else {
            panic!("expected a reserved event");
        };
        assert_eq!(data.order_id, order.id);
        assert_eq!(data.vendor_id, vendor_b);
        assert_eq!(&data.reservation_id, reservation.id());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_vendor_is_skipped_after_retries() {
        let (coordinator, catalog, inventory, publisher, _) = setup();
        let a = listing(5.0, 10_000, 4.5, 10);
        let b = listing(20.0, 9_000, 4.0, 10);
        let (vendor_a, location_a) = (a.vendor_id, a.location_id);
        let location_b = b.location_id;
        catalog.add_listing(a);
        catalog.add_listing(b);
        inventory.set_transient_at(location_b, "connection refused");

        let order = order(SelectionCriteria::LowestPrice);
        let reservation = coordinator
            .allocate(&order, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(reservation.vendor_id(), vendor_a);
        // The cheaper vendor was retried to exhaustion before falling
        // through to the runner-up.
        assert_eq!(inventory.reserve_calls(location_b), 3);
        assert_eq!(inventory.reserve_calls(location_a), 1);
        assert_eq!(publisher.event_types(), vec!["order.reserved"]);
        let events = publisher.events();
        let OrderEvent::Reserved(data) = &events[0] else {
            panic!("expected a reserved event");
        };
        assert_eq!(data.vendor_id, vendor_a);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausting_all_candidates_publishes_failure() {
        let (coordinator, catalog, inventory, publisher, _) = setup();
        let listings = [
            listing(5.0, 10_000, 4.5, 10),
            listing(20.0, 9_000, 4.0, 10),
            listing(2.0, 11_000, 4.8, 10),
        ];
        let vendor_b = listings[1].vendor_id;
        for l in &listings {
            inventory.set_reject_at(l.location_id, "insufficient stock");
        }
        for l in listings {
            catalog.add_listing(l);
        }

        let order = order(SelectionCriteria::LowestPrice);
        let (order_id, failures) = match coordinator
            .allocate(&order, &CancellationToken::new())
            .await
        {
            Err(AllocationError::AllCandidatesFailed { order_id, failures }) => {
                (order_id, failures)
            }
            other => panic!("expected exhaustion, got {other:?}"),
        };

        assert_eq!(order_id, order.id);
        assert_eq!(failures.len(), 3);
        assert_eq!(failures[0].vendor_id, vendor_b);
        assert!(failures.iter().all(|f| f.kind == FailureKind::Rejected));
        assert_eq!(inventory.hold_count(), 0);
        assert_eq!(coordinator.pending_count().await, 0);

        assert_eq!(publisher.event_types(), vec!["order.allocation_failed"]);
        let events = publisher.events();
        let OrderEvent::AllocationFailed(data) = &events[0] else {
            panic!("expected an allocation failure event");
        };
        assert_eq!(data.reasons.len(), 3);
        assert!(data.reasons[0].contains("insufficient stock"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_allocation_returns_existing_reservation() {
        let (coordinator, catalog, inventory, publisher, _) = setup();
        catalog.add_listing(listing(5.0, 10_000, 4.5, 10));
        let order = order(SelectionCriteria::BestOverall);
        let cancel = CancellationToken::new();

        let first = coordinator.allocate(&order, &cancel).await.unwrap();
        let second = coordinator.allocate(&order, &cancel).await.unwrap();

        assert_eq!(first.id(), second.id());
        assert_eq!(inventory.holds_for_order(order.id), 1);
        assert_eq!(publisher.event_types(), vec!["order.reserved"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_is_idempotent() {
        let (coordinator, catalog, inventory, _, _) = setup();
        catalog.add_listing(listing(5.0, 10_000, 4.5, 10));
        let order = order(SelectionCriteria::LowestPrice);
        let reservation = coordinator
            .allocate(&order, &CancellationToken::new())
            .await
            .unwrap();

        let released = coordinator.release(reservation.id()).await.unwrap();
        assert_eq!(released.state(), ReservationState::Released);
        assert_eq!(inventory.hold_count(), 0);

        // A second release finds the hold settled and succeeds quietly.
        let again = coordinator.release(reservation.id()).await.unwrap();
        assert_eq!(again.state(), ReservationState::Released);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_unknown_reservation_is_not_found() {
        let (coordinator, _, _, _, _) = setup();

        let err = coordinator
            .release(&ReservationId::new("RES-9999"))
            .await
            .unwrap_err();

        assert!(matches!(err, AllocationError::ReservationNotFound(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_survives_remote_failure() {
        let (coordinator, catalog, inventory, _, _) = setup();
        catalog.add_listing(listing(5.0, 10_000, 4.5, 10));
        let order = order(SelectionCriteria::LowestPrice);
        let reservation = coordinator
            .allocate(&order, &CancellationToken::new())
            .await
            .unwrap();

        inventory.set_fail_on_release(true);
        let released = coordinator.release(reservation.id()).await.unwrap();

        assert_eq!(released.state(), ReservationState::Released);
        // The remote hold persists until the collaborator's own expiry.
        assert_eq!(inventory.hold_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirm_requires_remote_ack() {
        let (coordinator, catalog, inventory, _, _) = setup();
        catalog.add_listing(listing(5.0, 10_000, 4.5, 10));
        let order = order(SelectionCriteria::LowestPrice);
        let reservation = coordinator
            .allocate(&order, &CancellationToken::new())
            .await
            .unwrap();

        inventory.set_fail_on_confirm(true);
        let err = coordinator.confirm(reservation.id()).await.unwrap_err();
        assert!(matches!(err, AllocationError::Inventory(_)));
        let current = coordinator.reservation(reservation.id()).await.unwrap();
        assert_eq!(current.state(), ReservationState::Pending);

        inventory.set_fail_on_confirm(false);
        let confirmed = coordinator.confirm(reservation.id()).await.unwrap();
        assert_eq!(confirmed.state(), ReservationState::Confirmed);
        assert!(inventory.is_confirmed(reservation.id()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirm_after_release_is_invalid() {
        let (coordinator, catalog, _, _, _) = setup();
        catalog.add_listing(listing(5.0, 10_000, 4.5, 10));
        let order = order(SelectionCriteria::LowestPrice);
        let reservation = coordinator
            .allocate(&order, &CancellationToken::new())
            .await
            .unwrap();
        coordinator.release(reservation.id()).await.unwrap();

        let err = coordinator.confirm(reservation.id()).await.unwrap_err();

        assert!(matches!(
            err,
            AllocationError::Domain(DomainError::InvalidTransition { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expire_stale_reservations() {
        let (coordinator, catalog, inventory, publisher, _) = setup_with_ttl(Duration::zero());
        catalog.add_listing(listing(5.0, 10_000, 4.5, 10));
        let order = order(SelectionCriteria::LowestPrice);
        let reservation = coordinator
            .allocate(&order, &CancellationToken::new())
            .await
            .unwrap();

        let expired = coordinator.expire_stale(Utc::now()).await.unwrap();

        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id(), reservation.id());
        assert_eq!(expired[0].state(), ReservationState::Expired);
        assert_eq!(inventory.hold_count(), 0);
        assert_eq!(
            publisher.event_types(),
            vec!["order.reserved", "order.reservation_expired"]
        );

        // Nothing left to expire on the next pass.
        assert!(coordinator.expire_stale(Utc::now()).await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_allocation_makes_no_calls() {
        let (coordinator, catalog, inventory, publisher, _) = setup();
        let l = listing(5.0, 10_000, 4.5, 10);
        let location = l.location_id;
        catalog.add_listing(l);
        let order = order(SelectionCriteria::LowestPrice);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = coordinator.allocate(&order, &cancel).await.unwrap_err();

        assert!(matches!(err, AllocationError::Cancelled { .. }));
        assert_eq!(catalog.lookup_count(), 0);
        assert_eq!(inventory.reserve_calls(location), 0);
        assert!(publisher.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_catalog_outage_fails_without_events() {
        let (coordinator, catalog, _, publisher, _) = setup();
        catalog.set_fail_on_lookup(true);
        let order = order(SelectionCriteria::LowestPrice);

        let err = coordinator
            .allocate(&order, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AllocationError::CatalogUnavailable(_)));
        assert_eq!(catalog.lookup_count(), 3);
        assert!(publisher.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_stocked_candidates_is_an_error() {
        let (coordinator, catalog, _, publisher, _) = setup();
        catalog.add_listing(listing(5.0, 10_000, 4.5, 0));
        let order = order(SelectionCriteria::LowestPrice);

        let err = coordinator
            .allocate(&order, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AllocationError::NoCandidates(_)));
        assert!(publisher.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_inventory_circuit_skips_candidates_without_calls() {
        let (coordinator, catalog, inventory, _, guards) = setup();
        let l = listing(5.0, 10_000, 4.5, 10);
        let location = l.location_id;
        catalog.add_listing(l);

        // Trip the shared inventory breaker with exhausted executions.
        let guard = guards.guard(INVENTORY_TARGET);
        for _ in 0..5 {
            let result: resilience::Result<()> = guard
                .execute(|| async { Err(CallError::Transient("forced outage".into())) })
                .await;
            assert!(result.is_err());
        }

        let order = order(SelectionCriteria::LowestPrice);
        let failures = match coordinator
            .allocate(&order, &CancellationToken::new())
            .await
        {
            Err(AllocationError::AllCandidatesFailed { failures, .. }) => failures,
            other => panic!("expected exhaustion, got {other:?}"),
        };

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind, FailureKind::CircuitOpen);
        // Fail-fast: the scripted client never saw a call.
        assert_eq!(inventory.reserve_calls(location), 0);
    }
}
