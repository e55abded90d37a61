//! Background expiry sweep.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::coordinator::ReservationCoordinator;
use crate::services::{EventPublisher, InventoryClient, VendorCatalog};

/// Periodically expires stale pending reservations.
///
/// Runs until the shutdown token is cancelled. Sweep failures are logged
/// and the loop keeps going; a missed sweep only delays expiry.
pub async fn run_expiry_sweep<C, I, P>(
    coordinator: Arc<ReservationCoordinator<C, I, P>>,
    interval: Duration,
    shutdown: CancellationToken,
) where
    C: VendorCatalog,
    I: InventoryClient,
    P: EventPublisher,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                match coordinator.expire_stale(Utc::now()).await {
                    Ok(expired) if !expired.is_empty() => {
                        tracing::info!(count = expired.len(), "expiry sweep released stale holds");
                    }
                    Ok(_) => {}
                    Err(err) => {
                        tracing::error!(error = %err, "expiry sweep failed");
                    }
                }
            }
        }
    }

    tracing::debug!("expiry sweep stopped");
}
