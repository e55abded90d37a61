use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::Result;
use crate::event::EventRecord;

/// Stream of decoded events from one subscription.
pub type EventStream = Pin<Box<dyn Stream<Item = EventRecord> + Send>>;

/// Raw broker connection underneath [`BrokerClient`](crate::client::BrokerClient).
///
/// Implementations own the connection handle; the client layers state
/// tracking, reconnection, buffering and handler dispatch on top.
#[async_trait]
pub trait BrokerTransport: Send + Sync + 'static {
    /// Establish or replace the underlying connection.
    async fn connect(&self) -> Result<()>;

    /// Publish one event to `subject`.
    async fn publish(&self, subject: &str, record: &EventRecord) -> Result<()>;

    /// Subscribe to `subject`, yielding decoded events. Frames that
    /// fail to decode are dropped with a warning, not surfaced as
    /// stream errors.
    async fn subscribe(&self, subject: &str) -> Result<EventStream>;
}

/// Decode one wire frame, logging and discarding malformed input.
pub(crate) fn decode_frame(subject: &str, payload: &[u8]) -> Option<EventRecord> {
    match EventRecord::from_bytes(payload) {
        Ok(record) => Some(record),
        Err(err) => {
            tracing::warn!(%subject, error = %err, "discarding malformed event frame");
            metrics::counter!("broker_malformed_frames_total").increment(1);
            None
        }
    }
}
