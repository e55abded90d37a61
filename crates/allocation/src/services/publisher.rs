//! Outbound event publication.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use broker::{BrokerClient, BrokerTransport, EventRecord};
use domain::OrderEvent;

use crate::error::Result;

/// Hands order lifecycle events to the messaging layer.
///
/// Publication must not fail the operation that produced the event. The
/// broker client buffers while disconnected, so only serialization can
/// error here.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes the event on its own subject.
    async fn publish(&self, event: &OrderEvent) -> Result<()>;
}

/// Publishes order events through the resilient broker client.
pub struct BrokerPublisher<T: BrokerTransport> {
    client: BrokerClient<T>,
}

impl<T: BrokerTransport> BrokerPublisher<T> {
    /// Creates a publisher over the given broker client.
    pub fn new(client: BrokerClient<T>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<T: BrokerTransport> EventPublisher for BrokerPublisher<T> {
    async fn publish(&self, event: &OrderEvent) -> Result<()> {
        let record = EventRecord::new(event.event_type(), event.payload_json()?);
        let outcome = self.client.publish(record).await;
        tracing::debug!(
            event_type = event.event_type(),
            ?outcome,
            "order event handed to broker"
        );
        Ok(())
    }
}

/// Records published events for tests.
#[derive(Clone, Default)]
pub struct InMemoryEventPublisher {
    events: Arc<RwLock<Vec<OrderEvent>>>,
}

impl InMemoryEventPublisher {
    /// Creates an empty publisher.
    pub fn new() -> Self {
        Self::default()
    }

    /// All events published so far, in order.
    pub fn events(&self) -> Vec<OrderEvent> {
        self.events.read().unwrap().clone()
    }

    /// The subjects of all published events, in order.
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events
            .read()
            .unwrap()
            .iter()
            .map(|e| e.event_type())
            .collect()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(&self, event: &OrderEvent) -> Result<()> {
        self.events.write().unwrap().push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use broker::{BrokerConfig, ConnectionState, InMemoryTransport};
    use common::{OrderId, VendorId};

    #[tokio::test(start_paused = true)]
    async fn test_broker_publisher_uses_event_subject() {
        let transport = InMemoryTransport::new();
        let client = BrokerClient::new(transport.clone(), BrokerConfig::default());
        let supervisor = client.clone();
        tokio::spawn(async move { supervisor.run().await });

        tokio::time::timeout(Duration::from_secs(600), async {
            while client.state().await != ConnectionState::Connected {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .unwrap();

        let publisher = BrokerPublisher::new(client.clone());
        let order_id = OrderId::new();
        let event = OrderEvent::reserved(order_id, VendorId::new(), "RES-0001".into());
        publisher.publish(&event).await.unwrap();

        tokio::time::timeout(Duration::from_secs(600), async {
            while transport.published().await.is_empty() {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .unwrap();

        let (subject, record) = transport.published().await[0].clone();
        assert_eq!(subject, "order.reserved");
        assert_eq!(record.event_type, "order.reserved");
        assert_eq!(record.payload["data"]["order_id"], serde_json::json!(order_id));
        client.shutdown();
    }

    #[tokio::test]
    async fn test_broker_publisher_buffers_while_disconnected() {
        // No supervisor running, so the client never connects.
        let client = BrokerClient::new(InMemoryTransport::new(), BrokerConfig::default());
        let publisher = BrokerPublisher::new(client.clone());

        publisher
            .publish(&OrderEvent::reserved(OrderId::new(), VendorId::new(), "RES-0001".into()))
            .await
            .unwrap();

        assert_eq!(client.status().await.pending_count, 1);
    }

    #[tokio::test]
    async fn test_in_memory_publisher_records_in_order() {
        let publisher = InMemoryEventPublisher::new();

        publisher
            .publish(&OrderEvent::reserved(OrderId::new(), VendorId::new(), "RES-0001".into()))
            .await
            .unwrap();
        publisher
            .publish(&OrderEvent::allocation_failed(OrderId::new(), vec!["no stock".into()]))
            .await
            .unwrap();

        assert_eq!(
            publisher.event_types(),
            vec!["order.reserved", "order.allocation_failed"]
        );
    }
}
