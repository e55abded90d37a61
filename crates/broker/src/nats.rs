use std::time::Duration;

use async_nats::{Client, ConnectOptions, ServerAddr};
use futures_util::StreamExt;
use tokio::sync::RwLock;

use crate::error::{BrokerError, Result};
use crate::event::EventRecord;
use crate::transport::{decode_frame, BrokerTransport, EventStream};

/// NATS-backed transport.
///
/// Holds at most one live client; `connect` replaces it wholesale so
/// the supervising client can drive reconnection cycles explicitly.
#[derive(Debug)]
pub struct NatsTransport {
    addr: ServerAddr,
    url: String,
    client: RwLock<Option<Client>>,
}

impl NatsTransport {
    /// Parse and validate the broker URL.
    ///
    /// This is the only broker configuration error treated as fatal:
    /// a malformed URL can never connect, so it fails startup instead
    /// of entering the retry loop.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        let addr = url
            .parse::<ServerAddr>()
            .map_err(|err| BrokerError::InvalidUrl {
                url: url.clone(),
                reason: err.to_string(),
            })?;
        Ok(Self {
            addr,
            url,
            client: RwLock::new(None),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl BrokerTransport for NatsTransport {
    async fn connect(&self) -> Result<()> {
        let client = ConnectOptions::new()
            .connection_timeout(Duration::from_secs(10))
            .event_callback(|event| async move {
                match event {
                    async_nats::Event::Disconnected => tracing::warn!("nats connection lost"),
                    async_nats::Event::Connected => tracing::info!("nats connection restored"),
                    async_nats::Event::ClientError(err) => {
                        tracing::warn!(error = %err, "nats client error");
                    }
                    _ => {}
                }
            })
            .connect(self.addr.clone())
            .await
            .map_err(|err| BrokerError::Connect(err.to_string()))?;

        *self.client.write().await = Some(client);
        tracing::debug!(url = %self.url, "nats client connected");
        Ok(())
    }

    async fn publish(&self, subject: &str, record: &EventRecord) -> Result<()> {
        let bytes = record.to_bytes()?;
        let guard = self.client.read().await;
        let client = guard.as_ref().ok_or(BrokerError::NotConnected)?;
        client
            .publish(subject.to_string(), bytes.into())
            .await
            .map_err(|err| BrokerError::Publish(err.to_string()))?;
        // Flush so a dead connection surfaces here, not on a later call.
        client
            .flush()
            .await
            .map_err(|err| BrokerError::Publish(err.to_string()))?;
        Ok(())
    }

    async fn subscribe(&self, subject: &str) -> Result<EventStream> {
        let subscriber = {
            let guard = self.client.read().await;
            let client = guard.as_ref().ok_or(BrokerError::NotConnected)?;
            client
                .subscribe(subject.to_string())
                .await
                .map_err(|err| BrokerError::Subscribe(err.to_string()))?
        };

        let subject = subject.to_string();
        let records = subscriber.filter_map(move |message| {
            let subject = subject.clone();
            async move { decode_frame(&subject, &message.payload) }
        });
        Ok(Box::pin(records))
    }
}
