use std::collections::HashMap;
use std::sync::Arc;

use futures_util::{stream, StreamExt};
use tokio::sync::{mpsc, RwLock};

use crate::error::{BrokerError, Result};
use crate::event::EventRecord;
use crate::transport::{decode_frame, BrokerTransport, EventStream};

/// In-memory transport for tests and local development.
///
/// Published events are delivered straight back to subscribers on the
/// same subject. Failure toggles simulate an unreachable broker;
/// cutting reachability also severs live subscriptions, as a dropped
/// connection would.
#[derive(Clone)]
pub struct InMemoryTransport {
    state: Arc<RwLock<State>>,
}

struct State {
    reachable: bool,
    fail_publishes: bool,
    fail_next_connects: u32,
    connect_calls: u32,
    published: Vec<(String, EventRecord)>,
    subscribers: HashMap<String, Vec<mpsc::UnboundedSender<Vec<u8>>>>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(State {
                reachable: true,
                fail_publishes: false,
                fail_next_connects: 0,
                connect_calls: 0,
                published: Vec::new(),
                subscribers: HashMap::new(),
            })),
        }
    }

    /// Simulate the broker dropping off the network.
    pub async fn set_reachable(&self, reachable: bool) {
        let mut state = self.state.write().await;
        state.reachable = reachable;
        if !reachable {
            state.subscribers.clear();
        }
    }

    /// Fail publishes while connects keep succeeding.
    pub async fn set_fail_publishes(&self, fail: bool) {
        self.state.write().await.fail_publishes = fail;
    }

    /// Fail the next `count` connection attempts, then recover.
    pub async fn set_fail_next_connects(&self, count: u32) {
        self.state.write().await.fail_next_connects = count;
    }

    pub async fn connect_calls(&self) -> u32 {
        self.state.read().await.connect_calls
    }

    /// Events accepted for delivery, in publish order.
    pub async fn published(&self) -> Vec<(String, EventRecord)> {
        self.state.read().await.published.clone()
    }

    /// Push a raw frame to subscribers of `subject`, bypassing publish.
    pub async fn inject_frame(&self, subject: &str, frame: Vec<u8>) {
        let mut state = self.state.write().await;
        if let Some(senders) = state.subscribers.get_mut(subject) {
            senders.retain(|tx| tx.send(frame.clone()).is_ok());
        }
    }
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl BrokerTransport for InMemoryTransport {
    async fn connect(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.connect_calls += 1;
        if state.fail_next_connects > 0 {
            state.fail_next_connects -= 1;
            return Err(BrokerError::Connect("simulated connect failure".into()));
        }
        if !state.reachable {
            return Err(BrokerError::Connect("broker unreachable".into()));
        }
        Ok(())
    }

    async fn publish(&self, subject: &str, record: &EventRecord) -> Result<()> {
        let frame = record.to_bytes()?;
        let mut state = self.state.write().await;
        if !state.reachable {
            return Err(BrokerError::Publish("broker unreachable".into()));
        }
        if state.fail_publishes {
            return Err(BrokerError::Publish("simulated publish failure".into()));
        }
        state.published.push((subject.to_string(), record.clone()));
        if let Some(senders) = state.subscribers.get_mut(subject) {
            senders.retain(|tx| tx.send(frame.clone()).is_ok());
        }
        Ok(())
    }

    async fn subscribe(&self, subject: &str) -> Result<EventStream> {
        let mut state = self.state.write().await;
        if !state.reachable {
            return Err(BrokerError::Subscribe("broker unreachable".into()));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        state
            .subscribers
            .entry(subject.to_string())
            .or_default()
            .push(tx);

        let subject = subject.to_string();
        let frames = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|frame| (frame, rx))
        });
        let records = frames.filter_map(move |frame: Vec<u8>| {
            let subject = subject.clone();
            async move { decode_frame(&subject, &frame) }
        });
        Ok(Box::pin(records))
    }
}
