use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde::Serialize;
use tokio::sync::{Mutex, Notify, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::buffer::{PendingBuffer, PendingEvent};
use crate::error::Result;
use crate::event::EventRecord;
use crate::state::ConnectionState;
use crate::transport::{BrokerTransport, EventStream};

/// Tuning knobs for the client's reconnection and buffering behavior.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Consecutive connect failures before the state turns `failed`.
    /// Retries continue past the ceiling at the capped delay.
    pub max_reconnect_attempts: u32,
    /// First reconnect delay; doubles on each consecutive failure.
    pub backoff_base: Duration,
    /// Upper bound on the reconnect delay.
    pub backoff_cap: Duration,
    /// Pending events held while disconnected before the oldest is
    /// evicted.
    pub buffer_capacity: usize,
    /// Replay attempts per buffered event before it is dropped.
    pub replay_attempts: u32,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            max_reconnect_attempts: 5,
            backoff_base: Duration::from_secs(1),
            backoff_cap: Duration::from_secs(60),
            buffer_capacity: 1000,
            replay_attempts: 3,
        }
    }
}

/// Snapshot of the client for health endpoints and diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct BrokerStatus {
    pub state: ConnectionState,
    pub pending_count: usize,
    pub evicted_count: u64,
    pub last_error: Option<String>,
}

/// How a publish was settled from the caller's point of view.
///
/// Publishing never fails: when the broker is unavailable the event is
/// buffered for replay instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Delivered to the broker directly.
    Sent,
    /// Held in the pending buffer until the connection returns.
    Buffered,
}

/// Consumer callback bound to one event type.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, record: &EventRecord) -> Result<()>;
}

struct ClientInner<T> {
    transport: T,
    config: BrokerConfig,
    state: RwLock<ConnectionState>,
    buffer: Mutex<PendingBuffer>,
    handlers: RwLock<HashMap<String, Vec<Arc<dyn EventHandler>>>>,
    last_error: RwLock<Option<String>>,
    redial: Notify,
    shutdown: CancellationToken,
    readers: Mutex<Vec<JoinHandle<()>>>,
}

/// Resilient broker client.
///
/// Owns the single logical connection to the message broker: a
/// supervising [`run`](BrokerClient::run) loop drives reconnection
/// with exponential backoff, publishes fall back to a bounded FIFO
/// buffer while disconnected, and buffered events are replayed in
/// order once the connection returns. Broker unavailability is never
/// fatal to the hosting service.
pub struct BrokerClient<T: BrokerTransport> {
    inner: Arc<ClientInner<T>>,
}

impl<T: BrokerTransport> Clone for BrokerClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: BrokerTransport> BrokerClient<T> {
    pub fn new(transport: T, config: BrokerConfig) -> Self {
        let buffer = PendingBuffer::new(config.buffer_capacity);
        Self {
            inner: Arc::new(ClientInner {
                transport,
                state: RwLock::new(ConnectionState::Disconnected),
                buffer: Mutex::new(buffer),
                handlers: RwLock::new(HashMap::new()),
                last_error: RwLock::new(None),
                redial: Notify::new(),
                shutdown: CancellationToken::new(),
                readers: Mutex::new(Vec::new()),
                config,
            }),
        }
    }

    pub async fn state(&self) -> ConnectionState {
        *self.inner.state.read().await
    }

    pub async fn status(&self) -> BrokerStatus {
        let state = self.state().await;
        let (pending_count, evicted_count) = {
            let buffer = self.inner.buffer.lock().await;
            (buffer.len(), buffer.evicted_count())
        };
        let last_error = self.inner.last_error.read().await.clone();
        BrokerStatus {
            state,
            pending_count,
            evicted_count,
            last_error,
        }
    }

    /// Publish an event on the subject named by its event type.
    ///
    /// Sends directly while connected; on a send failure the
    /// connection is marked lost and the event is buffered, so the
    /// caller never sees an error either way.
    #[tracing::instrument(skip(self, record), fields(event_type = %record.event_type))]
    pub async fn publish(&self, record: EventRecord) -> PublishOutcome {
        if self.state().await == ConnectionState::Connected {
            match self
                .inner
                .transport
                .publish(&record.event_type, &record)
                .await
            {
                Ok(()) => {
                    metrics::counter!("broker_published_total").increment(1);
                    return PublishOutcome::Sent;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "direct publish failed; buffering event");
                    self.mark_disconnected(err.to_string()).await;
                    self.inner.redial.notify_one();
                }
            }
        }

        self.inner.buffer.lock().await.push(PendingEvent::new(record));
        metrics::counter!("broker_buffered_total").increment(1);
        if self.state().await == ConnectionState::Connected {
            // Raced with a connect cycle; nudge the supervisor so the
            // event is drained rather than stuck until the next drop.
            self.inner.redial.notify_one();
        }
        PublishOutcome::Buffered
    }

    /// Bind a handler to an event type.
    ///
    /// The client subscribes to each registered event type when a
    /// connection is established. A registration made while a connect
    /// cycle is mid-flight takes effect on the next cycle.
    pub async fn register_handler(
        &self,
        event_type: impl Into<String>,
        handler: Arc<dyn EventHandler>,
    ) {
        let event_type = event_type.into();
        let first_for_type = {
            let mut handlers = self.inner.handlers.write().await;
            let entry = handlers.entry(event_type.clone()).or_default();
            entry.push(handler);
            entry.len() == 1
        };

        if first_for_type && self.state().await == ConnectionState::Connected {
            match self.inner.transport.subscribe(&event_type).await {
                Ok(stream) => self.spawn_reader(event_type, stream).await,
                Err(err) => {
                    tracing::warn!(%event_type, error = %err, "late subscribe failed; will retry on reconnect");
                }
            }
        }
    }

    /// Request shutdown. The supervising loop stops, subscription
    /// readers are aborted, and buffered events are discarded.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }

    /// Supervise the connection until shutdown.
    ///
    /// Runs connect cycles with exponential backoff; each successful
    /// connect resubscribes registered event types and drains the
    /// pending buffer in FIFO order. Passing the reconnect ceiling
    /// flips the state to `failed`, never stops the loop.
    pub async fn run(&self) {
        let mut consecutive_failures: u32 = 0;
        loop {
            if self.inner.shutdown.is_cancelled() {
                break;
            }
            if consecutive_failures < self.inner.config.max_reconnect_attempts {
                self.set_state(ConnectionState::Connecting).await;
            }

            match self.inner.transport.connect().await {
                Ok(()) => {
                    consecutive_failures = 0;
                    *self.inner.last_error.write().await = None;
                    metrics::counter!("broker_connects_total").increment(1);

                    self.resubscribe().await;
                    if self.drain_buffer().await {
                        self.set_state(ConnectionState::Connected).await;
                        tracing::info!("broker connected");
                        tokio::select! {
                            _ = self.inner.shutdown.cancelled() => break,
                            _ = self.inner.redial.notified() => {
                                tracing::warn!("broker connection lost; reconnecting");
                            }
                        }
                    }
                    self.abort_readers().await;
                    tokio::select! {
                        _ = self.inner.shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.backoff_delay(1)) => {}
                    }
                }
                Err(err) => {
                    consecutive_failures = consecutive_failures.saturating_add(1);
                    *self.inner.last_error.write().await = Some(err.to_string());
                    metrics::counter!("broker_reconnect_failures_total").increment(1);

                    let ceiling = self.inner.config.max_reconnect_attempts;
                    if consecutive_failures < ceiling {
                        self.set_state(ConnectionState::Disconnected).await;
                        tracing::warn!(attempt = consecutive_failures, error = %err, "broker connect failed");
                    } else {
                        if consecutive_failures == ceiling {
                            tracing::error!(
                                attempts = consecutive_failures,
                                error = %err,
                                "reconnect ceiling reached; continuing in degraded mode"
                            );
                        }
                        self.set_state(ConnectionState::Failed).await;
                    }

                    let delay = self.backoff_delay(consecutive_failures);
                    tokio::select! {
                        _ = self.inner.shutdown.cancelled() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        self.abort_readers().await;
        self.set_state(ConnectionState::Disconnected).await;
        tracing::debug!("broker client stopped");
    }

    fn backoff_delay(&self, failures: u32) -> Duration {
        let factor = 2u32.saturating_pow(failures.saturating_sub(1));
        let capped = self
            .inner
            .config
            .backoff_base
            .saturating_mul(factor)
            .min(self.inner.config.backoff_cap);
        capped.mul_f64(rand::thread_rng().gen_range(0.75..=1.25))
    }

    async fn set_state(&self, next: ConnectionState) {
        let mut state = self.inner.state.write().await;
        if *state != next {
            tracing::debug!(from = %*state, to = %next, "connection state changed");
            *state = next;
        }
    }

    async fn mark_disconnected(&self, reason: String) {
        self.set_state(ConnectionState::Disconnected).await;
        *self.inner.last_error.write().await = Some(reason);
        metrics::counter!("broker_disconnects_total").increment(1);
    }

    async fn resubscribe(&self) {
        let event_types: Vec<String> = {
            let handlers = self.inner.handlers.read().await;
            handlers.keys().cloned().collect()
        };
        for event_type in event_types {
            match self.inner.transport.subscribe(&event_type).await {
                Ok(stream) => self.spawn_reader(event_type, stream).await,
                Err(err) => {
                    tracing::warn!(%event_type, error = %err, "resubscribe failed");
                }
            }
        }
    }

    async fn spawn_reader(&self, event_type: String, stream: EventStream) {
        let client = self.clone();
        let handle = tokio::spawn(client.read_loop(event_type, stream));
        self.inner.readers.lock().await.push(handle);
    }

    async fn read_loop(self, event_type: String, mut stream: EventStream) {
        use futures_util::StreamExt;

        while let Some(record) = stream.next().await {
            self.dispatch(&record).await;
        }
        tracing::debug!(%event_type, "subscription stream ended");
    }

    /// Dispatch one inbound event to its handlers, sequentially.
    /// Handler failures are logged and never crash the reader.
    async fn dispatch(&self, record: &EventRecord) {
        let handlers: Vec<Arc<dyn EventHandler>> = {
            let map = self.inner.handlers.read().await;
            map.get(record.event_type.as_str()).cloned().unwrap_or_default()
        };
        if handlers.is_empty() {
            tracing::debug!(event_type = %record.event_type, "no handler registered for event");
            return;
        }
        for handler in handlers {
            if let Err(err) = handler.handle(record).await {
                tracing::error!(event_type = %record.event_type, error = %err, "event handler failed");
                metrics::counter!("broker_handler_failures_total").increment(1);
            }
        }
    }

    async fn abort_readers(&self) {
        let mut readers = self.inner.readers.lock().await;
        for handle in readers.drain(..) {
            handle.abort();
        }
    }

    /// Replay buffered events in FIFO order. Returns false when a
    /// replay failed and the connection should be considered lost.
    async fn drain_buffer(&self) -> bool {
        loop {
            if self.inner.shutdown.is_cancelled() {
                return true;
            }
            let next = self.inner.buffer.lock().await.pop();
            let Some(mut pending) = next else {
                return true;
            };

            match self
                .inner
                .transport
                .publish(&pending.record.event_type, &pending.record)
                .await
            {
                Ok(()) => {
                    metrics::counter!("broker_replayed_total").increment(1);
                }
                Err(err) => {
                    pending.attempts += 1;
                    let mut buffer = self.inner.buffer.lock().await;
                    if pending.attempts >= self.inner.config.replay_attempts {
                        tracing::error!(
                            event_type = %pending.record.event_type,
                            attempts = pending.attempts,
                            error = %err,
                            "dropping buffered event after repeated replay failures"
                        );
                        buffer.record_eviction();
                    } else {
                        buffer.push_front(pending);
                    }
                    drop(buffer);
                    self.mark_disconnected(err.to_string()).await;
                    return false;
                }
            }
        }
    }
}
