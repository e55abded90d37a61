//! Resilient messaging layer over an unreliable broker.
//!
//! [`BrokerClient`] owns one logical connection: it reconnects with
//! exponential backoff, buffers publishes while disconnected, replays
//! the buffer in FIFO order on reconnect, and dispatches inbound
//! events to registered handlers. Transports plug in underneath via
//! [`BrokerTransport`]; [`NatsTransport`] talks to a real broker and
//! [`InMemoryTransport`] backs tests and local development.

mod buffer;

pub mod client;
pub mod error;
pub mod event;
pub mod memory;
pub mod nats;
pub mod state;
pub mod transport;

pub use client::{BrokerClient, BrokerConfig, BrokerStatus, EventHandler, PublishOutcome};
pub use error::{BrokerError, Result};
pub use event::EventRecord;
pub use memory::InMemoryTransport;
pub use nats::NatsTransport;
pub use state::ConnectionState;
pub use transport::{BrokerTransport, EventStream};
