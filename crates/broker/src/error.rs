use thiserror::Error;

/// Errors raised by broker transports and the client supervisor.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The broker URL could not be parsed. Raised once at startup,
    /// before any connection attempt is made.
    #[error("invalid broker url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The transport has no live connection to the broker.
    #[error("not connected to broker")]
    NotConnected,

    /// A connection attempt failed.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The broker refused or never acknowledged a publish.
    #[error("publish failed: {0}")]
    Publish(String),

    /// A subscription could not be established.
    #[error("subscribe failed: {0}")]
    Subscribe(String),

    /// An event could not be serialized or deserialized for the wire.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An inbound event handler reported a failure.
    #[error("handler failure: {0}")]
    Handler(String),
}

/// Result type for broker operations.
pub type Result<T> = std::result::Result<T, BrokerError>;
