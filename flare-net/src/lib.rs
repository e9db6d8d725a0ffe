//! # Flare Network
//!
//! Delivery plumbing for the Flare telemetry client.
//!
//! This crate provides:
//! - The [`Transport`](traits::Transport) trait for moving serialized envelopes
//! - The [`DeliveryQueue`](traits::DeliveryQueue) trait and its Tokio-backed
//!   implementation, [`AsyncDeliveryQueue`]
//! - Single-use completion [`signal`]s waited on by synchronous callers
//! - Payload packaging into the collector's envelope format
//! - Mock and newline-delimited JSON transports

pub mod ndjson;
pub mod protocol;
pub mod queue;
pub mod signal;
pub mod traits;

mod mock;
pub use mock::MockTransport;
pub use ndjson::NdjsonTransport;
pub use queue::AsyncDeliveryQueue;
pub use signal::{signal, DeliveryOutcome, DeliverySignal, SignalWaiter, WaitTimeout};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::protocol::*;
    pub use crate::signal::*;
    pub use crate::traits::*;
    pub use crate::{AsyncDeliveryQueue, QueueError, TransportError};
}

/// Transport failures
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The collector could not be reached
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    /// The collector refused the envelope
    #[error("rejected by collector: {0}")]
    Rejected(String),
    /// The envelope exceeds the transport's limit
    #[error("payload of {size} bytes exceeds limit of {max} bytes")]
    PayloadTooLarge { size: usize, max: usize },
    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// I/O error on the underlying sink
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Submission failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// The queue was disposed
    #[error("delivery queue has been disposed")]
    Disposed,
    /// The background worker is gone
    #[error("delivery worker is not running")]
    Closed,
}
