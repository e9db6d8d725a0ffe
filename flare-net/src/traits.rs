//! Transport and delivery-queue traits
//!
//! This module defines the two seams of the delivery pipeline: the
//! [`Transport`] that moves serialized envelopes to the collector, and the
//! [`DeliveryQueue`] that callers submit events to.

use std::sync::Arc;
use std::time::Duration;

use flare_core::{ClientConfig, Event, Severity};
use serde_json::{Map, Value};

use crate::signal::DeliverySignal;
use crate::{QueueError, TransportError};

/// Reliability classification for transports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReliabilityClass {
    /// No delivery guarantees (fire-and-forget sinks)
    BestEffort,
    /// Acknowledged by the receiving end
    Acknowledged,
}

/// Transport capabilities
#[derive(Debug, Clone)]
pub struct TransportCapabilities {
    /// Reliability class of the transport
    pub reliability: ReliabilityClass,
    /// Largest serialized envelope the transport accepts
    pub max_payload_bytes: usize,
}

impl Default for TransportCapabilities {
    fn default() -> Self {
        Self {
            reliability: ReliabilityClass::Acknowledged,
            max_payload_bytes: 512 * 1024,
        }
    }
}

/// Moves one serialized envelope to the collector.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Send one envelope
    async fn send(&self, body: &[u8]) -> Result<(), TransportError>;

    /// Get transport capabilities
    fn capabilities(&self) -> TransportCapabilities {
        TransportCapabilities::default()
    }
}

/// The asynchronous delivery collaborator.
///
/// `enqueue` must return after trivial work and must eventually fire `signal`
/// exactly once. Dropping the signal counts as firing it.
pub trait DeliveryQueue: Send + Sync {
    /// Submit an event for background delivery
    fn enqueue(
        &self,
        event: Event,
        severity: Severity,
        custom: Option<Map<String, Value>>,
        timeout: Duration,
        signal: DeliverySignal,
    ) -> Result<(), QueueError>;

    /// Read-only snapshot of the active configuration
    fn config(&self) -> Arc<ClientConfig>;

    /// Stop background delivery; later submissions fail
    fn dispose(&self);
}
