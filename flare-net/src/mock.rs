//! Mock transport for testing
//!
//! Records every envelope it is handed and can simulate latency, failures
//! and a collector that never answers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::Value;

use crate::traits::{ReliabilityClass, Transport, TransportCapabilities};
use crate::TransportError;

/// Mock transport for testing without real networking
///
/// Clones share the recorded envelopes.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    /// Simulated latency per send
    pub latency: Duration,
    /// Fail every send
    pub failing: bool,
    /// Never complete a send
    pub hanging: bool,
    /// Largest accepted envelope
    pub max_payload_bytes: Option<usize>,
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    attempts: Arc<AtomicUsize>,
}

impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the simulated latency
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make every send fail
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Make every send hang forever
    pub fn hanging(mut self) -> Self {
        self.hanging = true;
        self
    }

    /// Cap the accepted envelope size
    pub fn with_max_payload(mut self, max: usize) -> Self {
        self.max_payload_bytes = Some(max);
        self
    }

    /// Number of sends attempted, successful or not
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Envelopes delivered so far, decoded as JSON
    pub fn sent(&self) -> Vec<Value> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter_map(|bytes| serde_json::from_slice(bytes).ok())
            .collect()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn send(&self, body: &[u8]) -> Result<(), TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.hanging {
            std::future::pending::<()>().await;
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.failing {
            return Err(TransportError::ConnectionFailed("mock failure".into()));
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(body.to_vec());
        Ok(())
    }

    fn capabilities(&self) -> TransportCapabilities {
        let mut capabilities = TransportCapabilities {
            reliability: ReliabilityClass::Acknowledged,
            ..TransportCapabilities::default()
        };
        if let Some(max) = self.max_payload_bytes {
            capabilities.max_payload_bytes = max;
        }
        capabilities
    }
}
