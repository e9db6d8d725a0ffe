//! Synchronous delivery over an asynchronous queue.
//!
//! Every call creates a fresh single-use signal, submits the event with it and
//! blocks the calling thread until the signal fires or the timeout elapses.
//! Timing out abandons the wait only; the queued attempt may still finish in
//! the background, and firing a signal nobody waits on is a no-op.
//!
//! Do not call the bridge from a worker thread of the runtime that drives the
//! queue: the blocked thread may be the one the delivery needs.

use std::sync::Arc;
use std::time::Duration;

use flare_core::schema::DATA;
use flare_core::{Event, ExtendablePayload, Severity};
use flare_net::traits::DeliveryQueue;
use flare_net::{signal, QueueError, WaitTimeout};
use serde_json::{Map, Value};

/// Why a blocking delivery did not conclude.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// No conclusion within the timeout
    #[error("delivery did not conclude within {timeout:?}")]
    Timeout { timeout: Duration },
    /// The queue refused the submission
    #[error("delivery queue refused the event: {0}")]
    Enqueue(#[from] QueueError),
}

/// Blocks callers until their event is handled or a timeout passes.
#[derive(Clone)]
pub struct BlockingDeliveryBridge {
    queue: Arc<dyn DeliveryQueue>,
    timeout: Duration,
}

impl BlockingDeliveryBridge {
    pub fn new(queue: Arc<dyn DeliveryQueue>, timeout: Duration) -> Self {
        Self { queue, timeout }
    }

    /// A bridge using the queue's configured default timeout.
    pub fn with_default_timeout(queue: Arc<dyn DeliveryQueue>) -> Self {
        let timeout = queue.config().default_timeout;
        Self::new(queue, timeout)
    }

    /// A sibling bridge over the same queue with another timeout.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self::new(Arc::clone(&self.queue), timeout)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn queue(&self) -> &Arc<dyn DeliveryQueue> {
        &self.queue
    }

    /// Deliver within the bridge's timeout.
    pub fn deliver(
        &self,
        event: impl Into<Event>,
        severity: Severity,
        custom: Option<Map<String, Value>>,
    ) -> Result<(), DeliveryError> {
        self.deliver_within(event, severity, custom, self.timeout)
    }

    /// Deliver, blocking for at most `timeout`.
    ///
    /// Returns `Ok` once the pipeline concluded, whatever the outcome: failed
    /// attempts are logged, not returned.
    pub fn deliver_within(
        &self,
        event: impl Into<Event>,
        severity: Severity,
        custom: Option<Map<String, Value>>,
        timeout: Duration,
    ) -> Result<(), DeliveryError> {
        let (signal, waiter) = signal();
        self.queue
            .enqueue(event.into(), severity, custom, timeout, signal)?;

        match waiter.wait(timeout) {
            Ok(outcome) => {
                tracing::debug!(%severity, ?outcome, "delivery concluded");
                Ok(())
            }
            Err(WaitTimeout(timeout)) => Err(DeliveryError::Timeout { timeout }),
        }
    }

    /// Deliver at `severity` unless the configuration filters that level out.
    ///
    /// A filtered event returns `Ok` without touching the queue.
    pub fn log_at(
        &self,
        severity: Severity,
        event: impl Into<Event>,
        custom: Option<Map<String, Value>>,
    ) -> Result<(), DeliveryError> {
        if !self.queue.config().admits_severity(severity) {
            return Ok(());
        }
        self.deliver(event, severity, custom)
    }

    pub fn critical(&self, event: impl Into<Event>) -> Result<(), DeliveryError> {
        self.log_at(Severity::Critical, event, None)
    }

    pub fn error(&self, event: impl Into<Event>) -> Result<(), DeliveryError> {
        self.log_at(Severity::Error, event, None)
    }

    pub fn warning(&self, event: impl Into<Event>) -> Result<(), DeliveryError> {
        self.log_at(Severity::Warning, event, None)
    }

    pub fn info(&self, event: impl Into<Event>) -> Result<(), DeliveryError> {
        self.log_at(Severity::Info, event, None)
    }

    pub fn debug(&self, event: impl Into<Event>) -> Result<(), DeliveryError> {
        self.log_at(Severity::Debug, event, None)
    }

    pub fn critical_with(
        &self,
        event: impl Into<Event>,
        custom: Map<String, Value>,
    ) -> Result<(), DeliveryError> {
        self.log_at(Severity::Critical, event, Some(custom))
    }

    pub fn error_with(
        &self,
        event: impl Into<Event>,
        custom: Map<String, Value>,
    ) -> Result<(), DeliveryError> {
        self.log_at(Severity::Error, event, Some(custom))
    }

    pub fn warning_with(
        &self,
        event: impl Into<Event>,
        custom: Map<String, Value>,
    ) -> Result<(), DeliveryError> {
        self.log_at(Severity::Warning, event, Some(custom))
    }

    pub fn info_with(
        &self,
        event: impl Into<Event>,
        custom: Map<String, Value>,
    ) -> Result<(), DeliveryError> {
        self.log_at(Severity::Info, event, Some(custom))
    }

    pub fn debug_with(
        &self,
        event: impl Into<Event>,
        custom: Map<String, Value>,
    ) -> Result<(), DeliveryError> {
        self.log_at(Severity::Debug, event, Some(custom))
    }

    /// Deliver a prebuilt `data` payload at the level it carries.
    ///
    /// A missing or unreadable `level` counts as debug. The severity
    /// threshold does not apply to prebuilt payloads.
    pub fn log(&self, data: ExtendablePayload) -> Result<(), DeliveryError> {
        let severity = if data.kind() == &DATA {
            data.schema_field("level")
                .and_then(Value::as_str)
                .and_then(|level| level.parse().ok())
                .unwrap_or(Severity::Debug)
        } else {
            Severity::Debug
        };
        self.deliver(Event::Data(data), severity, None)
    }
}

impl std::fmt::Debug for BlockingDeliveryBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingDeliveryBridge")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
