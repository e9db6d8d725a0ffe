//! Tokio-backed delivery queue
//!
//! Submissions are pushed onto an unbounded channel and drained by a single
//! worker task spawned on a [`FlareRuntime`]. Each item carries its own
//! deadline; the worker packages it, checks it against the transport's
//! capabilities, sends it within the deadline and fires the item's signal.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use flare_core::{ClientConfig, Event, Severity};
use flare_runtime::FlareRuntime;
use serde_json::{Map, Value};
use tokio::sync::mpsc;

use crate::protocol::{self, Envelope};
use crate::signal::{DeliveryOutcome, DeliverySignal};
use crate::traits::{DeliveryQueue, Transport};
use crate::{QueueError, TransportError};

struct Job {
    event: Event,
    severity: Severity,
    custom: Option<Map<String, Value>>,
    timestamp_secs: u64,
    /// `None` when the timeout is too large to represent
    deadline: Option<Instant>,
    signal: DeliverySignal,
}

type SharedConfig = Arc<RwLock<Arc<ClientConfig>>>;

/// Delivery queue draining into a [`Transport`] on a background task.
pub struct AsyncDeliveryQueue<R: FlareRuntime> {
    sender: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    config: SharedConfig,
    pending: Arc<AtomicUsize>,
    runtime: R,
}

impl<R: FlareRuntime> AsyncDeliveryQueue<R> {
    /// Start a queue and its worker on `runtime`.
    pub fn start<T: Transport>(config: ClientConfig, transport: T, runtime: R) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let config: SharedConfig = Arc::new(RwLock::new(Arc::new(config)));
        let pending = Arc::new(AtomicUsize::new(0));

        let worker = Worker {
            transport,
            config: Arc::clone(&config),
            pending: Arc::clone(&pending),
        };
        runtime.spawn(worker.run(rx));

        Self {
            sender: Mutex::new(Some(tx)),
            config,
            pending,
            runtime,
        }
    }

    /// Replace the configuration used for items packaged from now on.
    pub fn reconfigure(&self, config: ClientConfig) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(config);
    }

    /// Items accepted but not yet concluded.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn is_disposed(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }
}

impl<R: FlareRuntime> DeliveryQueue for AsyncDeliveryQueue<R> {
    fn enqueue(
        &self,
        event: Event,
        severity: Severity,
        custom: Option<Map<String, Value>>,
        timeout: Duration,
        signal: DeliverySignal,
    ) -> Result<(), QueueError> {
        let guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let sender = guard.as_ref().ok_or(QueueError::Disposed)?;

        let job = Job {
            event,
            severity,
            custom,
            timestamp_secs: self.runtime.now_secs(),
            deadline: Instant::now().checked_add(timeout),
            signal,
        };
        self.pending.fetch_add(1, Ordering::SeqCst);
        if sender.send(job).is_err() {
            // The rejected job (and its signal) is dropped here.
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(QueueError::Closed);
        }
        Ok(())
    }

    fn config(&self) -> Arc<ClientConfig> {
        Arc::clone(&self.config.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn dispose(&self) {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if sender.is_some() {
            tracing::debug!(pending = self.pending(), "delivery queue disposed");
        }
    }
}

impl<R: FlareRuntime> Drop for AsyncDeliveryQueue<R> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<R: FlareRuntime> std::fmt::Debug for AsyncDeliveryQueue<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncDeliveryQueue")
            .field("pending", &self.pending())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// Holds no runtime handle: a dedicated runtime must be able to shut down
// once the queue that owns it is dropped.
struct Worker<T> {
    transport: T,
    config: SharedConfig,
    pending: Arc<AtomicUsize>,
}

impl<T: Transport> Worker<T> {
    async fn run(self, mut rx: mpsc::UnboundedReceiver<Job>) {
        while let Some(job) = rx.recv().await {
            let Job {
                event,
                severity,
                custom,
                timestamp_secs,
                deadline,
                signal,
            } = job;

            let outcome = if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                DeliveryOutcome::TimedOut
            } else {
                let config = Arc::clone(&self.config.read().unwrap_or_else(PoisonError::into_inner));
                let attempt = self.deliver(event, severity, custom, &config, timestamp_secs);
                let result = match deadline {
                    Some(deadline) => tokio::time::timeout_at(deadline.into(), attempt).await,
                    None => Ok(attempt.await),
                };
                match result {
                    Ok(Ok(())) => DeliveryOutcome::Delivered,
                    Ok(Err(err)) => {
                        tracing::error!(%severity, error = %err, "event delivery failed");
                        DeliveryOutcome::Failed(err.to_string())
                    }
                    Err(_) => DeliveryOutcome::TimedOut,
                }
            };

            if outcome == DeliveryOutcome::TimedOut {
                tracing::warn!(%severity, "event delivery ran past its deadline");
            }
            self.pending.fetch_sub(1, Ordering::SeqCst);
            signal.complete(outcome);
        }
        tracing::debug!("delivery worker stopped");
    }

    async fn deliver(
        &self,
        event: Event,
        severity: Severity,
        custom: Option<Map<String, Value>>,
        config: &ClientConfig,
        timestamp_secs: u64,
    ) -> Result<(), TransportError> {
        let data = protocol::package(event, severity, custom, config, timestamp_secs)
            .map_err(|violation| TransportError::Rejected(violation.to_string()))?;
        let body = Envelope::new(config.access_token.clone(), data).to_bytes()?;

        let max = self.transport.capabilities().max_payload_bytes;
        if body.len() > max {
            return Err(TransportError::PayloadTooLarge {
                size: body.len(),
                max,
            });
        }
        self.transport.send(&body).await
    }
}
