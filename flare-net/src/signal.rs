//! Single-use delivery completion signals.
//!
//! [`signal`] creates a connected pair. The [`DeliverySignal`] travels with the
//! queued payload and is fired exactly once: explicitly through
//! [`DeliverySignal::complete`], or with [`DeliveryOutcome::Abandoned`] when it
//! is dropped unfired. The [`SignalWaiter`] stays with the caller and is
//! consumed by waiting, so neither half can be reused.

use core::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};

/// How a delivery attempt concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The transport accepted the payload
    Delivered,
    /// Packaging or transport failed
    Failed(String),
    /// The attempt ran past its deadline
    TimedOut,
    /// The signal was dropped without being fired
    Abandoned,
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered)
    }
}

/// The waiter saw no outcome within its timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no delivery outcome within {0:?}")]
pub struct WaitTimeout(pub Duration);

/// Create a connected signal/waiter pair.
pub fn signal() -> (DeliverySignal, SignalWaiter) {
    let (tx, rx) = channel::bounded(1);
    (DeliverySignal { tx: Some(tx) }, SignalWaiter { rx })
}

/// Writer half: fired once by the delivery pipeline.
#[derive(Debug)]
pub struct DeliverySignal {
    tx: Option<Sender<DeliveryOutcome>>,
}

impl DeliverySignal {
    /// Fire the signal. Returns `false` if the waiter is already gone.
    pub fn complete(mut self, outcome: DeliveryOutcome) -> bool {
        self.fire(outcome)
    }

    fn fire(&mut self, outcome: DeliveryOutcome) -> bool {
        match self.tx.take() {
            Some(tx) => tx.try_send(outcome).is_ok(),
            None => false,
        }
    }
}

impl Drop for DeliverySignal {
    fn drop(&mut self) {
        self.fire(DeliveryOutcome::Abandoned);
    }
}

/// Reader half: held by the caller that wants the outcome.
#[derive(Debug)]
pub struct SignalWaiter {
    rx: Receiver<DeliveryOutcome>,
}

impl SignalWaiter {
    /// Block until the signal fires or `timeout` elapses.
    pub fn wait(self, timeout: Duration) -> Result<DeliveryOutcome, WaitTimeout> {
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => Ok(outcome),
            Err(RecvTimeoutError::Timeout) => Err(WaitTimeout(timeout)),
            // The sender always fires before disconnecting; treat a bare
            // disconnect the same way.
            Err(RecvTimeoutError::Disconnected) => Ok(DeliveryOutcome::Abandoned),
        }
    }

    /// Non-blocking check.
    pub fn try_outcome(&self) -> Option<DeliveryOutcome> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(DeliveryOutcome::Abandoned),
        }
    }
}
