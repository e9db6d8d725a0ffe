//! Ownership of the delivery queue.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use flare_net::traits::DeliveryQueue;

use crate::bridge::BlockingDeliveryBridge;

/// Owns one queue and disposes it exactly once.
pub struct LifecycleOwner {
    queue: Arc<dyn DeliveryQueue>,
    shut_down: AtomicBool,
}

impl LifecycleOwner {
    pub fn new(queue: Arc<dyn DeliveryQueue>) -> Self {
        Self {
            queue,
            shut_down: AtomicBool::new(false),
        }
    }

    pub fn queue(&self) -> &Arc<dyn DeliveryQueue> {
        &self.queue
    }

    /// A blocking bridge over the owned queue.
    pub fn bridge(&self, timeout: Duration) -> BlockingDeliveryBridge {
        BlockingDeliveryBridge::new(Arc::clone(&self.queue), timeout)
    }

    /// Dispose the queue. Only the first call has an effect.
    pub fn shutdown(&self) {
        if self
            .shut_down
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.queue.dispose();
            tracing::debug!("delivery queue shut down");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }
}

impl Drop for LifecycleOwner {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for LifecycleOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleOwner")
            .field("shut_down", &self.is_shut_down())
            .finish_non_exhaustive()
    }
}
