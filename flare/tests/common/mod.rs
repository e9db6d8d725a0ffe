//! Fake delivery queues shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use flare::net::signal::DeliverySignal;
use flare::net::QueueError;
use flare::{ClientConfig, DeliveryOutcome, DeliveryQueue, Event, Severity};
use serde_json::{Map, Value};

/// How a fake queue treats the signals it is handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    /// Keep the signal and never fire it
    Silent,
    /// Fire `Delivered` before `enqueue` returns
    Immediate,
    /// Fire `Delivered` from another thread after a delay
    Delayed(Duration),
    /// Refuse the submission
    Refuse,
}

#[derive(Debug, Clone)]
pub struct Submission {
    pub event: Event,
    pub severity: Severity,
    pub custom: Option<Map<String, Value>>,
    pub timeout: Duration,
}

pub struct FakeQueue {
    behaviour: Behaviour,
    config: Arc<ClientConfig>,
    enqueued: AtomicUsize,
    disposed: AtomicUsize,
    held: Mutex<Vec<DeliverySignal>>,
    submissions: Mutex<Vec<Submission>>,
}

impl FakeQueue {
    pub fn new(behaviour: Behaviour, config: ClientConfig) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            config: Arc::new(config),
            enqueued: AtomicUsize::new(0),
            disposed: AtomicUsize::new(0),
            held: Mutex::new(Vec::new()),
            submissions: Mutex::new(Vec::new()),
        })
    }

    pub fn enqueued(&self) -> usize {
        self.enqueued.load(Ordering::SeqCst)
    }

    pub fn disposed(&self) -> usize {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Signals kept by a silent queue.
    pub fn take_held(&self) -> Vec<DeliverySignal> {
        std::mem::take(&mut *self.held.lock().unwrap())
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap().clone()
    }
}

impl DeliveryQueue for FakeQueue {
    fn enqueue(
        &self,
        event: Event,
        severity: Severity,
        custom: Option<Map<String, Value>>,
        timeout: Duration,
        signal: DeliverySignal,
    ) -> Result<(), QueueError> {
        self.enqueued.fetch_add(1, Ordering::SeqCst);
        if self.behaviour == Behaviour::Refuse {
            return Err(QueueError::Disposed);
        }
        self.submissions.lock().unwrap().push(Submission {
            event,
            severity,
            custom,
            timeout,
        });
        match self.behaviour {
            Behaviour::Silent => self.held.lock().unwrap().push(signal),
            Behaviour::Immediate => {
                signal.complete(DeliveryOutcome::Delivered);
            }
            Behaviour::Delayed(delay) => {
                std::thread::spawn(move || {
                    std::thread::sleep(delay);
                    signal.complete(DeliveryOutcome::Delivered);
                });
            }
            Behaviour::Refuse => unreachable!(),
        }
        Ok(())
    }

    fn config(&self) -> Arc<ClientConfig> {
        Arc::clone(&self.config)
    }

    fn dispose(&self) {
        self.disposed.fetch_add(1, Ordering::SeqCst);
    }
}
