//! # Flare Runtime
//!
//! Async runtime abstractions for the Flare telemetry client.
//!
//! The delivery queue runs its background worker on a [`FlareRuntime`]:
//! - **Tokio**: attach to the caller's runtime or own a dedicated one
//! - **Mock**: a manually advanced clock for deterministic tests
//!
//! ## Feature Flags
//!
//! - `tokio` (default): Use Tokio runtime

use core::future::Future;
use core::time::Duration;

/// Runtime trait for async operations
pub trait FlareRuntime: Send + Sync + 'static {
    /// Milliseconds since the Unix epoch
    fn now(&self) -> u64;

    /// Spawn a detached task
    fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static;

    /// Seconds since the Unix epoch
    fn now_secs(&self) -> u64 {
        self.now() / 1000
    }
}

#[cfg_attr(not(feature = "tokio"), allow(dead_code))]
fn system_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(feature = "tokio")]
pub mod tokio_runtime {
    //! Tokio-based runtime implementation

    use std::io;
    use std::sync::Arc;

    use tokio::runtime::{Builder, Handle, Runtime, RuntimeFlavor};

    use super::*;

    /// Keeps a dedicated runtime alive; shuts it down without blocking on drop.
    #[derive(Debug)]
    struct Owned(Option<Runtime>);

    impl Drop for Owned {
        fn drop(&mut self) {
            if let Some(runtime) = self.0.take() {
                runtime.shutdown_background();
            }
        }
    }

    /// Tokio runtime wrapper
    ///
    /// Clones share the same underlying runtime. A dedicated runtime lives
    /// until the last clone is dropped.
    #[derive(Debug, Clone)]
    pub struct TokioRuntime {
        handle: Handle,
        owned: Option<Arc<Owned>>,
    }

    impl TokioRuntime {
        /// Wrap the runtime the caller is currently running on.
        pub fn current() -> Option<Self> {
            Handle::try_current().ok().map(Self::from_handle)
        }

        /// Wrap an existing runtime handle.
        pub fn from_handle(handle: Handle) -> Self {
            Self {
                handle,
                owned: None,
            }
        }

        /// Start a dedicated multi-threaded runtime for delivery work.
        pub fn dedicated(worker_threads: usize) -> io::Result<Self> {
            let runtime = Builder::new_multi_thread()
                .worker_threads(worker_threads.max(1))
                .thread_name("flare-delivery")
                .enable_all()
                .build()?;
            Ok(Self {
                handle: runtime.handle().clone(),
                owned: Some(Arc::new(Owned(Some(runtime)))),
            })
        }

        pub fn handle(&self) -> &Handle {
            &self.handle
        }

        /// Whether spawned work can run while a caller thread blocks.
        pub fn runs_in_parallel(&self) -> bool {
            self.handle.runtime_flavor() != RuntimeFlavor::CurrentThread
        }

        /// Whether this wrapper owns its runtime.
        pub fn is_dedicated(&self) -> bool {
            self.owned.is_some()
        }
    }

    impl FlareRuntime for TokioRuntime {
        fn now(&self) -> u64 {
            system_millis()
        }

        fn spawn<F>(&self, future: F)
        where
            F: Future<Output = ()> + Send + 'static,
        {
            self.handle.spawn(future);
        }
    }
}

/// Mock runtime for testing
pub mod mock_runtime {
    use super::*;
    use core::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    /// Mock runtime for testing without real async
    ///
    /// Spawned futures are counted and dropped, never polled.
    #[derive(Debug, Default)]
    pub struct MockRuntime {
        current_time_ms: AtomicU64,
        spawned: AtomicUsize,
    }

    impl MockRuntime {
        /// Create a new mock runtime starting at `start_ms`
        pub fn new(start_ms: u64) -> Self {
            Self {
                current_time_ms: AtomicU64::new(start_ms),
                spawned: AtomicUsize::new(0),
            }
        }

        /// Advance the mock clock
        pub fn advance(&self, duration: Duration) {
            self.current_time_ms
                .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
        }

        /// Number of futures handed to `spawn`
        pub fn spawned(&self) -> usize {
            self.spawned.load(Ordering::SeqCst)
        }
    }

    impl FlareRuntime for MockRuntime {
        fn now(&self) -> u64 {
            self.current_time_ms.load(Ordering::SeqCst)
        }

        fn spawn<F>(&self, _future: F)
        where
            F: Future<Output = ()> + Send + 'static,
        {
            self.spawned.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Get the default runtime: the ambient Tokio runtime if it is
/// multi-threaded, otherwise a dedicated single-worker runtime.
///
/// A current-thread runtime is never reused: a caller blocking on delivery
/// would stall the only thread able to perform it.
#[cfg(feature = "tokio")]
pub fn default_runtime() -> std::io::Result<tokio_runtime::TokioRuntime> {
    match tokio_runtime::TokioRuntime::current() {
        Some(runtime) if runtime.runs_in_parallel() => Ok(runtime),
        _ => tokio_runtime::TokioRuntime::dedicated(1),
    }
}

#[cfg(test)]
mod tests {
    use super::mock_runtime::MockRuntime;
    use super::*;

    #[test]
    fn mock_clock_advances() {
        let runtime = MockRuntime::new(5_000);
        assert_eq!(runtime.now_secs(), 5);
        runtime.advance(Duration::from_millis(2_500));
        assert_eq!(runtime.now(), 7_500);
    }

    #[test]
    fn mock_spawn_is_counted_not_run() {
        let runtime = MockRuntime::default();
        runtime.spawn(async {});
        assert_eq!(runtime.spawned(), 1);
    }

    #[cfg(feature = "tokio")]
    #[test]
    fn dedicated_runtime_runs_spawned_work() {
        let runtime = tokio_runtime::TokioRuntime::dedicated(1).unwrap();
        assert!(runtime.is_dedicated());
        let (tx, rx) = std::sync::mpsc::channel();
        runtime.spawn(async move {
            tx.send(42).unwrap();
        });
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 42);
    }

    #[cfg(feature = "tokio")]
    #[tokio::test(flavor = "multi_thread")]
    async fn multi_thread_caller_runtime_is_reused() {
        let runtime = default_runtime().unwrap();
        assert!(!runtime.is_dedicated());
        assert!(runtime.runs_in_parallel());
    }

    #[cfg(feature = "tokio")]
    #[tokio::test]
    async fn current_thread_caller_gets_a_dedicated_runtime() {
        let current = tokio_runtime::TokioRuntime::current().unwrap();
        assert!(!current.runs_in_parallel());

        let runtime = default_runtime().unwrap();
        assert!(runtime.is_dedicated());
        assert!(runtime.runs_in_parallel());
    }
}
