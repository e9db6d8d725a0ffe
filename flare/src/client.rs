//! The assembled client.

use std::sync::Arc;
use std::time::Duration;

use flare_core::schema::BUILTIN_KINDS;
use flare_core::{ClientConfig, ReservationRegistry};
use flare_net::traits::{DeliveryQueue, Transport};
use flare_net::AsyncDeliveryQueue;
use flare_runtime::tokio_runtime::TokioRuntime;

use crate::bridge::BlockingDeliveryBridge;
use crate::lifecycle::LifecycleOwner;
use crate::logger::FlareLogger;
use crate::Result;

/// A configured client: one queue, its owner and a default bridge.
#[derive(Debug)]
pub struct Flare {
    queue: Arc<AsyncDeliveryQueue<TokioRuntime>>,
    owner: LifecycleOwner,
    bridge: BlockingDeliveryBridge,
}

impl Flare {
    /// Create a new client builder
    pub fn builder() -> FlareBuilder {
        FlareBuilder::new()
    }

    /// Sink-style construction from the three values a log sink is usually
    /// configured with.
    pub fn for_sink<T: Transport>(
        access_token: impl Into<String>,
        environment: impl Into<String>,
        timeout: Duration,
        transport: T,
    ) -> Result<Self> {
        let config = ClientConfig::builder()
            .access_token(access_token)
            .environment(environment)
            .default_timeout(timeout)
            .build();
        Self::builder().config(config).build(transport)
    }

    /// Active configuration
    pub fn config(&self) -> Arc<ClientConfig> {
        self.queue.config()
    }

    /// Replace the configuration for subsequent events.
    pub fn reconfigure(&self, config: ClientConfig) {
        self.queue.reconfigure(config);
    }

    /// The bridge using the configured default timeout.
    pub fn bridge(&self) -> &BlockingDeliveryBridge {
        &self.bridge
    }

    /// A blocking client waiting at most `timeout` per event.
    pub fn as_blocking(&self, timeout: Duration) -> BlockingDeliveryBridge {
        self.bridge.with_timeout(timeout)
    }

    /// A host logger adapter named `name`.
    pub fn logger(&self, name: impl Into<String>) -> FlareLogger {
        FlareLogger::new(name, self.bridge.clone())
    }

    /// A `tracing` layer reporting through a logger named `name`.
    #[cfg(feature = "layer")]
    pub fn layer(&self, name: impl Into<String>) -> crate::layer::FlareLayer {
        crate::layer::FlareLayer::new(self.logger(name))
    }

    /// Items queued but not yet concluded.
    pub fn pending(&self) -> usize {
        self.queue.pending()
    }

    /// Stop delivery. Idempotent; also runs on drop.
    pub fn shutdown(&self) {
        self.owner.shutdown();
    }

    pub fn is_shut_down(&self) -> bool {
        self.owner.is_shut_down()
    }
}

/// Builder for [`Flare`]
#[derive(Debug, Default)]
pub struct FlareBuilder {
    config: ClientConfig,
    runtime: Option<TokioRuntime>,
}

impl FlareBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the client configuration
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the client configuration from a JSON document
    pub fn config_json(self, json: &str) -> Result<Self> {
        Ok(self.config(ClientConfig::from_json(json)?))
    }

    /// Run the delivery worker on `runtime` instead of the default one
    pub fn runtime(mut self, runtime: TokioRuntime) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Validate the payload schema, start the queue and assemble the client.
    ///
    /// Without an explicit runtime the caller's multi-threaded Tokio runtime
    /// is used if there is one, otherwise a dedicated one is started.
    pub fn build<T: Transport>(self, transport: T) -> Result<Flare> {
        ReservationRegistry::global().validate(BUILTIN_KINDS.iter().copied())?;

        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => flare_runtime::default_runtime()?,
        };
        let timeout = self.config.default_timeout;
        let queue = Arc::new(AsyncDeliveryQueue::start(self.config, transport, runtime));
        let shared: Arc<dyn DeliveryQueue> = queue.clone();

        Ok(Flare {
            bridge: BlockingDeliveryBridge::new(Arc::clone(&shared), timeout),
            owner: LifecycleOwner::new(shared),
            queue,
        })
    }
}
