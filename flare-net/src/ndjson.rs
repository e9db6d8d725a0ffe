//! Newline-delimited JSON transport
//!
//! Writes each envelope as one line to an async sink. Useful for local
//! collectors, log shippers and debugging.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::traits::{ReliabilityClass, Transport, TransportCapabilities};
use crate::TransportError;

/// Writes envelopes as NDJSON lines.
#[derive(Debug)]
pub struct NdjsonTransport<W> {
    sink: Mutex<W>,
}

impl<W> NdjsonTransport<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(sink: W) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }

    /// Recover the sink.
    pub fn into_inner(self) -> W {
        self.sink.into_inner()
    }
}

impl NdjsonTransport<tokio::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

#[async_trait::async_trait]
impl<W> Transport for NdjsonTransport<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn send(&self, body: &[u8]) -> Result<(), TransportError> {
        if body.contains(&b'\n') {
            return Err(TransportError::Rejected(
                "envelope spans multiple lines".into(),
            ));
        }
        let mut sink = self.sink.lock().await;
        sink.write_all(body).await?;
        sink.write_all(b"\n").await?;
        sink.flush().await?;
        Ok(())
    }

    fn capabilities(&self) -> TransportCapabilities {
        TransportCapabilities {
            reliability: ReliabilityClass::BestEffort,
            ..TransportCapabilities::default()
        }
    }
}
