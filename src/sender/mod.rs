//! Single-writer half of the transport.
//!
//! [`PayloadSender`] binds to the write half of a connection and serialises
//! chunks onto it. Producers on any task enqueue `(header, payload)` pairs on
//! a bounded FIFO queue; one writer task drains the queue, so the connection
//! only ever has one physical write in flight and no chunk's bytes are
//! interleaved with another's.
//!
//! The sender does not choose chunk boundaries. It writes whatever the
//! [`Disassembler`](crate::disassembler::Disassembler) produced.

mod completion;
mod writer;

use std::sync::Arc;

use bytes::Bytes;
use log::info;
use tokio::sync::mpsc;

pub use completion::Completion;
pub(crate) use completion::CompletionSlot;

use crate::{
    codec::{Chunk, declared_len},
    config::TransportConfig,
    disassembler::SourceLength,
    error::{ConnectError, DisconnectReason, SendError},
    header::Header,
    link::LinkState,
    metrics,
    transport::TransportWrite,
};

/// A chunk waiting for the writer task.
#[derive(Debug)]
pub(crate) struct Outbound {
    chunk: Chunk,
    length: SourceLength,
    completion: CompletionSlot,
}

pub(crate) struct SenderShared {
    link: LinkState<mpsc::Sender<Outbound>>,
    config: TransportConfig,
}

/// Cloneable handle to the sending half of a connection.
///
/// Clones share the same connection and queue.
///
/// # Examples
///
/// ```no_run
/// use bytes::Bytes;
/// use streamframe::{
///     disassembler::SourceLength,
///     header::{Header, PayloadType, StreamId},
///     sender::PayloadSender,
/// };
///
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let (local, _remote) = tokio::io::duplex(1024);
/// let sender = PayloadSender::default();
/// sender.connect(local)?;
///
/// let header = Header::new(PayloadType::Stream, StreamId::random(), 2, true);
/// sender
///     .send_payload(header, Bytes::from_static(b"hi"), SourceLength::Known(2))
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PayloadSender {
    shared: Arc<SenderShared>,
}

impl Default for PayloadSender {
    fn default() -> Self { Self::new(TransportConfig::default()) }
}

impl std::fmt::Debug for PayloadSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadSender")
            .field("connected", &self.is_connected())
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}

impl PayloadSender {
    /// Create a disconnected sender.
    #[must_use]
    pub fn new(config: TransportConfig) -> Self {
        Self {
            shared: Arc::new(SenderShared {
                link: LinkState::default(),
                config,
            }),
        }
    }

    /// Configuration this sender was built with.
    #[must_use]
    pub fn config(&self) -> &TransportConfig { &self.shared.config }

    /// Bind the sender to `writer` and start the writer task.
    ///
    /// The writer is owned by the sender from here on and is shut down when
    /// the sender disconnects.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError::AlreadyConnected`] if a connection is bound.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn connect<W: TransportWrite>(&self, writer: W) -> Result<(), ConnectError> {
        let (tx, rx) = mpsc::channel(self.shared.config.send_queue_capacity());
        let link = self.shared.link.bind(tx)?;
        info!(
            "payload sender connected: generation={}, queue_capacity={}",
            link.generation(),
            self.shared.config.send_queue_capacity()
        );
        tokio::spawn(writer::run_writer(
            writer,
            rx,
            link,
            Arc::downgrade(&self.shared),
        ));
        Ok(())
    }

    /// Report whether a connection is currently bound.
    #[must_use]
    pub fn is_connected(&self) -> bool { self.shared.link.is_connected() }

    /// Queue a chunk and wait until it has been flushed.
    ///
    /// `length` describes the payload source the chunk was cut from and is
    /// recorded for diagnostics only.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::NotConnected`] if the sender is not connected or
    /// disconnects before the chunk is written,
    /// [`SendError::LengthMismatch`] if `payload` does not match the header,
    /// [`SendError::ChunkTooLarge`] if it exceeds the configured
    /// `max_chunk_length` and
    /// [`SendError::Io`] if the write fails.
    pub async fn send_payload(
        &self,
        header: Header,
        payload: Bytes,
        length: SourceLength,
    ) -> Result<(), SendError> {
        self.enqueue(header, payload, length).await.await
    }

    /// Queue a chunk, returning a [`Completion`] that resolves once it has been
    /// flushed or has failed.
    ///
    /// Waits only for queue capacity. Chunks queued through one handle are
    /// written in the order their `enqueue` calls completed.
    pub async fn enqueue(
        &self,
        header: Header,
        payload: Bytes,
        length: SourceLength,
    ) -> Completion {
        let (completion, slot) = Completion::channel(header);
        self.submit(header, payload, length, slot).await;
        completion
    }

    /// Queue a chunk and invoke `on_complete` once it has been flushed or has
    /// failed.
    ///
    /// The callback runs exactly once, on the writer task for chunks that
    /// reached the queue, so it must not block.
    pub async fn send_payload_with<F>(
        &self,
        header: Header,
        payload: Bytes,
        length: SourceLength,
        on_complete: F,
    ) where
        F: FnOnce(Header, Result<(), SendError>) + Send + 'static,
    {
        let slot = CompletionSlot::new(move |result| on_complete(header, result));
        self.submit(header, payload, length, slot).await;
    }

    async fn submit(
        &self,
        header: Header,
        payload: Bytes,
        length: SourceLength,
        completion: CompletionSlot,
    ) {
        let declared = declared_len(&header);
        if declared != payload.len() {
            completion.complete(Err(SendError::LengthMismatch {
                declared,
                actual: payload.len(),
            }));
            return;
        }
        let max = self.shared.config.max_chunk_length();
        if declared > max {
            completion.complete(Err(SendError::ChunkTooLarge {
                length: declared,
                max,
            }));
            return;
        }
        let Some(tx) = self.shared.link.with_resources(mpsc::Sender::clone) else {
            completion.complete(Err(SendError::NotConnected));
            return;
        };
        let outbound = Outbound {
            chunk: Chunk::new(header, payload),
            length,
            completion,
        };
        if let Err(mpsc::error::SendError(rejected)) = tx.send(outbound).await {
            rejected.completion.complete(Err(SendError::NotConnected));
        }
    }

    /// Close the bound connection.
    ///
    /// Queued and in-flight chunks fail with [`SendError::NotConnected`] and
    /// every observer registered with
    /// [`on_disconnected`](Self::on_disconnected) is notified once with
    /// `reason`. Calling this while disconnected does nothing.
    pub fn disconnect(&self, reason: DisconnectReason) {
        let graceful = reason.is_graceful();
        let message = reason.to_string();
        if self.shared.link.teardown(None, reason) {
            metrics::inc_disconnects();
            if graceful {
                info!("payload sender disconnected: reason={message}");
            } else {
                log::warn!("payload sender disconnected: reason={message}");
            }
        }
    }

    /// Register a callback invoked once each time a bound connection is lost.
    pub fn on_disconnected<F>(&self, observer: F)
    where
        F: Fn(&DisconnectReason) + Send + Sync + 'static,
    {
        self.shared.link.observe(Arc::new(observer));
    }
}

#[cfg(test)]
mod tests;
