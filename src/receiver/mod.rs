//! Single-reader half of the transport.
//!
//! [`PayloadReceiver`] owns the read half of a connection and runs exactly one
//! read loop over it. Every decoded chunk is handed to the subscribed
//! [`FrameHandler`]: the loop resolves the sink for the chunk's stream, writes
//! the payload into it and then reports the chunk. Only the loop reads from
//! the connection, so a chunk is always consumed whole before the next header
//! is parsed.

mod read_loop;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::{Bytes, BytesMut};
use log::{info, warn};

use crate::{
    config::TransportConfig,
    error::{ConnectError, DisconnectReason},
    header::Header,
    link::LinkState,
    metrics,
    panic::catch_callback,
    transport::TransportRead,
};

/// Destination for the payload bytes of one stream.
pub trait ChunkSink: Send {
    /// Append one chunk's payload.
    fn write_chunk(&mut self, chunk: Bytes);
}

impl ChunkSink for BytesMut {
    fn write_chunk(&mut self, chunk: Bytes) { self.extend_from_slice(&chunk); }
}

impl ChunkSink for Vec<u8> {
    fn write_chunk(&mut self, chunk: Bytes) { self.extend_from_slice(&chunk); }
}

/// Callbacks driven by the read loop.
///
/// The methods run one at a time, on the read loop or inside
/// [`PayloadReceiver::disconnect`], with the receiver's handler lock held. They
/// must not block. Calling [`PayloadReceiver::disconnect`] or
/// [`PayloadReceiver::subscribe`] from a callback deadlocks the read loop; to
/// stop the receiver from a callback, signal another task to do it. A panic in
/// `get_sink` or `on_chunk` disconnects the receiver with
/// [`DisconnectReason::HandlerPanicked`].
pub trait FrameHandler: Send + 'static {
    /// Resolve the sink for the stream `header` belongs to.
    ///
    /// Called once per chunk, before the payload is written.
    fn get_sink(&mut self, header: &Header) -> &mut dyn ChunkSink;

    /// Report that `bytes_read` payload bytes of `header`'s chunk reached the
    /// sink.
    fn on_chunk(&mut self, header: &Header, bytes_read: usize);

    /// Report that the connection ended. Streams still open will receive no
    /// further chunks.
    fn on_disconnect(&mut self, reason: &DisconnectReason);
}

pub(crate) struct ReceiverShared {
    link: LinkState<()>,
    handler: Mutex<Option<Box<dyn FrameHandler>>>,
    config: TransportConfig,
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ReceiverShared {
    /// Tear the connection down and let the handler abandon open streams.
    ///
    /// Returns `false` if the link was already gone.
    fn shut_down(&self, generation: Option<u64>, reason: DisconnectReason) -> bool {
        let torn_down = self.link.teardown_then(generation, reason, |reason| {
            let mut slot = lock(&self.handler);
            let Some(handler) = slot.as_mut() else {
                return;
            };
            if let Err(panic) = catch_callback(|| handler.on_disconnect(reason)) {
                warn!("frame handler panicked during disconnect: panic={panic}");
            }
        });
        if torn_down {
            metrics::inc_disconnects();
        }
        torn_down
    }
}

/// Cloneable handle to the receiving half of a connection.
///
/// # Examples
///
/// ```no_run
/// use streamframe::{
///     assembly::{AssemblyEvent, AssemblyRegistry, ChannelConsumer},
///     receiver::PayloadReceiver,
/// };
///
/// # async fn demo() -> Result<(), streamframe::error::ConnectError> {
/// let (_local, remote) = tokio::io::duplex(4096);
/// let (consumer, mut events) = ChannelConsumer::new();
/// let receiver = PayloadReceiver::default();
/// receiver.subscribe(AssemblyRegistry::new(consumer))?;
/// receiver.connect(remote)?;
///
/// while let Some(AssemblyEvent::Completed(payload)) = events.recv().await {
///     println!("{} bytes on {}", payload.bytes().len(), payload.stream_id());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PayloadReceiver {
    shared: Arc<ReceiverShared>,
}

impl Default for PayloadReceiver {
    fn default() -> Self { Self::new(TransportConfig::default()) }
}

impl std::fmt::Debug for PayloadReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadReceiver")
            .field("connected", &self.is_connected())
            .field("subscribed", &lock(&self.shared.handler).is_some())
            .finish_non_exhaustive()
    }
}

impl PayloadReceiver {
    /// Create a disconnected receiver with no handler.
    #[must_use]
    pub fn new(config: TransportConfig) -> Self {
        Self {
            shared: Arc::new(ReceiverShared {
                link: LinkState::default(),
                handler: Mutex::new(None),
                config,
            }),
        }
    }

    /// Configuration this receiver was built with.
    #[must_use]
    pub fn config(&self) -> &TransportConfig { &self.shared.config }

    /// Register the handler that receives every chunk.
    ///
    /// A previously registered handler is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError::SubscriberBusy`] while a connection is bound.
    pub fn subscribe(&self, handler: impl FrameHandler) -> Result<(), ConnectError> {
        let mut slot = lock(&self.shared.handler);
        if self.shared.link.is_connected() {
            return Err(ConnectError::SubscriberBusy);
        }
        *slot = Some(Box::new(handler));
        Ok(())
    }

    /// Bind the receiver to `reader` and start the read loop.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError::NoSubscriber`] if no handler is registered and
    /// [`ConnectError::AlreadyConnected`] if a connection is bound.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn connect<R: TransportRead>(&self, reader: R) -> Result<(), ConnectError> {
        let slot = lock(&self.shared.handler);
        if slot.is_none() {
            return Err(ConnectError::NoSubscriber);
        }
        let link = self.shared.link.bind(())?;
        drop(slot);
        info!(
            "payload receiver connected: generation={}, max_chunk_length={}",
            link.generation(),
            self.shared.config.max_chunk_length()
        );
        tokio::spawn(read_loop::run_read_loop(
            reader,
            link,
            Arc::downgrade(&self.shared),
        ));
        Ok(())
    }

    /// Report whether a connection is currently bound.
    #[must_use]
    pub fn is_connected(&self) -> bool { self.shared.link.is_connected() }

    /// Stop the read loop and close the bound connection.
    ///
    /// The handler's [`on_disconnect`](FrameHandler::on_disconnect) runs
    /// before this returns, after which no further chunks are delivered and
    /// the handler is ready for the next [`connect`](Self::connect). Calling
    /// this while disconnected does nothing.
    pub fn disconnect(&self, reason: DisconnectReason) {
        let message = reason.to_string();
        if self.shared.shut_down(None, reason) {
            info!("payload receiver disconnected: reason={message}");
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
