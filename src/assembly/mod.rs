//! Receive-side reassembly of multiplexed streams.
//!
//! [`AssemblyRegistry`] is the [`FrameHandler`] that turns interleaved chunks
//! back into whole payloads. It keeps one entry per open stream id, created by
//! the stream's first chunk and removed by its end chunk or by a disconnect.
//! Control chunks bypass the open streams and go straight to the consumer.
//! The read loop is its only caller, so the registry holds no locks.

mod consumer;
mod types;

use std::collections::HashMap;

use bytes::BytesMut;

use log::warn;
use tracing::debug;

pub use consumer::{AssemblyConsumer, ChannelConsumer};
pub use types::{
    AbandonedPayload,
    AssembledPayload,
    AssemblyEvent,
    CompletedAssembly,
    ControlChunk,
};

use crate::{
    error::DisconnectReason,
    header::{Header, PayloadType, StreamId},
    metrics,
    receiver::{ChunkSink, FrameHandler},
};

/// A stream that has started but not yet ended.
#[derive(Debug)]
struct OpenAssembly<S> {
    payload_type: PayloadType,
    sink: S,
    bytes_received: u64,
    chunks_received: u64,
}

impl<S> OpenAssembly<S> {
    fn new(payload_type: PayloadType, sink: S) -> Self {
        Self {
            payload_type,
            sink,
            bytes_received: 0,
            chunks_received: 0,
        }
    }
}

/// Tracks open streams and hands finished ones to an [`AssemblyConsumer`].
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use streamframe::{
///     assembly::{AssemblyEvent, AssemblyRegistry, ChannelConsumer},
///     header::{Header, PayloadType, StreamId},
///     receiver::{ChunkSink, FrameHandler},
/// };
///
/// let (consumer, mut events) = ChannelConsumer::new();
/// let mut registry = AssemblyRegistry::new(consumer);
/// let header = Header::new(PayloadType::Stream, StreamId::random(), 3, true);
///
/// registry.get_sink(&header).write_chunk(Bytes::from_static(b"abc"));
/// registry.on_chunk(&header, 3);
///
/// match events.try_recv().expect("event") {
///     AssemblyEvent::Completed(payload) => assert_eq!(payload.bytes().as_ref(), b"abc"),
///     other => panic!("unexpected event: {other:?}"),
/// }
/// ```
#[derive(Debug)]
pub struct AssemblyRegistry<C: AssemblyConsumer> {
    consumer: C,
    open: HashMap<StreamId, OpenAssembly<C::Sink>>,
    control: BytesMut,
}

impl<C: AssemblyConsumer> AssemblyRegistry<C> {
    /// Create an empty registry reporting to `consumer`.
    #[must_use]
    pub fn new(consumer: C) -> Self {
        Self {
            consumer,
            open: HashMap::new(),
            control: BytesMut::new(),
        }
    }

    /// Number of streams whose end chunk has not arrived.
    #[must_use]
    pub fn open_streams(&self) -> usize { self.open.len() }

    /// Whether `stream_id` has an assembly in progress.
    #[must_use]
    pub fn is_open(&self, stream_id: StreamId) -> bool { self.open.contains_key(&stream_id) }

    #[must_use]
    pub fn consumer(&self) -> &C { &self.consumer }

    /// Consume the registry, returning the consumer. Open streams are dropped
    /// without being reported.
    #[must_use]
    pub fn into_consumer(self) -> C { self.consumer }
}

impl<C: AssemblyConsumer> FrameHandler for AssemblyRegistry<C> {
    fn get_sink(&mut self, header: &Header) -> &mut dyn ChunkSink {
        if header.payload_type().is_control() {
            self.control.clear();
            return &mut self.control;
        }
        let consumer = &mut self.consumer;
        let entry = self.open.entry(header.stream_id()).or_insert_with(|| {
            debug!(
                stream_id = %header.stream_id(),
                payload_type = %header.payload_type(),
                "stream opened"
            );
            OpenAssembly::new(header.payload_type(), consumer.allocate(header))
        });
        &mut entry.sink
    }

    fn on_chunk(&mut self, header: &Header, bytes_read: usize) {
        let stream_id = header.stream_id();
        if header.payload_type().is_control() {
            debug!(%stream_id, payload_type = %header.payload_type(), "control chunk received");
            let payload = self.control.split().freeze();
            self.consumer
                .on_control(ControlChunk::new(stream_id, header.payload_type(), payload));
            return;
        }
        let Some(entry) = self.open.get_mut(&stream_id) else {
            warn!("chunk reported for unknown stream: stream_id={stream_id}");
            return;
        };
        entry.bytes_received += bytes_read as u64;
        entry.chunks_received += 1;
        if !header.is_end() {
            return;
        }
        let Some(entry) = self.open.remove(&stream_id) else {
            return;
        };
        debug!(
            %stream_id,
            payload_type = %entry.payload_type,
            bytes = entry.bytes_received,
            chunks = entry.chunks_received,
            "stream completed"
        );
        self.consumer.on_complete(CompletedAssembly::new(
            stream_id,
            entry.payload_type,
            entry.sink,
            entry.bytes_received,
            entry.chunks_received,
        ));
    }

    fn on_disconnect(&mut self, reason: &DisconnectReason) {
        let abandoned = self.open.len();
        for (stream_id, entry) in self.open.drain() {
            self.consumer.on_abandoned(AbandonedPayload::new(
                stream_id,
                entry.payload_type,
                entry.bytes_received,
                entry.chunks_received,
                reason.clone(),
            ));
        }
        if abandoned > 0 {
            warn!("abandoned {abandoned} open streams: reason={reason}");
            metrics::inc_abandoned(abandoned as u64);
        }
    }
}
