//! Receive-side collaborators that own reassembled payloads.

use bytes::BytesMut;
use tokio::sync::mpsc;
use tracing::debug;

use super::types::{
    AbandonedPayload,
    AssembledPayload,
    AssemblyEvent,
    CompletedAssembly,
    ControlChunk,
};
use crate::{header::Header, receiver::ChunkSink};

/// Supplies sinks for new streams and takes ownership of finished ones.
///
/// Every method runs on the receiver's read loop, or inside
/// [`PayloadReceiver::disconnect`](crate::receiver::PayloadReceiver::disconnect)
/// for `on_abandoned`, while the receiver holds its handler lock. Methods must
/// not block and must not call back into the receiver: calling
/// `disconnect` or `subscribe` from here deadlocks the read loop.
pub trait AssemblyConsumer: Send + 'static {
    /// Sink type holding one stream's bytes.
    type Sink: ChunkSink + 'static;

    /// Create the sink for a stream whose first chunk carries `header`.
    fn allocate(&mut self, header: &Header) -> Self::Sink;

    /// Take a stream whose end chunk has arrived.
    fn on_complete(&mut self, assembly: CompletedAssembly<Self::Sink>);

    /// Learn that a stream will never complete.
    fn on_abandoned(&mut self, payload: AbandonedPayload);

    /// Take a control chunk. Open streams with the same id are unaffected.
    fn on_control(&mut self, control: ControlChunk) {
        debug!(
            stream_id = %control.stream_id(),
            payload_type = %control.payload_type(),
            "control chunk ignored"
        );
    }
}

/// Buffers each stream in memory and forwards its outcome over a channel.
///
/// Completed payloads are handled on whatever task drains the channel, never
/// on the read loop.
#[derive(Debug)]
pub struct ChannelConsumer {
    events: mpsc::UnboundedSender<AssemblyEvent>,
}

impl ChannelConsumer {
    /// Create a consumer and the receiving end of its event channel.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AssemblyEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        (Self { events }, rx)
    }

    fn forward(&self, event: AssemblyEvent) {
        let stream_id = event.stream_id();
        if self.events.send(event).is_err() {
            debug!(%stream_id, "assembly event dropped: receiver closed");
        }
    }
}

impl AssemblyConsumer for ChannelConsumer {
    type Sink = BytesMut;

    fn allocate(&mut self, header: &Header) -> BytesMut {
        let hint = usize::try_from(header.payload_length()).unwrap_or(0);
        BytesMut::with_capacity(hint)
    }

    fn on_complete(&mut self, assembly: CompletedAssembly<BytesMut>) {
        let (stream_id, payload_type, chunks) = (
            assembly.stream_id(),
            assembly.payload_type(),
            assembly.chunks_received(),
        );
        let bytes = assembly.into_sink().freeze();
        self.forward(AssemblyEvent::Completed(AssembledPayload::new(
            stream_id,
            payload_type,
            bytes,
            chunks,
        )));
    }

    fn on_abandoned(&mut self, payload: AbandonedPayload) {
        self.forward(AssemblyEvent::Abandoned(payload));
    }

    fn on_control(&mut self, control: ControlChunk) {
        self.forward(AssemblyEvent::Control(control));
    }
}
