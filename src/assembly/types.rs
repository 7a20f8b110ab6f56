//! Values reported by the assembly registry.

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::{
    error::DisconnectReason,
    header::{PayloadType, StreamId},
};

/// A stream whose end chunk has arrived, together with its sink.
#[derive(Debug)]
pub struct CompletedAssembly<S> {
    stream_id: StreamId,
    payload_type: PayloadType,
    sink: S,
    bytes_received: u64,
    chunks_received: u64,
}

impl<S> CompletedAssembly<S> {
    pub(super) fn new(
        stream_id: StreamId,
        payload_type: PayloadType,
        sink: S,
        bytes_received: u64,
        chunks_received: u64,
    ) -> Self {
        Self {
            stream_id,
            payload_type,
            sink,
            bytes_received,
            chunks_received,
        }
    }

    #[must_use]
    pub fn stream_id(&self) -> StreamId { self.stream_id }

    /// Type of the stream's first chunk.
    #[must_use]
    pub fn payload_type(&self) -> PayloadType { self.payload_type }

    #[must_use]
    pub fn bytes_received(&self) -> u64 { self.bytes_received }

    #[must_use]
    pub fn chunks_received(&self) -> u64 { self.chunks_received }

    /// Consume the assembly, returning the sink holding the payload.
    #[must_use]
    pub fn into_sink(self) -> S { self.sink }
}

/// A fully reassembled payload buffered in memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssembledPayload {
    stream_id: StreamId,
    payload_type: PayloadType,
    bytes: Bytes,
    chunks: u64,
}

impl AssembledPayload {
    /// Bundle a reassembled buffer with its stream metadata.
    #[must_use]
    pub fn new(stream_id: StreamId, payload_type: PayloadType, bytes: Bytes, chunks: u64) -> Self {
        Self {
            stream_id,
            payload_type,
            bytes,
            chunks,
        }
    }

    #[must_use]
    pub fn stream_id(&self) -> StreamId { self.stream_id }

    #[must_use]
    pub fn payload_type(&self) -> PayloadType { self.payload_type }

    #[must_use]
    pub fn bytes(&self) -> &Bytes { &self.bytes }

    /// Number of chunks the payload arrived in.
    #[must_use]
    pub fn chunks(&self) -> u64 { self.chunks }

    #[must_use]
    pub fn into_bytes(self) -> Bytes { self.bytes }

    /// Decode the payload as a JSON document.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the bytes are not valid JSON for `T`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bytes::Bytes;
    /// use streamframe::{
    ///     assembly::AssembledPayload,
    ///     header::{PayloadType, StreamId},
    ///     payloads::ResponsePayload,
    /// };
    ///
    /// let payload = AssembledPayload::new(
    ///     StreamId::random(),
    ///     PayloadType::Response,
    ///     Bytes::from_static(br#"{"statusCode":204}"#),
    ///     1,
    /// );
    /// let response: ResponsePayload = payload.decode_json().expect("valid response");
    /// assert_eq!(response.status_code, 204);
    /// ```
    pub fn decode_json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.bytes)
    }
}

/// A stream cut short by a disconnect before its end chunk arrived.
#[derive(Clone, Debug)]
pub struct AbandonedPayload {
    stream_id: StreamId,
    payload_type: PayloadType,
    bytes_received: u64,
    chunks_received: u64,
    reason: DisconnectReason,
}

impl AbandonedPayload {
    pub(super) fn new(
        stream_id: StreamId,
        payload_type: PayloadType,
        bytes_received: u64,
        chunks_received: u64,
        reason: DisconnectReason,
    ) -> Self {
        Self {
            stream_id,
            payload_type,
            bytes_received,
            chunks_received,
            reason,
        }
    }

    #[must_use]
    pub fn stream_id(&self) -> StreamId { self.stream_id }

    #[must_use]
    pub fn payload_type(&self) -> PayloadType { self.payload_type }

    /// Payload bytes that arrived before the disconnect.
    #[must_use]
    pub fn bytes_received(&self) -> u64 { self.bytes_received }

    #[must_use]
    pub fn chunks_received(&self) -> u64 { self.chunks_received }

    /// Why the connection ended.
    #[must_use]
    pub fn reason(&self) -> &DisconnectReason { &self.reason }
}

/// A control chunk passed through the registry without being interpreted.
///
/// Control chunks never join or end the assembly of a data stream that shares
/// their stream id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControlChunk {
    stream_id: StreamId,
    payload_type: PayloadType,
    payload: Bytes,
}

impl ControlChunk {
    /// Bundle a control chunk's header fields with its payload.
    #[must_use]
    pub fn new(stream_id: StreamId, payload_type: PayloadType, payload: Bytes) -> Self {
        Self {
            stream_id,
            payload_type,
            payload,
        }
    }

    /// Stream the control signal refers to.
    #[must_use]
    pub fn stream_id(&self) -> StreamId { self.stream_id }

    #[must_use]
    pub fn payload_type(&self) -> PayloadType { self.payload_type }

    #[must_use]
    pub fn payload(&self) -> &Bytes { &self.payload }
}

/// Outcome of one stream, or a control signal for it, as forwarded by
/// [`ChannelConsumer`](super::ChannelConsumer).
#[derive(Clone, Debug)]
pub enum AssemblyEvent {
    /// The stream's end chunk arrived.
    Completed(AssembledPayload),
    /// The connection ended first.
    Abandoned(AbandonedPayload),
    /// A control chunk arrived for the stream.
    Control(ControlChunk),
}

impl AssemblyEvent {
    #[must_use]
    pub fn stream_id(&self) -> StreamId {
        match self {
            Self::Completed(payload) => payload.stream_id(),
            Self::Abandoned(payload) => payload.stream_id(),
            Self::Control(control) => control.stream_id(),
        }
    }
}
