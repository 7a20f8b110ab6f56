//! High-level send helpers built on the disassembler.
//!
//! [`SendOperations`] sends a structured request or response on its own
//! stream id and each accompanying content stream on a stream id of its own.
//! The body announces the content streams through
//! [`StreamDescription`]s so the peer can match them up. Content streams are
//! disassembled concurrently and interleave on the wire.

use bytes::Bytes;
use futures::future::try_join_all;
use tracing::debug;

use crate::{
    disassembler::{Disassembler, DisassemblyError, PayloadSource},
    header::{PayloadType, StreamId},
    payloads::{RequestPayload, ResponsePayload, StreamDescription},
    sender::PayloadSender,
};

/// A content stream to send alongside a request or response.
#[derive(Debug)]
pub struct ContentStream {
    id: StreamId,
    content_type: Option<String>,
    source: PayloadSource,
}

impl ContentStream {
    /// Wrap `source` under a fresh stream id.
    #[must_use]
    pub fn new(source: PayloadSource) -> Self { Self::with_id(StreamId::random(), source) }

    /// Wrap `source` under a caller-chosen stream id.
    #[must_use]
    pub fn with_id(id: StreamId, source: PayloadSource) -> Self {
        Self {
            id,
            content_type: None,
            source,
        }
    }

    /// Record the media type announced to the peer.
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> StreamId { self.id }

    fn describe(&self) -> StreamDescription {
        StreamDescription {
            id: self.id,
            content_type: self.content_type.clone(),
            length: self.source.length().known(),
        }
    }
}

/// Sends requests, responses and cancellations over one [`PayloadSender`].
#[derive(Clone, Debug)]
pub struct SendOperations {
    sender: PayloadSender,
}

impl SendOperations {
    /// Wrap `sender`; every operation shares its connection and queue.
    #[must_use]
    pub fn new(sender: PayloadSender) -> Self { Self { sender } }

    /// The sender the operations write through.
    #[must_use]
    pub fn sender(&self) -> &PayloadSender { &self.sender }

    /// Send `request` on `id`, followed by its content streams.
    ///
    /// Descriptions of `streams` are appended to the request body.
    ///
    /// # Errors
    ///
    /// Returns the first [`DisassemblyError`] raised by the body or any
    /// content stream.
    pub async fn send_request(
        &self,
        id: StreamId,
        mut request: RequestPayload,
        streams: Vec<ContentStream>,
    ) -> Result<(), DisassemblyError> {
        request.streams.extend(streams.iter().map(ContentStream::describe));
        Disassembler::request(self.sender.clone(), id, &request)?
            .run()
            .await?;
        self.send_streams(streams).await
    }

    /// Send `response` on `id`, followed by its content streams.
    ///
    /// # Errors
    ///
    /// Returns the first [`DisassemblyError`] raised by the body or any
    /// content stream.
    pub async fn send_response(
        &self,
        id: StreamId,
        mut response: ResponsePayload,
        streams: Vec<ContentStream>,
    ) -> Result<(), DisassemblyError> {
        response.streams.extend(streams.iter().map(ContentStream::describe));
        Disassembler::response(self.sender.clone(), id, &response)?
            .run()
            .await?;
        self.send_streams(streams).await
    }

    /// Send an empty [`PayloadType::CancelAll`] chunk for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DisassemblyError::Send`] if the chunk cannot be written.
    pub async fn send_cancel_all(&self, id: StreamId) -> Result<(), DisassemblyError> {
        self.send_control(PayloadType::CancelAll, id).await
    }

    /// Send an empty [`PayloadType::CancelStream`] chunk for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DisassemblyError::Send`] if the chunk cannot be written.
    pub async fn send_cancel_stream(&self, id: StreamId) -> Result<(), DisassemblyError> {
        self.send_control(PayloadType::CancelStream, id).await
    }

    async fn send_control(
        &self,
        payload_type: PayloadType,
        id: StreamId,
    ) -> Result<(), DisassemblyError> {
        debug!(stream_id = %id, %payload_type, "sending control chunk");
        Disassembler::new(
            self.sender.clone(),
            payload_type,
            id,
            PayloadSource::bytes(Bytes::new()),
        )
        .run()
        .await
        .map(|_| ())
    }

    async fn send_streams(&self, streams: Vec<ContentStream>) -> Result<(), DisassemblyError> {
        let runs = streams.into_iter().map(|stream| {
            Disassembler::content(self.sender.clone(), stream.id, stream.source).run()
        });
        try_join_all(runs).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use tokio_util::codec::FramedRead;

    use super::{ContentStream, SendOperations};
    use crate::{
        codec::ChunkCodec,
        disassembler::{PayloadSource, SourceLength},
        error::DisconnectReason,
        header::{PayloadType, StreamId},
        payloads::RequestPayload,
        sender::PayloadSender,
    };

    #[tokio::test]
    async fn request_announces_and_sends_content_streams() {
        let (local, remote) = tokio::io::duplex(8192);
        let sender = PayloadSender::default();
        sender.connect(local).expect("connect");
        let ops = SendOperations::new(sender.clone());

        let request_id = StreamId::from_bytes([1; 16]);
        let content_id = StreamId::from_bytes([2; 16]);
        let open_ended: &'static [u8] = b"tail";
        ops.send_request(
            request_id,
            RequestPayload::new("POST", "/upload"),
            vec![
                ContentStream::with_id(content_id, PayloadSource::bytes(&b"body"[..]))
                    .content_type("text/plain"),
                ContentStream::new(PayloadSource::reader(open_ended, SourceLength::Unknown)),
            ],
        )
        .await
        .expect("send request");
        sender.disconnect(DisconnectReason::requested("done"));

        let chunks: Vec<_> = FramedRead::new(remote, ChunkCodec::default())
            .map(|chunk| chunk.expect("decode"))
            .collect()
            .await;
        let first = &chunks[0];
        assert_eq!(first.header().payload_type(), PayloadType::Request);
        assert_eq!(first.header().stream_id(), request_id);
        let body: RequestPayload = serde_json::from_slice(first.payload()).expect("request body");
        assert_eq!(body.streams.len(), 2);
        assert_eq!(body.streams[0].id, content_id);
        assert_eq!(body.streams[0].length, Some(4));
        assert_eq!(body.streams[1].length, None);

        let content: Vec<_> = chunks
            .iter()
            .filter(|c| c.header().stream_id() == content_id)
            .collect();
        assert_eq!(content.len(), 1);
        assert_eq!(content[0].payload().as_ref(), b"body");
        assert!(content[0].header().is_end());
    }

    #[tokio::test]
    async fn cancel_chunks_are_empty_end_chunks() {
        let (local, remote) = tokio::io::duplex(256);
        let sender = PayloadSender::default();
        sender.connect(local).expect("connect");
        let ops = SendOperations::new(sender.clone());
        let id = StreamId::from_bytes([9; 16]);

        ops.send_cancel_stream(id).await.expect("cancel stream");
        ops.send_cancel_all(id).await.expect("cancel all");
        sender.disconnect(DisconnectReason::requested("done"));

        let headers: Vec<_> = FramedRead::new(remote, ChunkCodec::default())
            .map(|chunk| *chunk.expect("decode").header())
            .collect()
            .await;
        let types: Vec<_> = headers.iter().map(|h| h.payload_type()).collect();
        assert_eq!(types, vec![PayloadType::CancelStream, PayloadType::CancelAll]);
        assert!(headers.iter().all(|h| h.is_end() && h.payload_length() == 0));
    }
}
