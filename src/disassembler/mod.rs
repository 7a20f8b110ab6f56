//! Outbound helper that slices one logical payload into ordered chunks.
//!
//! A [`Disassembler`] owns a single [`StreamId`] and [`PayloadType`] for its
//! whole life. [`next_chunk`](Disassembler::next_chunk) produces the next
//! `(header, bytes)` pair; [`run`](Disassembler::run) drives it to completion
//! through a [`PayloadSender`], keeping at most one send outstanding so
//! chunks of the stream reach the wire in order.
//!
//! Exactly one chunk of every stream carries `end = true`, and it is the last
//! one produced. An empty payload with a known length is sent as a single
//! empty end chunk.

mod source;

use std::{io, num::NonZeroUsize};

use bytes::{Bytes, BytesMut};
use serde::Serialize;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tracing::debug;

pub use source::{BoxedReader, PayloadSource, SourceLength};

use crate::{
    error::SendError,
    header::{Header, PayloadType, StreamId},
    payloads::{RequestPayload, ResponsePayload},
    sender::PayloadSender,
};

/// Errors raised while disassembling a payload.
#[derive(Debug, Error)]
pub enum DisassemblyError {
    /// Sending a chunk failed.
    #[error("failed to send chunk: {0}")]
    Send(#[from] SendError),
    /// Reading from the source failed.
    #[error("failed to read payload source: {0}")]
    Source(#[from] io::Error),
    /// The source ended before its declared length.
    #[error("payload source ended after {received} of {expected} bytes")]
    SourceTruncated {
        /// Declared length.
        expected: u64,
        /// Bytes produced before the source ended.
        received: u64,
    },
    /// A structured payload could not be serialised.
    #[error("failed to serialise payload: {0}")]
    Serialize(#[from] serde_json::Error),
    /// The chunk size exceeds what one chunk may carry.
    #[error("chunk size {length} exceeds the limit of {max} bytes")]
    ChunkTooLarge {
        /// Size of the offending chunk.
        length: usize,
        /// Largest chunk the sender's configuration allows.
        max: usize,
    },
}

/// Slices one payload into chunks for a single stream id.
#[derive(Debug)]
pub struct Disassembler {
    sender: PayloadSender,
    payload_type: PayloadType,
    stream_id: StreamId,
    source: PayloadSource,
    length: SourceLength,
    chunk_size: NonZeroUsize,
    produced: u64,
    finished: bool,
}

impl Disassembler {
    /// Create a disassembler for `source` using the sender's chunk size.
    #[must_use]
    pub fn new(
        sender: PayloadSender,
        payload_type: PayloadType,
        stream_id: StreamId,
        source: PayloadSource,
    ) -> Self {
        let chunk_size = sender.config().max_chunk_size();
        let length = source.length();
        Self {
            sender,
            payload_type,
            stream_id,
            source,
            length,
            chunk_size,
            produced: 0,
            finished: false,
        }
    }

    /// Disassemble a request body serialised as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`DisassemblyError::Serialize`] if the request cannot be
    /// serialised.
    pub fn request(
        sender: PayloadSender,
        stream_id: StreamId,
        request: &RequestPayload,
    ) -> Result<Self, DisassemblyError> {
        Self::json(sender, PayloadType::Request, stream_id, request)
    }

    /// Disassemble a response body serialised as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`DisassemblyError::Serialize`] if the response cannot be
    /// serialised.
    pub fn response(
        sender: PayloadSender,
        stream_id: StreamId,
        response: &ResponsePayload,
    ) -> Result<Self, DisassemblyError> {
        Self::json(sender, PayloadType::Response, stream_id, response)
    }

    /// Disassemble raw content on a [`PayloadType::Stream`] stream.
    #[must_use]
    pub fn content(sender: PayloadSender, stream_id: StreamId, source: PayloadSource) -> Self {
        Self::new(sender, PayloadType::Stream, stream_id, source)
    }

    fn json<T: Serialize>(
        sender: PayloadSender,
        payload_type: PayloadType,
        stream_id: StreamId,
        body: &T,
    ) -> Result<Self, DisassemblyError> {
        let bytes = serde_json::to_vec(body)?;
        Ok(Self::new(
            sender,
            payload_type,
            stream_id,
            PayloadSource::from(bytes),
        ))
    }

    /// Override the number of payload bytes placed in each chunk.
    ///
    /// The size is checked against the sender's `max_chunk_length` when the
    /// first chunk is produced.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: NonZeroUsize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    #[must_use]
    pub fn payload_type(&self) -> PayloadType { self.payload_type }

    #[must_use]
    pub fn stream_id(&self) -> StreamId { self.stream_id }

    /// Length declared by the source.
    #[must_use]
    pub fn length(&self) -> SourceLength { self.length }

    /// Payload bytes produced so far.
    #[must_use]
    pub fn produced(&self) -> u64 { self.produced }

    /// Produce the next chunk, or `None` once the end chunk has been produced.
    ///
    /// # Errors
    ///
    /// Returns [`DisassemblyError::Source`] if the reader fails,
    /// [`DisassemblyError::SourceTruncated`] if a known-length reader ends
    /// early and [`DisassemblyError::ChunkTooLarge`] if the chunk size exceeds
    /// the sender's `max_chunk_length`.
    pub async fn next_chunk(&mut self) -> Result<Option<(Header, Bytes)>, DisassemblyError> {
        if self.finished {
            return Ok(None);
        }
        let chunk_size = self.chunk_size.get();
        let max = self.chunk_limit();
        if chunk_size > max {
            return Err(DisassemblyError::ChunkTooLarge {
                length: chunk_size,
                max,
            });
        }
        let (bytes, end) = match &mut self.source {
            PayloadSource::Buffer(remaining) => {
                let take = chunk_size.min(remaining.len());
                let bytes = remaining.split_to(take);
                (bytes, remaining.is_empty())
            }
            PayloadSource::Reader {
                reader,
                length: SourceLength::Known(total),
            } => {
                let total = *total;
                let left = total - self.produced;
                let want = usize::try_from(left).map_or(chunk_size, |left| left.min(chunk_size));
                let (bytes, eof) = fill(reader, want).await?;
                if eof {
                    return Err(DisassemblyError::SourceTruncated {
                        expected: total,
                        received: self.produced + bytes.len() as u64,
                    });
                }
                let end = self.produced + bytes.len() as u64 == total;
                (bytes, end)
            }
            PayloadSource::Reader {
                reader,
                length: SourceLength::Unknown,
            } => fill(reader, chunk_size).await?,
        };

        let payload_length =
            u32::try_from(bytes.len()).map_err(|_| DisassemblyError::ChunkTooLarge {
                length: bytes.len(),
                max,
            })?;
        self.produced += u64::from(payload_length);
        self.finished = end;
        Ok(Some((
            Header::new(self.payload_type, self.stream_id, payload_length, end),
            bytes,
        )))
    }

    fn chunk_limit(&self) -> usize {
        let header_limit = usize::try_from(u32::MAX).unwrap_or(usize::MAX);
        self.sender.config().max_chunk_length().min(header_limit)
    }

    /// Send every chunk through the sender, returning the payload bytes sent.
    ///
    /// Each chunk is flushed before the next is read, so a slow connection
    /// applies backpressure to the source.
    ///
    /// # Errors
    ///
    /// Returns the first source or send failure. Chunks already sent are not
    /// retracted; the receiver abandons the partial stream when the
    /// connection ends.
    pub async fn run(mut self) -> Result<u64, DisassemblyError> {
        let mut chunks = 0_u64;
        while let Some((header, bytes)) = self.next_chunk().await? {
            self.sender.send_payload(header, bytes, self.length).await?;
            chunks += 1;
        }
        debug!(
            stream_id = %self.stream_id,
            payload_type = %self.payload_type,
            bytes = self.produced,
            chunks,
            "payload disassembled"
        );
        Ok(self.produced)
    }
}

/// Read until `want` bytes are buffered or the reader reports end of stream.
///
/// Returns the bytes read and whether end of stream was reached first.
async fn fill(reader: &mut BoxedReader, want: usize) -> io::Result<(Bytes, bool)> {
    let mut buf = BytesMut::zeroed(want);
    let mut filled = 0;
    while filled < want {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            buf.truncate(filled);
            return Ok((buf.freeze(), true));
        }
        filled += n;
    }
    Ok((buf.freeze(), false))
}
