//! Chunk codec used by the sender and receiver.
//!
//! [`ChunkCodec`] plugs the fixed [`Header`] layout into `tokio_util`'s
//! `Decoder`/`Encoder` traits so both halves of the transport can run on
//! `FramedWrite`/`FramedRead`. Each encoded chunk is the header immediately
//! followed by its payload, written into a single buffer so no other chunk's
//! bytes can land between them.

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::header::{HEADER_LEN, Header};

pub mod error;

pub use error::{CodecError, EofError};

/// Largest payload length the decoder accepts by default (16 MiB).
pub const MAX_CHUNK_LENGTH: usize = 16 * 1024 * 1024;

/// A header together with exactly `payload_length` bytes of payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    header: Header,
    payload: Bytes,
}

impl Chunk {
    /// Pair a header with its payload.
    ///
    /// The payload length is checked when the chunk is encoded.
    #[must_use]
    pub fn new(header: Header, payload: Bytes) -> Self { Self { header, payload } }

    #[must_use]
    pub fn header(&self) -> &Header { &self.header }

    #[must_use]
    pub fn payload(&self) -> &Bytes { &self.payload }

    /// Consume the chunk, returning its components.
    #[must_use]
    pub fn into_parts(self) -> (Header, Bytes) { (self.header, self.payload) }
}

pub(crate) fn declared_len(header: &Header) -> usize {
    usize::try_from(header.payload_length()).unwrap_or(usize::MAX)
}

/// Stateful decoder and encoder for [`Chunk`]s.
///
/// The decoder remembers a header it has already consumed while it waits for
/// the rest of the payload, so a slow peer never causes the header to be parsed
/// twice.
#[derive(Clone, Debug)]
pub struct ChunkCodec {
    max_chunk_length: usize,
    pending: Option<Header>,
}

impl ChunkCodec {
    /// Construct a codec that rejects payloads longer than `max_chunk_length`.
    #[must_use]
    pub fn new(max_chunk_length: usize) -> Self {
        Self {
            max_chunk_length,
            pending: None,
        }
    }

    /// Return the maximum payload length accepted by the decoder.
    #[must_use]
    pub fn max_chunk_length(&self) -> usize { self.max_chunk_length }

    fn eof_error(&self, src: &BytesMut) -> EofError {
        match &self.pending {
            Some(header) => EofError::MidChunk {
                bytes_received: src.len(),
                expected: declared_len(header),
            },
            None => EofError::MidHeader {
                bytes_received: src.len(),
                header_size: HEADER_LEN,
            },
        }
    }
}

impl Default for ChunkCodec {
    fn default() -> Self { Self::new(MAX_CHUNK_LENGTH) }
}

impl Decoder for ChunkCodec {
    type Item = Chunk;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let header = if let Some(header) = self.pending {
            header
        } else {
            if src.len() < HEADER_LEN {
                src.reserve(HEADER_LEN - src.len());
                return Ok(None);
            }
            let header = Header::decode(src)?;
            let length = declared_len(&header);
            if length > self.max_chunk_length {
                return Err(CodecError::Oversized {
                    length,
                    max: self.max_chunk_length,
                });
            }
            src.advance(HEADER_LEN);
            self.pending = Some(header);
            header
        };

        let length = declared_len(&header);
        if src.len() < length {
            src.reserve(length - src.len());
            return Ok(None);
        }

        self.pending = None;
        let payload = src.split_to(length).freeze();
        Ok(Some(Chunk::new(header, payload)))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(chunk) = self.decode(src)? {
            return Ok(Some(chunk));
        }
        if src.is_empty() && self.pending.is_none() {
            return Ok(None);
        }
        let err = self.eof_error(src);
        tracing::debug!(error = %err, "connection closed inside a chunk");
        Err(err.into())
    }
}

impl Encoder<Chunk> for ChunkCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Chunk, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (header, payload) = item.into_parts();
        let declared = declared_len(&header);
        if declared != payload.len() {
            return Err(CodecError::LengthMismatch {
                declared,
                actual: payload.len(),
            });
        }
        dst.reserve(HEADER_LEN + payload.len());
        header.encode(dst);
        dst.extend_from_slice(&payload);
        Ok(())
    }
}
