//! Fixed binary envelope preceding every chunk on the wire.
//!
//! ```text
//! +------+----------------+------------------+-----+--------------------+
//! | type | stream id      | payload length   | end | payload            |
//! | u8   | 16 bytes       | u32, big-endian  | u8  | payload length     |
//! +------+----------------+------------------+-----+--------------------+
//! ```
//!
//! The layout carries no version field; a sender and receiver are expected to
//! come from the same build of this crate.

mod id;
mod payload_type;

use bytes::{BufMut, BytesMut};
use thiserror::Error;

pub use id::StreamId;
pub use payload_type::PayloadType;

use crate::byte_order::{read_network_u32, write_network_u32};

/// Encoded size of a [`Header`] in bytes.
pub const HEADER_LEN: usize = 1 + StreamId::LEN + 4 + 1;

const ID_OFFSET: usize = 1;
const LENGTH_OFFSET: usize = ID_OFFSET + StreamId::LEN;
const END_OFFSET: usize = LENGTH_OFFSET + 4;

/// Errors raised while decoding a [`Header`].
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum HeaderError {
    /// Fewer than [`HEADER_LEN`] bytes were supplied.
    #[error("truncated header: have {have} bytes, need {need}")]
    Truncated {
        /// Bytes available.
        have: usize,
        /// Bytes required.
        need: usize,
    },
    /// The type tag does not name a [`PayloadType`].
    #[error("unknown payload type tag {0:#04x}")]
    UnknownType(u8),
    /// The end flag was neither 0 nor 1.
    #[error("invalid end flag {0:#04x}")]
    InvalidEndFlag(u8),
}

/// Header describing a single chunk.
///
/// # Examples
///
/// ```
/// use streamframe::header::{HEADER_LEN, Header, PayloadType, StreamId};
///
/// let header = Header::new(PayloadType::Stream, StreamId::from_bytes([1; 16]), 4, true);
/// let wire = header.to_bytes();
/// assert_eq!(wire.len(), HEADER_LEN);
/// assert_eq!(Header::decode(&wire), Ok(header));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Header {
    payload_type: PayloadType,
    stream_id: StreamId,
    payload_length: u32,
    end: bool,
}

impl Header {
    /// Create a new header.
    #[must_use]
    pub const fn new(
        payload_type: PayloadType,
        stream_id: StreamId,
        payload_length: u32,
        end: bool,
    ) -> Self {
        Self {
            payload_type,
            stream_id,
            payload_length,
            end,
        }
    }

    #[must_use]
    pub const fn payload_type(&self) -> PayloadType { self.payload_type }

    #[must_use]
    pub const fn stream_id(&self) -> StreamId { self.stream_id }

    /// Exact number of payload bytes following this header.
    #[must_use]
    pub const fn payload_length(&self) -> u32 { self.payload_length }

    /// Report whether this is the final chunk of its stream.
    #[must_use]
    pub const fn is_end(&self) -> bool { self.end }

    /// Append the encoded header to `dst`.
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(HEADER_LEN);
        dst.put_u8(self.payload_type.tag());
        dst.put_slice(self.stream_id.as_bytes());
        dst.put_slice(&write_network_u32(self.payload_length));
        dst.put_u8(u8::from(self.end));
    }

    /// Encode the header into a fixed-size array.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0_u8; HEADER_LEN];
        out[0] = self.payload_type.tag();
        out[ID_OFFSET..LENGTH_OFFSET].copy_from_slice(self.stream_id.as_bytes());
        out[LENGTH_OFFSET..END_OFFSET].copy_from_slice(&write_network_u32(self.payload_length));
        out[END_OFFSET] = u8::from(self.end);
        out
    }

    /// Decode a header from the first [`HEADER_LEN`] bytes of `src`.
    ///
    /// Trailing bytes beyond the header are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::Truncated`] when `src` is too short,
    /// [`HeaderError::UnknownType`] for an unrecognised type tag and
    /// [`HeaderError::InvalidEndFlag`] when the end byte is not 0 or 1.
    pub fn decode(src: &[u8]) -> Result<Self, HeaderError> {
        let Some(raw) = src.get(..HEADER_LEN) else {
            return Err(HeaderError::Truncated {
                have: src.len(),
                need: HEADER_LEN,
            });
        };

        let tag = raw[0];
        let payload_type = PayloadType::from_tag(tag).ok_or(HeaderError::UnknownType(tag))?;

        let mut id = [0_u8; StreamId::LEN];
        id.copy_from_slice(&raw[ID_OFFSET..LENGTH_OFFSET]);

        let mut length = [0_u8; 4];
        length.copy_from_slice(&raw[LENGTH_OFFSET..END_OFFSET]);

        let end = match raw[END_OFFSET] {
            0 => false,
            1 => true,
            other => return Err(HeaderError::InvalidEndFlag(other)),
        };

        Ok(Self::new(
            payload_type,
            StreamId::from_bytes(id),
            read_network_u32(length),
            end,
        ))
    }
}

#[cfg(test)]
mod tests;
