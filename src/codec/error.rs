//! Error types for the chunk codec.
//!
//! Every variant other than [`CodecError::Io`] is a protocol violation: the
//! byte stream can no longer be trusted to sit on a chunk boundary, so the
//! receiver tears the connection down rather than trying to resynchronise.

use std::io;

use thiserror::Error;

use crate::header::HeaderError;

/// EOF reached before a chunk was complete.
///
/// A close on a chunk boundary is not an error; the decoder reports it as the
/// end of the stream.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum EofError {
    /// The peer closed the connection while a header was being read.
    #[error("premature EOF during header: {bytes_received} of {header_size} header bytes")]
    MidHeader {
        /// Header bytes received before EOF.
        bytes_received: usize,
        /// Encoded header size.
        header_size: usize,
    },

    /// The header arrived but the payload it announced did not.
    #[error("premature EOF: {bytes_received} bytes of {expected} byte chunk received")]
    MidChunk {
        /// Payload bytes received before EOF.
        bytes_received: usize,
        /// Payload length declared by the header.
        expected: usize,
    },
}

/// Top-level codec error taxonomy.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The header could not be decoded.
    #[error("malformed header: {0}")]
    Header(#[from] HeaderError),

    /// The header announced more payload than the codec accepts.
    #[error("chunk exceeds max length: {length} > {max}")]
    Oversized {
        /// Declared payload length.
        length: usize,
        /// Configured limit.
        max: usize,
    },

    /// An outbound chunk's payload does not match its header.
    #[error("payload length mismatch: header declares {declared}, payload holds {actual}")]
    LengthMismatch {
        /// Length carried by the header.
        declared: usize,
        /// Bytes actually supplied.
        actual: usize,
    },

    /// The connection closed mid-chunk.
    #[error("EOF: {0}")]
    Eof(#[from] EofError),

    /// Transport layer I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CodecError {
    /// Returns the error category as a string for logging and metrics.
    ///
    /// One of `"header"`, `"oversized"`, `"length"`, `"eof"` or `"io"`.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Header(_) => "header",
            Self::Oversized { .. } => "oversized",
            Self::LengthMismatch { .. } => "length",
            Self::Eof(_) => "eof",
            Self::Io(_) => "io",
        }
    }
}
