//! Canonical error types shared by the sender and receiver.
//!
//! Transport failures never surface as errors from the read loop or writer
//! task. They end the connection and are reported once through the
//! disconnect observers as a [`DisconnectReason`]. Per-chunk send failures
//! are reported through [`SendError`] to whoever enqueued the chunk.

use std::{io, sync::Arc};

use thiserror::Error;

use crate::codec::CodecError;

/// Errors returned when binding a sender or receiver.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ConnectError {
    /// A connection is already bound; disconnect it first.
    #[error("already connected")]
    AlreadyConnected,
    /// The receiver has no registered frame handler.
    #[error("no frame handler subscribed")]
    NoSubscriber,
    /// The frame handler cannot be replaced while the read loop owns it.
    #[error("frame handler is in use by an active connection")]
    SubscriberBusy,
}

/// Why a connection was torn down.
///
/// Observers receive exactly one reason per connection, however many streams
/// were open at the time.
#[derive(Clone, Debug, Error)]
pub enum DisconnectReason {
    /// The local side called `disconnect`.
    #[error("disconnect requested: {0}")]
    Requested(String),
    /// The peer closed the connection on a chunk boundary.
    #[error("peer closed the connection")]
    PeerClosed,
    /// Reading from or writing to the connection failed.
    #[error("transport error: {0}")]
    Io(Arc<io::Error>),
    /// The peer sent bytes that do not decode as a chunk.
    #[error("protocol violation: {0}")]
    Protocol(Arc<CodecError>),
    /// A frame handler callback panicked on the read loop.
    #[error("frame handler panicked: {0}")]
    HandlerPanicked(String),
}

impl DisconnectReason {
    /// Build a [`DisconnectReason::Requested`] from any message.
    #[must_use]
    pub fn requested(message: impl Into<String>) -> Self { Self::Requested(message.into()) }

    /// Classify a codec failure, separating I/O errors from protocol violations.
    #[must_use]
    pub fn from_codec(error: CodecError) -> Self {
        match error {
            CodecError::Io(io) => Self::Io(Arc::new(io)),
            other => Self::Protocol(Arc::new(other)),
        }
    }

    /// Whether the connection ended without any fault.
    #[must_use]
    pub fn is_graceful(&self) -> bool { matches!(self, Self::Requested(_) | Self::PeerClosed) }
}

/// Failure to transmit one chunk.
#[derive(Clone, Debug, Error)]
pub enum SendError {
    /// The sender is not connected, or disconnected before the chunk was
    /// written.
    #[error("sender is not connected")]
    NotConnected,
    /// The payload does not match the header's declared length.
    #[error("payload length mismatch: header declares {declared}, payload holds {actual}")]
    LengthMismatch {
        /// Length carried by the header.
        declared: usize,
        /// Bytes actually supplied.
        actual: usize,
    },
    /// The payload is longer than the peer accepts in one chunk.
    #[error("chunk of {length} bytes exceeds max chunk length {max}")]
    ChunkTooLarge {
        /// Length carried by the header.
        length: usize,
        /// Configured [`max_chunk_length`](crate::config::TransportConfig::max_chunk_length).
        max: usize,
    },
    /// Writing the chunk to the connection failed.
    #[error("write failed: {0}")]
    Io(Arc<io::Error>),
}

impl From<CodecError> for SendError {
    fn from(error: CodecError) -> Self {
        match error {
            CodecError::LengthMismatch { declared, actual } => {
                Self::LengthMismatch { declared, actual }
            }
            CodecError::Io(io) => Self::Io(Arc::new(io)),
            other => Self::Io(Arc::new(io::Error::other(other))),
        }
    }
}
