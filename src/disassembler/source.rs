//! Byte sources a [`Disassembler`](super::Disassembler) can slice.

use std::fmt;

use bytes::Bytes;
use tokio::io::AsyncRead;

/// Whether the total size of a payload is known before it is sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceLength {
    /// The source holds exactly this many bytes.
    Known(u64),
    /// The source ends when a read returns no bytes.
    Unknown,
}

impl SourceLength {
    /// Return the declared length, if any.
    #[must_use]
    pub fn known(self) -> Option<u64> {
        match self {
            Self::Known(len) => Some(len),
            Self::Unknown => None,
        }
    }

    #[must_use]
    pub fn is_known(self) -> bool { matches!(self, Self::Known(_)) }
}

/// Boxed asynchronous reader accepted as a payload source.
pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

/// The bytes of one logical payload.
pub enum PayloadSource {
    /// An in-memory buffer; its length is always known.
    Buffer(Bytes),
    /// An asynchronous reader with a declared or open-ended length.
    Reader {
        /// Where the bytes come from.
        reader: BoxedReader,
        /// Declared size of the reader's content.
        length: SourceLength,
    },
}

impl PayloadSource {
    /// Wrap an in-memory buffer.
    #[must_use]
    pub fn bytes(bytes: impl Into<Bytes>) -> Self { Self::Buffer(bytes.into()) }

    /// Wrap a reader.
    ///
    /// With [`SourceLength::Known`] the disassembler reads exactly that many
    /// bytes; with [`SourceLength::Unknown`] it reads until end of stream.
    #[must_use]
    pub fn reader(reader: impl AsyncRead + Send + Unpin + 'static, length: SourceLength) -> Self {
        Self::Reader {
            reader: Box::new(reader),
            length,
        }
    }

    /// Length fixed when the source was built.
    #[must_use]
    pub fn length(&self) -> SourceLength {
        match self {
            Self::Buffer(bytes) => SourceLength::Known(bytes.len() as u64),
            Self::Reader { length, .. } => *length,
        }
    }
}

impl fmt::Debug for PayloadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffer(bytes) => f.debug_tuple("Buffer").field(&bytes.len()).finish(),
            Self::Reader { length, .. } => f
                .debug_struct("Reader")
                .field("length", length)
                .finish_non_exhaustive(),
        }
    }
}

impl From<Bytes> for PayloadSource {
    fn from(bytes: Bytes) -> Self { Self::Buffer(bytes) }
}

impl From<Vec<u8>> for PayloadSource {
    fn from(bytes: Vec<u8>) -> Self { Self::Buffer(bytes.into()) }
}
