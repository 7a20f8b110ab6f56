use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier scoping every chunk that belongs to one logical payload.
///
/// Stream ids are 128-bit values so independent producers can mint them
/// without coordination. An id must not be reused while a stream carrying it
/// is still being disassembled or assembled on the same connection.
///
/// # Examples
///
/// ```
/// use streamframe::header::StreamId;
///
/// let id = StreamId::from_bytes([7; 16]);
/// assert_eq!(id.as_bytes(), &[7; 16]);
/// assert_ne!(StreamId::random(), StreamId::random());
/// ```
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into, Serialize,
    Deserialize,
)]
#[display("{_0}")]
#[serde(transparent)]
pub struct StreamId(Uuid);

impl StreamId {
    /// Number of bytes a stream id occupies on the wire.
    pub const LEN: usize = 16;

    /// Mint a fresh random identifier.
    #[must_use]
    pub fn random() -> Self { Self(Uuid::new_v4()) }

    /// Build an identifier from its wire representation.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; Self::LEN]) -> Self { Self(Uuid::from_bytes(bytes)) }

    /// Borrow the wire representation.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; Self::LEN] { self.0.as_bytes() }

    /// Return the identifier as a UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid { self.0 }
}
