use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of payload a chunk belongs to.
///
/// `CancelAll` and `CancelStream` are control types. The framing layer moves
/// them like any other chunk and leaves their meaning to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayloadType {
    /// Structured request envelope.
    Request,
    /// Structured response envelope.
    Response,
    /// Raw content stream attached to a request or response.
    Stream,
    /// Control: abandon every stream on the connection.
    CancelAll,
    /// Control: abandon one stream.
    CancelStream,
}

impl PayloadType {
    /// Every payload type, in tag order.
    pub const ALL: [Self; 5] = [
        Self::Request,
        Self::Response,
        Self::Stream,
        Self::CancelAll,
        Self::CancelStream,
    ];

    /// One-byte wire tag.
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::Request => b'A',
            Self::Response => b'B',
            Self::Stream => b'S',
            Self::CancelAll => b'X',
            Self::CancelStream => b'C',
        }
    }

    /// Parse a wire tag, returning `None` for unknown values.
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            b'A' => Some(Self::Request),
            b'B' => Some(Self::Response),
            b'S' => Some(Self::Stream),
            b'X' => Some(Self::CancelAll),
            b'C' => Some(Self::CancelStream),
            _ => None,
        }
    }

    /// Whether the type is a control signal rather than payload data.
    #[must_use]
    pub const fn is_control(self) -> bool { matches!(self, Self::CancelAll | Self::CancelStream) }
}

impl fmt::Display for PayloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Request => "request",
            Self::Response => "response",
            Self::Stream => "stream",
            Self::CancelAll => "cancel-all",
            Self::CancelStream => "cancel-stream",
        };
        f.write_str(name)
    }
}
