//! Structured bodies carried by request and response streams.
//!
//! A request or response travels as a JSON document on its own stream id.
//! Bulk content referenced by the document travels on separate
//! [`PayloadType::Stream`](crate::header::PayloadType::Stream) streams, each
//! announced by a [`StreamDescription`].

use serde::{Deserialize, Serialize};

use crate::header::StreamId;

/// Announces a content stream that accompanies a request or response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamDescription {
    /// Stream id the content will be sent on.
    pub id: StreamId,
    /// Media type of the content, when known.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Content length in bytes, when known up front.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,
}

impl StreamDescription {
    /// Describe a stream of unknown type and length.
    #[must_use]
    pub fn new(id: StreamId) -> Self {
        Self {
            id,
            content_type: None,
            length: None,
        }
    }

    /// Attach a media type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Attach a known length.
    #[must_use]
    pub fn with_length(mut self, length: u64) -> Self {
        self.length = Some(length);
        self
    }
}

/// Body of a request stream.
///
/// # Examples
///
/// ```
/// use streamframe::payloads::RequestPayload;
///
/// let request = RequestPayload::new("POST", "/api/messages");
/// let json = serde_json::to_string(&request).expect("serialise");
/// assert_eq!(json, r#"{"verb":"POST","path":"/api/messages"}"#);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPayload {
    /// Request method.
    pub verb: String,
    /// Request target.
    pub path: String,
    /// Content streams sent alongside the request.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub streams: Vec<StreamDescription>,
}

impl RequestPayload {
    /// Build a request without content streams.
    #[must_use]
    pub fn new(verb: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            verb: verb.into(),
            path: path.into(),
            streams: Vec::new(),
        }
    }

    /// Announce a content stream.
    #[must_use]
    pub fn with_stream(mut self, stream: StreamDescription) -> Self {
        self.streams.push(stream);
        self
    }
}

/// Body of a response stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePayload {
    /// Status code of the response.
    pub status_code: u16,
    /// Content streams sent alongside the response.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub streams: Vec<StreamDescription>,
}

impl ResponsePayload {
    /// Build a response without content streams.
    #[must_use]
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            streams: Vec::new(),
        }
    }

    /// Announce a content stream.
    #[must_use]
    pub fn with_stream(mut self, stream: StreamDescription) -> Self {
        self.streams.push(stream);
        self
    }
}
