//! Raw wire capture and decoding.

use bytes::{Bytes, BytesMut};
use streamframe::{Chunk, ChunkCodec, CodecError, Header, PayloadSender};
use tokio::{io::AsyncReadExt, task::JoinHandle};
use tokio_util::codec::{Decoder, Encoder};

/// Encode one chunk exactly as a sender would write it.
///
/// # Panics
///
/// Panics if `payload` does not match the header's declared length.
#[must_use]
pub fn encode_chunk(header: Header, payload: impl Into<Bytes>) -> Vec<u8> {
    let mut buf = BytesMut::new();
    ChunkCodec::default()
        .encode(Chunk::new(header, payload.into()), &mut buf)
        .expect("payload matches header length");
    buf.to_vec()
}

/// Decode a complete capture into chunks.
///
/// # Errors
///
/// Returns the first [`CodecError`], including an EOF error when the capture
/// ends inside a chunk.
pub fn decode_chunks(bytes: &[u8]) -> Result<Vec<Chunk>, CodecError> {
    let mut codec = ChunkCodec::default();
    let mut buf = BytesMut::from(bytes);
    let mut chunks = Vec::new();
    while let Some(chunk) = codec.decode(&mut buf)? {
        chunks.push(chunk);
    }
    if let Some(chunk) = codec.decode_eof(&mut buf)? {
        chunks.push(chunk);
    }
    Ok(chunks)
}

/// Connect `sender` to an in-memory pipe and collect everything it writes.
///
/// The returned task completes once the sender disconnects.
///
/// # Panics
///
/// Panics if the sender is already connected or if called outside a Tokio
/// runtime.
#[must_use]
pub fn capture_wire(sender: &PayloadSender, capacity: usize) -> JoinHandle<Vec<u8>> {
    let (local, mut remote) = tokio::io::duplex(capacity);
    sender.connect(local).expect("sender is not yet connected");
    tokio::spawn(async move {
        let mut captured = Vec::new();
        let _ = remote.read_to_end(&mut captured).await;
        captured
    })
}
