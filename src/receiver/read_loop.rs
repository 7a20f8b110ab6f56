//! The read loop: sole reader of the connection's read half.

use std::sync::Weak;

use futures::StreamExt;
use tokio_util::codec::FramedRead;
use tracing::{debug, trace, warn};

use super::{ReceiverShared, lock};
use crate::{
    codec::{Chunk, ChunkCodec},
    error::DisconnectReason,
    link::LinkHandle,
    metrics::{self, Direction},
    panic::catch_callback,
    transport::TransportRead,
};

enum Dispatch {
    Delivered,
    Stopped,
    Panicked(String),
}

/// Hand one chunk to the subscribed handler.
///
/// The handler lock is held for the whole chunk, and the cancellation check
/// happens under it, so no chunk is delivered once `on_disconnect` has run.
fn dispatch(shared: &ReceiverShared, link: &LinkHandle, chunk: Chunk) -> Dispatch {
    let mut slot = lock(&shared.handler);
    if link.shutdown().is_cancelled() {
        return Dispatch::Stopped;
    }
    let Some(handler) = slot.as_mut() else {
        return Dispatch::Stopped;
    };
    let (header, payload) = chunk.into_parts();
    let bytes_read = payload.len();
    let outcome = catch_callback(|| {
        handler.get_sink(&header).write_chunk(payload);
        handler.on_chunk(&header, bytes_read);
    });
    match outcome {
        Ok(()) => {
            trace!(
                stream_id = %header.stream_id(),
                payload_type = %header.payload_type(),
                bytes_read,
                end = header.is_end(),
                "chunk delivered"
            );
            metrics::inc_chunks(Direction::Inbound);
            Dispatch::Delivered
        }
        Err(panic) => Dispatch::Panicked(panic),
    }
}

/// Decode chunks from `reader` until the link ends.
///
/// A clean close, a decode failure or a panicking handler tears the link down
/// with the matching [`DisconnectReason`]. Nothing escapes the loop.
pub(super) async fn run_read_loop<R: TransportRead>(
    reader: R,
    link: LinkHandle,
    shared: Weak<ReceiverShared>,
) {
    let max_chunk_length = match shared.upgrade() {
        Some(shared) => shared.config.max_chunk_length(),
        None => return,
    };
    let mut framed = FramedRead::new(reader, ChunkCodec::new(max_chunk_length));
    let shutdown = link.shutdown().clone();

    let reason = loop {
        let next = tokio::select! {
            biased;
            () = shutdown.cancelled() => return,
            next = framed.next() => next,
        };
        let chunk = match next {
            None => break DisconnectReason::PeerClosed,
            Some(Err(err)) => {
                debug!(error = %err, "chunk decode failed");
                break DisconnectReason::from_codec(err);
            }
            Some(Ok(chunk)) => chunk,
        };
        let Some(shared) = shared.upgrade() else {
            return;
        };
        match dispatch(&shared, &link, chunk) {
            Dispatch::Delivered => {}
            Dispatch::Stopped => return,
            Dispatch::Panicked(panic) => {
                warn!(panic = %panic, "frame handler panicked");
                break DisconnectReason::HandlerPanicked(panic);
            }
        }
    };

    let Some(shared) = shared.upgrade() else {
        return;
    };
    let graceful = reason.is_graceful();
    let message = reason.to_string();
    if shared.shut_down(Some(link.generation()), reason) {
        if graceful {
            log::info!("payload receiver disconnected: reason={message}");
        } else {
            log::warn!("payload receiver disconnected: reason={message}");
        }
    }
}
