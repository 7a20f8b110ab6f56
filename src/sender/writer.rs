//! The writer task: sole owner of the connection's write half.

use std::sync::Weak;

use futures::SinkExt;
use tokio::{io::AsyncWriteExt, sync::mpsc};
use tokio_util::codec::FramedWrite;
use tracing::{debug, trace};

use super::{Outbound, SenderShared};
use crate::{
    codec::ChunkCodec,
    error::{DisconnectReason, SendError},
    link::LinkHandle,
    metrics::{self, Direction},
    transport::TransportWrite,
};

/// Drain the outbound queue onto `writer` until the link is torn down.
///
/// One chunk is written and flushed at a time, in queue order. When the link
/// ends every chunk still queued is failed with [`SendError::NotConnected`]
/// and the write half is shut down.
pub(super) async fn run_writer<W: TransportWrite>(
    writer: W,
    mut rx: mpsc::Receiver<Outbound>,
    link: LinkHandle,
    shared: Weak<SenderShared>,
) {
    let mut framed = FramedWrite::new(writer, ChunkCodec::default());
    let shutdown = link.shutdown().clone();

    loop {
        let next = tokio::select! {
            biased;
            () = shutdown.cancelled() => None,
            next = rx.recv() => next,
        };
        let Some(Outbound {
            chunk,
            length,
            completion,
        }) = next
        else {
            break;
        };

        let header = *chunk.header();
        let result = tokio::select! {
            biased;
            () = shutdown.cancelled() => Err(SendError::NotConnected),
            res = framed.send(chunk) => res.map_err(SendError::from),
        };

        match result {
            Ok(()) => {
                trace!(
                    stream_id = %header.stream_id(),
                    payload_type = %header.payload_type(),
                    payload_length = header.payload_length(),
                    end = header.is_end(),
                    ?length,
                    "chunk written"
                );
                metrics::inc_chunks(Direction::Outbound);
                completion.complete(Ok(()));
            }
            Err(err) => {
                debug!(stream_id = %header.stream_id(), error = %err, "chunk write failed");
                completion.complete(Err(err.clone()));
                match err {
                    // Rejected before any byte reached the buffer.
                    SendError::LengthMismatch { .. } | SendError::ChunkTooLarge { .. } => {}
                    SendError::NotConnected => break,
                    SendError::Io(io) => {
                        let torn_down = shared.upgrade().is_some_and(|shared| {
                            shared
                                .link
                                .teardown(Some(link.generation()), DisconnectReason::Io(io))
                        });
                        if torn_down {
                            metrics::inc_disconnects();
                            log::warn!("payload sender lost connection: write failed");
                        }
                        break;
                    }
                }
            }
        }
    }

    rx.close();
    let mut abandoned = 0_usize;
    while let Some(outbound) = rx.recv().await {
        outbound.completion.complete(Err(SendError::NotConnected));
        abandoned += 1;
    }
    if abandoned > 0 {
        debug!(abandoned, "failed queued chunks after disconnect");
    }

    if let Err(err) = framed.into_inner().shutdown().await {
        debug!(error = %err, "error closing write half");
    }
}
