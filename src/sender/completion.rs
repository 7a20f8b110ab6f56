//! Per-chunk completion signalling.

use std::{
    fmt,
    pin::Pin,
    task::{Context, Poll},
};

use tokio::sync::oneshot;

use crate::{error::SendError, header::Header};

type CompletionFn = Box<dyn FnOnce(Result<(), SendError>) + Send>;

/// Resolves a chunk's completion exactly once.
///
/// Dropping an unresolved slot reports [`SendError::NotConnected`], so a chunk
/// discarded during teardown still reaches its caller.
pub(crate) struct CompletionSlot(Option<CompletionFn>);

impl CompletionSlot {
    pub(crate) fn new(f: impl FnOnce(Result<(), SendError>) + Send + 'static) -> Self {
        Self(Some(Box::new(f)))
    }

    pub(crate) fn complete(mut self, result: Result<(), SendError>) {
        if let Some(f) = self.0.take() {
            f(result);
        }
    }
}

impl Drop for CompletionSlot {
    fn drop(&mut self) {
        if let Some(f) = self.0.take() {
            f(Err(SendError::NotConnected));
        }
    }
}

impl fmt::Debug for CompletionSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CompletionSlot")
            .field(&self.0.is_some())
            .finish()
    }
}

/// Future resolving once a queued chunk has been flushed or has failed.
///
/// Returned by [`PayloadSender::enqueue`](super::PayloadSender::enqueue).
#[derive(Debug)]
#[must_use = "a completion does nothing unless awaited"]
pub struct Completion {
    header: Header,
    rx: oneshot::Receiver<Result<(), SendError>>,
}

impl Completion {
    pub(crate) fn channel(header: Header) -> (Self, CompletionSlot) {
        let (tx, rx) = oneshot::channel();
        let slot = CompletionSlot::new(move |result| {
            let _ = tx.send(result);
        });
        (Self { header, rx }, slot)
    }

    /// Header of the chunk this completion tracks.
    pub fn header(&self) -> &Header { &self.header }
}

impl Future for Completion {
    type Output = Result<(), SendError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(SendError::NotConnected)))
    }
}
