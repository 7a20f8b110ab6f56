//! Connection state shared by the sender and receiver.
//!
//! Each half tracks at most one bound connection. Binding stores an
//! [`ActiveLink`] in the slot; tearing down takes it out again. Whoever takes
//! the link records the reason, cancels the background task and notifies the
//! observers, so a connection is reported as lost exactly once no matter how
//! many parties race to disconnect it.

use std::sync::{
    Arc,
    Mutex,
    MutexGuard,
    OnceLock,
    PoisonError,
    atomic::{AtomicU64, Ordering},
};

use tokio_util::sync::CancellationToken;

use crate::{
    error::{ConnectError, DisconnectReason},
    panic::catch_callback,
};

/// Callback invoked once per lost connection.
pub(crate) type DisconnectObserver = Arc<dyn Fn(&DisconnectReason) + Send + Sync>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct ActiveLink<T> {
    generation: u64,
    shutdown: CancellationToken,
    reason: Arc<OnceLock<DisconnectReason>>,
    resources: T,
}

/// Task-side view of a bound connection.
#[derive(Clone)]
pub(crate) struct LinkHandle {
    generation: u64,
    shutdown: CancellationToken,
    reason: Arc<OnceLock<DisconnectReason>>,
}

impl LinkHandle {
    pub(crate) fn generation(&self) -> u64 { self.generation }

    pub(crate) fn shutdown(&self) -> &CancellationToken { &self.shutdown }

    /// Reason recorded by whoever tore the link down.
    pub(crate) fn reason(&self) -> DisconnectReason {
        self.reason
            .get()
            .cloned()
            .unwrap_or_else(|| DisconnectReason::requested("connection dropped"))
    }
}

pub(crate) struct LinkState<T> {
    slot: Mutex<Option<ActiveLink<T>>>,
    generations: AtomicU64,
    observers: Mutex<Vec<DisconnectObserver>>,
}

impl<T> Default for LinkState<T> {
    fn default() -> Self {
        Self {
            slot: Mutex::new(None),
            generations: AtomicU64::new(0),
            observers: Mutex::new(Vec::new()),
        }
    }
}

impl<T> LinkState<T> {
    /// Store a new link, failing if one is already bound.
    pub(crate) fn bind(&self, resources: T) -> Result<LinkHandle, ConnectError> {
        let mut slot = lock(&self.slot);
        if slot.is_some() {
            return Err(ConnectError::AlreadyConnected);
        }
        let handle = LinkHandle {
            generation: self.generations.fetch_add(1, Ordering::Relaxed),
            shutdown: CancellationToken::new(),
            reason: Arc::new(OnceLock::new()),
        };
        *slot = Some(ActiveLink {
            generation: handle.generation,
            shutdown: handle.shutdown.clone(),
            reason: Arc::clone(&handle.reason),
            resources,
        });
        Ok(handle)
    }

    pub(crate) fn is_connected(&self) -> bool { lock(&self.slot).is_some() }

    /// Run `f` against the bound link's resources, if any.
    pub(crate) fn with_resources<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        lock(&self.slot).as_ref().map(|link| f(&link.resources))
    }

    /// Tear down the bound link.
    ///
    /// With `generation` set, only that particular link is torn down, which
    /// keeps a finishing background task from disconnecting a newer link.
    /// Returns `false` when there was nothing to tear down.
    pub(crate) fn teardown(&self, generation: Option<u64>, reason: DisconnectReason) -> bool {
        self.teardown_then(generation, reason, |_| {})
    }

    /// Like [`teardown`](Self::teardown), running `before_notify` after the
    /// background task has been cancelled and before observers are told.
    pub(crate) fn teardown_then(
        &self,
        generation: Option<u64>,
        reason: DisconnectReason,
        before_notify: impl FnOnce(&DisconnectReason),
    ) -> bool {
        let link = {
            let mut slot = lock(&self.slot);
            match slot.as_ref() {
                Some(link) if generation.is_none_or(|g| g == link.generation) => slot.take(),
                _ => None,
            }
        };
        let Some(link) = link else {
            return false;
        };
        let _ = link.reason.set(reason.clone());
        link.shutdown.cancel();
        drop(link.resources);
        before_notify(&reason);
        self.notify(&reason);
        true
    }

    pub(crate) fn observe(&self, observer: DisconnectObserver) {
        lock(&self.observers).push(observer);
    }

    fn notify(&self, reason: &DisconnectReason) {
        let observers = lock(&self.observers).clone();
        for observer in observers {
            if let Err(message) = catch_callback(|| observer(reason)) {
                log::warn!("disconnect observer panicked: panic={message}");
            }
        }
    }
}

impl<T> Drop for LinkState<T> {
    fn drop(&mut self) {
        let slot = self.slot.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(link) = slot.take() {
            let _ = link
                .reason
                .set(DisconnectReason::requested("transport handle dropped"));
            link.shutdown.cancel();
        }
    }
}
