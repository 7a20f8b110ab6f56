//! Connection abstraction consumed by the sender and receiver.
//!
//! The transport does not open connections. Callers establish a duplex byte
//! channel (TCP, a named pipe, an in-memory `tokio::io::duplex`) and hand its
//! halves to a [`PayloadSender`] and a [`PayloadReceiver`].

use tokio::io::{AsyncRead, AsyncWrite};

use crate::{
    error::{ConnectError, DisconnectReason},
    receiver::PayloadReceiver,
    sender::PayloadSender,
};

/// Write half accepted by [`PayloadSender::connect`].
pub trait TransportWrite: AsyncWrite + Unpin + Send + 'static {}
impl<T> TransportWrite for T where T: AsyncWrite + Unpin + Send + 'static {}

/// Read half accepted by [`PayloadReceiver::connect`].
pub trait TransportRead: AsyncRead + Unpin + Send + 'static {}
impl<T> TransportRead for T where T: AsyncRead + Unpin + Send + 'static {}

/// Split one duplex connection and bind both halves.
///
/// # Errors
///
/// Returns [`ConnectError`] if either half is already connected or the
/// receiver has no subscribed handler. Neither half is left bound on error.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
///
/// # Examples
///
/// ```no_run
/// use streamframe::{
///     assembly::{AssemblyRegistry, ChannelConsumer},
///     receiver::PayloadReceiver,
///     sender::PayloadSender,
///     transport::connect_duplex,
/// };
///
/// # async fn demo() -> Result<(), streamframe::error::ConnectError> {
/// let (local, _remote) = tokio::io::duplex(4096);
/// let sender = PayloadSender::default();
/// let receiver = PayloadReceiver::default();
/// let (consumer, _events) = ChannelConsumer::new();
/// receiver.subscribe(AssemblyRegistry::new(consumer))?;
/// connect_duplex(local, &sender, &receiver)?;
/// # Ok(())
/// # }
/// ```
pub fn connect_duplex<T>(
    io: T,
    sender: &PayloadSender,
    receiver: &PayloadReceiver,
) -> Result<(), ConnectError>
where
    T: AsyncRead + AsyncWrite + Send + 'static,
{
    if sender.is_connected() {
        return Err(ConnectError::AlreadyConnected);
    }
    let (read, write) = tokio::io::split(io);
    receiver.connect(read)?;
    if let Err(err) = sender.connect(write) {
        receiver.disconnect(DisconnectReason::requested("sender failed to connect"));
        return Err(err);
    }
    Ok(())
}
