//! Sender/receiver pairs joined by in-memory connections.

use streamframe::{
    AssemblyEvent,
    AssemblyRegistry,
    ChannelConsumer,
    PayloadReceiver,
    PayloadSender,
    config::TransportConfig,
    connect_duplex,
};
use tokio::sync::mpsc;

/// One side of a connection: a sender, a receiver feeding an
/// [`AssemblyRegistry`] and the events that registry produces.
pub struct Endpoint {
    /// Sending half.
    pub sender: PayloadSender,
    /// Receiving half.
    pub receiver: PayloadReceiver,
    /// Completed and abandoned streams seen by the receiver.
    pub events: mpsc::UnboundedReceiver<AssemblyEvent>,
}

/// Build an unconnected endpoint with a subscribed [`ChannelConsumer`].
///
/// # Panics
///
/// Panics if the freshly built receiver refuses the subscription.
#[must_use]
pub fn endpoint(config: TransportConfig) -> Endpoint {
    let (consumer, events) = ChannelConsumer::new();
    let receiver = PayloadReceiver::new(config);
    receiver
        .subscribe(AssemblyRegistry::new(consumer))
        .expect("new receiver accepts a subscriber");
    Endpoint {
        sender: PayloadSender::new(config),
        receiver,
        events,
    }
}

/// Connect two endpoints over a `tokio::io::duplex` of `capacity` bytes.
///
/// # Panics
///
/// Panics if either endpoint fails to connect or if called outside a Tokio
/// runtime.
#[must_use]
pub fn connected_pair(config: TransportConfig, capacity: usize) -> (Endpoint, Endpoint) {
    let (left_io, right_io) = tokio::io::duplex(capacity);
    let left = endpoint(config);
    let right = endpoint(config);
    connect_duplex(left_io, &left.sender, &left.receiver).expect("connect left endpoint");
    connect_duplex(right_io, &right.sender, &right.receiver).expect("connect right endpoint");
    (left, right)
}
