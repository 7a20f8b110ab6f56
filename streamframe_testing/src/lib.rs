//! Utilities for exercising `streamframe` senders and receivers with in-memory
//! connections during tests.
//!
//! The helpers wire [`PayloadSender`](streamframe::PayloadSender) and
//! [`PayloadReceiver`](streamframe::PayloadReceiver) pairs together over
//! `tokio::io::duplex` streams, capture the raw bytes a sender writes and
//! decode them back into chunks for assertions.
//!
//! ```rust
//! use streamframe::config::TransportConfig;
//! use streamframe_testing::connected_pair;
//!
//! # async fn example() {
//! let (client, server) = connected_pair(TransportConfig::default(), 4096);
//! assert!(client.sender.is_connected());
//! assert!(server.receiver.is_connected());
//! # }
//! ```

pub mod logging;
pub mod macros;
pub mod pair;
pub mod wire;

pub use logging::{LoggerHandle, logger};
pub use pair::{Endpoint, connected_pair, endpoint};
pub use wire::{capture_wire, decode_chunks, encode_chunk};

/// Result type used by integration tests.
pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error + Send + Sync>>;
