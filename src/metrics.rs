//! Metric helpers for `streamframe`.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. With the `metrics` feature
//! disabled every helper compiles to a no-op.

#[cfg(feature = "metrics")]
use metrics::counter;

/// Name of the counter tracking chunks written or read.
pub const CHUNKS_TOTAL: &str = "streamframe_chunks_total";
/// Name of the counter tracking connections torn down.
pub const DISCONNECTS_TOTAL: &str = "streamframe_disconnects_total";
/// Name of the counter tracking streams abandoned before their end chunk.
pub const ABANDONED_STREAMS_TOTAL: &str = "streamframe_abandoned_streams_total";

/// Direction of chunk processing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Chunks decoded by a receiver.
    Inbound,
    /// Chunks written by a sender.
    Outbound,
}

impl Direction {
    /// Label value recorded for this direction.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Record a chunk for the given direction.
#[cfg_attr(
    not(feature = "metrics"),
    expect(unused_variables, reason = "direction is only recorded with metrics enabled")
)]
pub fn inc_chunks(direction: Direction) {
    #[cfg(feature = "metrics")]
    counter!(CHUNKS_TOTAL, "direction" => direction.as_str()).increment(1);
}

/// Record a torn-down connection.
pub fn inc_disconnects() {
    #[cfg(feature = "metrics")]
    counter!(DISCONNECTS_TOTAL).increment(1);
}

/// Record `count` streams abandoned by a disconnect.
#[cfg_attr(
    not(feature = "metrics"),
    expect(unused_variables, reason = "count is only recorded with metrics enabled")
)]
pub fn inc_abandoned(count: u64) {
    #[cfg(feature = "metrics")]
    counter!(ABANDONED_STREAMS_TOTAL).increment(count);
}
