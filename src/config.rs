//! Transport configuration.
//!
//! [`TransportConfig`] bundles the limits shared by the disassembler, sender
//! and receiver. It is passed explicitly at construction; nothing in the crate
//! reads global state.

use std::num::NonZeroUsize;

use thiserror::Error;

use crate::codec::MAX_CHUNK_LENGTH;

/// Default number of payload bytes a disassembler places in one chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;
/// Default capacity of the sender's outbound queue.
pub const DEFAULT_SEND_QUEUE_CAPACITY: usize = 64;

/// Errors returned when building a [`TransportConfig`].
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The chunk size was zero or larger than a header can describe.
    #[error("invalid chunk size {0}; must be between 1 and {max}", max = u32::MAX)]
    InvalidChunkSize(usize),
    /// The outbound chunk size exceeds what the receiver accepts.
    #[error("chunk size {chunk_size} exceeds max chunk length {max_chunk_length}")]
    ChunkExceedsLimit {
        /// Configured outbound chunk size.
        chunk_size: usize,
        /// Configured inbound limit.
        max_chunk_length: usize,
    },
    /// The send queue capacity was zero.
    #[error("send queue capacity must be at least 1")]
    InvalidQueueCapacity,
}

/// Limits applied to a sender/receiver pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransportConfig {
    max_chunk_size: NonZeroUsize,
    max_chunk_length: usize,
    send_queue_capacity: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: NonZeroUsize::new(DEFAULT_CHUNK_SIZE).unwrap_or(NonZeroUsize::MIN),
            max_chunk_length: MAX_CHUNK_LENGTH,
            send_queue_capacity: DEFAULT_SEND_QUEUE_CAPACITY,
        }
    }
}

impl TransportConfig {
    /// Start building a configuration from the defaults.
    #[must_use]
    pub fn builder() -> TransportConfigBuilder { TransportConfigBuilder::default() }

    /// Payload bytes a disassembler places in each chunk.
    #[must_use]
    pub fn max_chunk_size(&self) -> NonZeroUsize { self.max_chunk_size }

    /// Largest payload length the receiver accepts before treating the
    /// header as a protocol violation.
    #[must_use]
    pub fn max_chunk_length(&self) -> usize { self.max_chunk_length }

    /// Capacity of the sender's outbound queue.
    #[must_use]
    pub fn send_queue_capacity(&self) -> usize { self.send_queue_capacity }
}

/// Builder for [`TransportConfig`].
///
/// # Examples
///
/// ```
/// use streamframe::config::TransportConfig;
///
/// let config = TransportConfig::builder()
///     .max_chunk_size(1024)
///     .send_queue_capacity(8)
///     .build()
///     .expect("valid configuration");
/// assert_eq!(config.max_chunk_size().get(), 1024);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct TransportConfigBuilder {
    max_chunk_size: usize,
    max_chunk_length: usize,
    send_queue_capacity: usize,
}

impl Default for TransportConfigBuilder {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_CHUNK_SIZE,
            max_chunk_length: MAX_CHUNK_LENGTH,
            send_queue_capacity: DEFAULT_SEND_QUEUE_CAPACITY,
        }
    }
}

impl TransportConfigBuilder {
    /// Set the number of payload bytes per outbound chunk.
    #[must_use]
    pub fn max_chunk_size(mut self, size: usize) -> Self {
        self.max_chunk_size = size;
        self
    }

    /// Set the largest inbound chunk payload the receiver accepts.
    #[must_use]
    pub fn max_chunk_length(mut self, length: usize) -> Self {
        self.max_chunk_length = length;
        self
    }

    /// Set the capacity of the sender's outbound queue.
    #[must_use]
    pub fn send_queue_capacity(mut self, capacity: usize) -> Self {
        self.send_queue_capacity = capacity;
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidChunkSize`] if the chunk size is zero or
    /// exceeds `u32::MAX`, [`ConfigError::ChunkExceedsLimit`] if it exceeds
    /// the inbound limit and [`ConfigError::InvalidQueueCapacity`] if the
    /// queue capacity is zero.
    pub fn build(self) -> Result<TransportConfig, ConfigError> {
        let fits_header = u32::try_from(self.max_chunk_size).is_ok();
        let max_chunk_size = NonZeroUsize::new(self.max_chunk_size)
            .filter(|_| fits_header)
            .ok_or(ConfigError::InvalidChunkSize(self.max_chunk_size))?;
        if max_chunk_size.get() > self.max_chunk_length {
            return Err(ConfigError::ChunkExceedsLimit {
                chunk_size: max_chunk_size.get(),
                max_chunk_length: self.max_chunk_length,
            });
        }
        if self.send_queue_capacity == 0 {
            return Err(ConfigError::InvalidQueueCapacity);
        }
        Ok(TransportConfig {
            max_chunk_size,
            max_chunk_length: self.max_chunk_length,
            send_queue_capacity: self.send_queue_capacity,
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{ConfigError, DEFAULT_CHUNK_SIZE, TransportConfig};

    #[test]
    fn defaults_match_builder_defaults() {
        let built = TransportConfig::builder().build().expect("defaults are valid");
        assert_eq!(built, TransportConfig::default());
        assert_eq!(built.max_chunk_size().get(), DEFAULT_CHUNK_SIZE);
    }

    #[rstest]
    #[case::zero_chunk(0, 64, 1, ConfigError::InvalidChunkSize(0))]
    #[case::chunk_over_limit(
        128,
        64,
        1,
        ConfigError::ChunkExceedsLimit { chunk_size: 128, max_chunk_length: 64 }
    )]
    #[case::zero_queue(16, 64, 0, ConfigError::InvalidQueueCapacity)]
    fn builder_rejects_invalid_values(
        #[case] chunk: usize,
        #[case] limit: usize,
        #[case] queue: usize,
        #[case] expected: ConfigError,
    ) {
        let err = TransportConfig::builder()
            .max_chunk_size(chunk)
            .max_chunk_length(limit)
            .send_queue_capacity(queue)
            .build()
            .expect_err("configuration must be rejected");
        assert_eq!(err, expected);
    }
}
