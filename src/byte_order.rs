//! Helpers for explicit network byte-order conversions.
//!
//! The chunk header carries a single multi-byte integer, the payload length.
//! Keeping the conversion here scopes the Clippy expectation to one place so
//! the header codec stays explicit about wire endianness.

/// Serialise a `u32` in network byte order (big-endian).
///
/// # Examples
///
/// ```
/// use streamframe::byte_order::write_network_u32;
///
/// assert_eq!(write_network_u32(0x1234_5678), [0x12, 0x34, 0x56, 0x78]);
/// ```
#[must_use]
pub fn write_network_u32(value: u32) -> [u8; 4] {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    value.to_be_bytes()
}

/// Parse a network-order `u32` from its on-wire representation.
///
/// # Examples
///
/// ```
/// use streamframe::byte_order::read_network_u32;
///
/// assert_eq!(read_network_u32([0x12, 0x34, 0x56, 0x78]), 0x1234_5678);
/// ```
#[must_use]
pub fn read_network_u32(bytes: [u8; 4]) -> u32 {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    u32::from_be_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{read_network_u32, write_network_u32};

    #[rstest]
    #[case(0, [0, 0, 0, 0])]
    #[case(4096, [0x00, 0x00, 0x10, 0x00])]
    #[case(u32::MAX, [0xff, 0xff, 0xff, 0xff])]
    fn payload_lengths_use_network_order(#[case] value: u32, #[case] wire: [u8; 4]) {
        assert_eq!(write_network_u32(value), wire);
        assert_eq!(read_network_u32(wire), value);
    }
}
