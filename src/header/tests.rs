//! Tests for the fixed chunk header layout.

use bytes::BytesMut;
use proptest::prelude::*;
use rstest::rstest;

use super::{HEADER_LEN, Header, HeaderError, PayloadType, StreamId};

fn sample_id() -> StreamId {
    StreamId::from_bytes([
        0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd, 0xee,
        0xff,
    ])
}

#[test]
fn header_layout_matches_wire_format() {
    let header = Header::new(PayloadType::Response, sample_id(), 0x0102_0304, true);
    let wire = header.to_bytes();

    assert_eq!(HEADER_LEN, 22);
    assert_eq!(wire[0], b'B');
    assert_eq!(&wire[1..17], sample_id().as_bytes());
    assert_eq!(&wire[17..21], &[0x01, 0x02, 0x03, 0x04]);
    assert_eq!(wire[21], 1);
}

#[test]
fn encode_appends_same_bytes_as_to_bytes() {
    let header = Header::new(PayloadType::Stream, sample_id(), 9, false);
    let mut dst = BytesMut::from(&b"prefix"[..]);
    header.encode(&mut dst);

    assert_eq!(&dst[..6], b"prefix");
    assert_eq!(&dst[6..], &header.to_bytes()[..]);
}

#[rstest]
#[case::empty(0)]
#[case::one_short(HEADER_LEN - 1)]
fn decode_rejects_short_buffers(#[case] len: usize) {
    let wire = Header::new(PayloadType::Request, sample_id(), 1, false).to_bytes();
    assert_eq!(
        Header::decode(&wire[..len]),
        Err(HeaderError::Truncated {
            have: len,
            need: HEADER_LEN,
        })
    );
}

#[test]
fn decode_rejects_unknown_type_tag() {
    let mut wire = Header::new(PayloadType::Request, sample_id(), 1, false).to_bytes();
    wire[0] = b'Z';
    assert_eq!(Header::decode(&wire), Err(HeaderError::UnknownType(b'Z')));
}

#[test]
fn decode_rejects_invalid_end_flag() {
    let mut wire = Header::new(PayloadType::Request, sample_id(), 1, false).to_bytes();
    wire[HEADER_LEN - 1] = 2;
    assert_eq!(Header::decode(&wire), Err(HeaderError::InvalidEndFlag(2)));
}

#[test]
fn decode_ignores_trailing_payload_bytes() {
    let header = Header::new(PayloadType::CancelStream, sample_id(), 3, true);
    let mut wire = header.to_bytes().to_vec();
    wire.extend_from_slice(b"abc");
    assert_eq!(Header::decode(&wire), Ok(header));
}

#[test]
fn tags_are_distinct_and_parse_back() {
    for payload_type in PayloadType::ALL {
        assert_eq!(PayloadType::from_tag(payload_type.tag()), Some(payload_type));
    }
    assert!(PayloadType::CancelAll.is_control());
    assert!(!PayloadType::Stream.is_control());
}

proptest! {
    #[test]
    fn any_header_survives_encoding(
        type_index in 0usize..PayloadType::ALL.len(),
        id in any::<[u8; 16]>(),
        length in any::<u32>(),
        end in any::<bool>(),
    ) {
        let payload_type = PayloadType::ALL[type_index];
        let header = Header::new(payload_type, StreamId::from_bytes(id), length, end);
        prop_assert_eq!(Header::decode(&header.to_bytes()), Ok(header));
    }
}
