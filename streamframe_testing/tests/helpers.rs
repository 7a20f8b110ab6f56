//! Integration coverage for the `streamframe_testing` helpers.

use streamframe::{
    CodecError,
    DisconnectReason,
    Header,
    PayloadSender,
    PayloadType,
    SourceLength,
    StreamId,
    config::TransportConfig,
};
use streamframe_testing::{
    TestResult,
    capture_wire,
    completed_expect,
    connected_pair,
    decode_chunks,
    encode_chunk,
};

#[test]
fn decode_rejects_capture_ending_inside_a_chunk() {
    let header = Header::new(PayloadType::Stream, StreamId::random(), 4, true);
    let wire = encode_chunk(header, &b"data"[..]);

    let chunks = decode_chunks(&wire).expect("complete capture decodes");
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].header(), &header);

    let err = decode_chunks(&wire[..wire.len() - 1]).expect_err("truncated capture");
    assert!(matches!(err, CodecError::Eof(_)));
}

#[tokio::test]
async fn capture_collects_sender_output() -> TestResult {
    let sender = PayloadSender::default();
    let capture = capture_wire(&sender, 64);
    let header = Header::new(PayloadType::Response, StreamId::random(), 2, true);
    sender
        .send_payload(header, bytes::Bytes::from_static(b"ok"), SourceLength::Known(2))
        .await?;
    sender.disconnect(DisconnectReason::requested("done"));

    assert_eq!(capture.await?, encode_chunk(header, &b"ok"[..]));
    Ok(())
}

#[tokio::test]
async fn connected_pair_delivers_in_both_directions() -> TestResult {
    let (mut left, mut right) = connected_pair(TransportConfig::default(), 256);
    let to_right = Header::new(PayloadType::Request, StreamId::random(), 1, true);
    let to_left = Header::new(PayloadType::Response, StreamId::random(), 1, true);

    left.sender
        .send_payload(to_right, bytes::Bytes::from_static(b"L"), SourceLength::Known(1))
        .await?;
    right
        .sender
        .send_payload(to_left, bytes::Bytes::from_static(b"R"), SourceLength::Known(1))
        .await?;

    assert_eq!(completed_expect!(right.events).bytes().as_ref(), b"L");
    assert_eq!(completed_expect!(left.events).bytes().as_ref(), b"R");
    Ok(())
}
