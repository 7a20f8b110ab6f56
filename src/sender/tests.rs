use std::sync::{
    Arc,
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use bytes::Bytes;
use futures::StreamExt;
use rstest::{fixture, rstest};
use tokio::{io::AsyncReadExt, sync::oneshot};
use tokio_util::codec::FramedRead;
use tracing_test::traced_test;

use super::PayloadSender;
use crate::{
    codec::ChunkCodec,
    config::TransportConfig,
    disassembler::SourceLength,
    error::{ConnectError, DisconnectReason, SendError},
    header::{HEADER_LEN, Header, PayloadType, StreamId},
};

#[fixture]
fn header() -> Header { Header::new(PayloadType::Stream, StreamId::from_bytes([3; 16]), 5, true) }

const HELLO: Bytes = Bytes::from_static(b"hello");

#[rstest]
#[tokio::test]
async fn send_before_connect_is_rejected(header: Header) {
    let sender = PayloadSender::default();
    let err = sender
        .send_payload(header, HELLO, SourceLength::Known(5))
        .await
        .expect_err("not connected");
    assert!(matches!(err, SendError::NotConnected));
}

#[rstest]
#[tokio::test]
async fn send_writes_header_then_payload(header: Header) {
    let (local, mut remote) = tokio::io::duplex(256);
    let sender = PayloadSender::default();
    sender.connect(local).expect("connect");

    sender
        .send_payload(header, HELLO, SourceLength::Known(5))
        .await
        .expect("send");

    let mut wire = [0_u8; HEADER_LEN + 5];
    remote.read_exact(&mut wire).await.expect("read chunk");
    assert_eq!(&wire[..HEADER_LEN], &header.to_bytes());
    assert_eq!(&wire[HEADER_LEN..], b"hello");
}

#[rstest]
#[tokio::test]
async fn second_connect_is_rejected() {
    let (first, _keep_first) = tokio::io::duplex(64);
    let (second, _keep_second) = tokio::io::duplex(64);
    let sender = PayloadSender::default();
    sender.connect(first).expect("first connect");
    assert_eq!(sender.connect(second), Err(ConnectError::AlreadyConnected));
}

#[rstest]
#[tokio::test]
async fn length_mismatch_is_rejected_without_disconnecting(header: Header) {
    let (local, _remote) = tokio::io::duplex(256);
    let sender = PayloadSender::default();
    sender.connect(local).expect("connect");

    let err = sender
        .send_payload(header, Bytes::from_static(b"hi"), SourceLength::Known(2))
        .await
        .expect_err("length mismatch");
    assert!(matches!(
        err,
        SendError::LengthMismatch {
            declared: 5,
            actual: 2
        }
    ));
    assert!(sender.is_connected());
}

#[rstest]
#[tokio::test]
async fn oversized_chunk_is_rejected_without_disconnecting(header: Header) {
    let config = TransportConfig::builder()
        .max_chunk_size(4)
        .max_chunk_length(4)
        .build()
        .expect("valid configuration");
    let (local, remote) = tokio::io::duplex(256);
    let sender = PayloadSender::new(config);
    sender.connect(local).expect("connect");

    let err = sender
        .send_payload(header, HELLO, SourceLength::Known(5))
        .await
        .expect_err("chunk over limit");
    assert!(matches!(err, SendError::ChunkTooLarge { length: 5, max: 4 }));
    assert!(sender.is_connected());

    let small = Header::new(PayloadType::Stream, header.stream_id(), 2, true);
    sender
        .send_payload(small, Bytes::from_static(b"ok"), SourceLength::Known(2))
        .await
        .expect("small chunk");
    sender.disconnect(DisconnectReason::requested("done"));

    let chunks: Vec<_> = FramedRead::new(remote, ChunkCodec::default())
        .map(|chunk| chunk.expect("decode"))
        .collect()
        .await;
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].payload().as_ref(), b"ok");
}

#[rstest]
#[tokio::test]
async fn callback_fires_once_with_header(header: Header) {
    let (local, _remote) = tokio::io::duplex(256);
    let sender = PayloadSender::default();
    sender.connect(local).expect("connect");

    let (tx, rx) = oneshot::channel();
    sender
        .send_payload_with(header, HELLO, SourceLength::Known(5), move |h, result| {
            let _ = tx.send((h, result));
        })
        .await;

    let (seen, result) = rx.await.expect("callback invoked");
    assert_eq!(seen, header);
    assert!(result.is_ok());
}

#[rstest]
#[tokio::test]
async fn disconnect_notifies_observers_once() {
    let (local, _remote) = tokio::io::duplex(64);
    let sender = PayloadSender::default();
    let calls = Arc::new(AtomicUsize::new(0));
    let reasons = Arc::new(Mutex::new(Vec::new()));
    let (counter, seen) = (Arc::clone(&calls), Arc::clone(&reasons));
    sender.on_disconnected(move |reason| {
        counter.fetch_add(1, Ordering::SeqCst);
        seen.lock().expect("lock").push(reason.to_string());
    });

    sender.connect(local).expect("connect");
    sender.disconnect(DisconnectReason::requested("first"));
    sender.disconnect(DisconnectReason::requested("second"));

    assert!(!sender.is_connected());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        reasons.lock().expect("lock").as_slice(),
        ["disconnect requested: first"]
    );
}

#[rstest]
#[tokio::test]
async fn queued_chunks_fail_when_disconnected(header: Header) {
    // A one-byte pipe keeps the writer blocked on the first chunk.
    let (local, _remote) = tokio::io::duplex(1);
    let sender = PayloadSender::default();
    sender.connect(local).expect("connect");

    let first = sender.enqueue(header, HELLO, SourceLength::Known(5)).await;
    let second = sender.enqueue(header, HELLO, SourceLength::Known(5)).await;
    tokio::task::yield_now().await;
    sender.disconnect(DisconnectReason::requested("shutdown"));

    assert!(matches!(first.await, Err(SendError::NotConnected)));
    assert!(matches!(second.await, Err(SendError::NotConnected)));
    let err = sender
        .send_payload(header, HELLO, SourceLength::Known(5))
        .await
        .expect_err("disconnected");
    assert!(matches!(err, SendError::NotConnected));
}

#[rstest]
#[tokio::test]
async fn reconnect_with_fresh_connection_is_allowed(header: Header) {
    let sender = PayloadSender::default();
    let (first, _first_remote) = tokio::io::duplex(64);
    sender.connect(first).expect("first connect");
    sender.disconnect(DisconnectReason::requested("rotate"));

    let (second, second_remote) = tokio::io::duplex(256);
    sender.connect(second).expect("second connect");
    sender
        .send_payload(header, HELLO, SourceLength::Known(5))
        .await
        .expect("send on new connection");
    sender.disconnect(DisconnectReason::requested("done"));

    let chunks: Vec<_> = FramedRead::new(second_remote, ChunkCodec::default())
        .collect()
        .await;
    assert_eq!(chunks.len(), 1);
}

#[rstest]
#[tokio::test]
async fn write_failure_disconnects_with_io_reason(header: Header) {
    let (local, remote) = tokio::io::duplex(64);
    drop(remote);
    let sender = PayloadSender::default();
    let (tx, rx) = oneshot::channel();
    let tx = Mutex::new(Some(tx));
    sender.on_disconnected(move |reason| {
        if let Some(tx) = tx.lock().expect("lock").take() {
            let _ = tx.send(matches!(reason, DisconnectReason::Io(_)));
        }
    });
    sender.connect(local).expect("connect");

    let err = sender
        .send_payload(header, HELLO, SourceLength::Known(5))
        .await
        .expect_err("peer is gone");
    assert!(matches!(err, SendError::Io(_)));
    assert!(rx.await.expect("observer invoked"));
    assert!(!sender.is_connected());
}

#[rstest]
#[traced_test]
#[tokio::test]
async fn failed_write_is_logged(header: Header) {
    let (local, remote) = tokio::io::duplex(64);
    drop(remote);
    let sender = PayloadSender::default();
    sender.connect(local).expect("connect");

    let _ = sender.send_payload(header, HELLO, SourceLength::Known(5)).await;
    assert!(logs_contain("chunk write failed"));
}
