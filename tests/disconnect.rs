//! Teardown behaviour: abandoned streams, single notification and rejected
//! sends after a connection ends.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use bytes::Bytes;
use log::Level;
use rstest::rstest;
use serial_test::serial;
use streamframe::{
    AssemblyEvent,
    DisconnectReason,
    Header,
    PayloadType,
    SendError,
    SourceLength,
    StreamId,
    config::TransportConfig,
};
use streamframe_testing::{LoggerHandle, TestResult, connected_pair, endpoint, logger};
use tokio::{io::AsyncWriteExt, sync::Notify};

fn counting_observer(
    counter: &Arc<AtomicUsize>,
    notify: &Arc<Notify>,
) -> impl Fn(&DisconnectReason) + Send + Sync + 'static {
    let (counter, notify) = (Arc::clone(counter), Arc::clone(notify));
    move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        notify.notify_one();
    }
}

#[tokio::test]
async fn dropped_connection_abandons_open_stream_once() -> TestResult {
    let server = endpoint(TransportConfig::default());
    let mut events = server.events;
    let (server_io, mut client_io) = tokio::io::duplex(1024);
    server.receiver.connect(server_io)?;

    let notifications = Arc::new(AtomicUsize::new(0));
    let notify = Arc::new(Notify::new());
    server
        .receiver
        .on_disconnected(counting_observer(&notifications, &notify));

    let id = StreamId::random();
    for part in [&b"first"[..], &b"second"[..]] {
        let len = u32::try_from(part.len())?;
        let header = Header::new(PayloadType::Stream, id, len, false);
        client_io
            .write_all(&streamframe_testing::encode_chunk(header, Bytes::copy_from_slice(part)))
            .await?;
    }
    drop(client_io);
    notify.notified().await;

    match events.recv().await.ok_or("event channel closed")? {
        AssemblyEvent::Abandoned(abandoned) => {
            assert_eq!(abandoned.stream_id(), id);
            assert_eq!(abandoned.chunks_received(), 2);
            assert_eq!(abandoned.bytes_received(), 11);
            assert!(matches!(abandoned.reason(), DisconnectReason::PeerClosed));
        }
        AssemblyEvent::Completed(_) | AssemblyEvent::Control(_) => {
            return Err("stream must not complete".into());
        }
    }
    assert!(events.try_recv().is_err(), "exactly one abandoned event");
    tokio::task::yield_now().await;
    assert_eq!(notifications.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn several_open_streams_share_one_notification() -> TestResult {
    let (client, server) = connected_pair(TransportConfig::default(), 1024);
    let mut events = server.events;
    let notifications = Arc::new(AtomicUsize::new(0));
    let notify = Arc::new(Notify::new());
    server
        .receiver
        .on_disconnected(counting_observer(&notifications, &notify));

    for _ in 0..3 {
        let header = Header::new(PayloadType::Stream, StreamId::random(), 1, false);
        client
            .sender
            .send_payload(header, Bytes::from_static(b"x"), SourceLength::Unknown)
            .await?;
    }
    client.sender.disconnect(DisconnectReason::requested("client leaving"));
    notify.notified().await;

    let mut abandoned = 0;
    while let Some(event) = events.recv().await {
        assert!(matches!(event, AssemblyEvent::Abandoned(_)));
        abandoned += 1;
        if abandoned == 3 {
            break;
        }
    }
    assert_eq!(abandoned, 3);
    assert_eq!(notifications.load(Ordering::SeqCst), 1);
    Ok(())
}

#[rstest]
#[case::before_connect(false)]
#[case::after_disconnect(true)]
#[tokio::test]
async fn sends_without_connection_fail(#[case] connect_first: bool) {
    let (client, _server) = if connect_first {
        let (client, server) = connected_pair(TransportConfig::default(), 256);
        client.sender.disconnect(DisconnectReason::requested("test"));
        (client, Some(server))
    } else {
        (endpoint(TransportConfig::default()), None)
    };
    let header = Header::new(PayloadType::Request, StreamId::random(), 2, true);

    let err = client
        .sender
        .send_payload(header, Bytes::from_static(b"{}"), SourceLength::Known(2))
        .await
        .expect_err("send must fail");
    assert!(matches!(err, SendError::NotConnected));
    assert!(!client.sender.is_connected());
}

#[rstest]
#[tokio::test]
#[serial(lifecycle_logs)]
async fn lifecycle_is_logged_with_reason(mut logger: LoggerHandle) -> TestResult {
    let (client, _server) = connected_pair(TransportConfig::default(), 256);
    client.sender.disconnect(DisconnectReason::requested("maintenance"));

    let connected = logger.take_matching("payload sender connected");
    assert!(!connected.is_empty(), "connect not logged");

    client.receiver.disconnect(DisconnectReason::PeerClosed);
    let records = logger.take_matching("payload receiver disconnected");
    let record = records.first().ok_or("receiver disconnect not logged")?;
    assert_eq!(record.level(), Level::Info);
    assert!(record.args().contains("reason=peer closed the connection"));
    Ok(())
}
