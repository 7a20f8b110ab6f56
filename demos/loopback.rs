//! Loopback demo sending a request and a content stream to a local peer.
//!
//! Both endpoints live in this process and talk over a TCP connection on
//! localhost. Set `RUST_LOG=debug` to see per-stream tracing.

use std::error::Error;

use streamframe::{
    AssemblyEvent,
    AssemblyRegistry,
    ChannelConsumer,
    ContentStream,
    DisconnectReason,
    PayloadReceiver,
    PayloadSender,
    PayloadSource,
    PayloadType,
    RequestPayload,
    SendOperations,
    StreamId,
    connect_duplex,
};
use tokio::net::{TcpListener, TcpStream};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let client = TcpStream::connect(addr).await?;
    let (server, _) = listener.accept().await?;

    let (consumer, mut events) = ChannelConsumer::new();
    let server_sender = PayloadSender::default();
    let server_receiver = PayloadReceiver::default();
    server_receiver.subscribe(AssemblyRegistry::new(consumer))?;
    connect_duplex(server, &server_sender, &server_receiver)?;

    let client_sender = PayloadSender::default();
    client_sender.connect(client)?;
    let ops = SendOperations::new(client_sender.clone());

    let content = ContentStream::new(PayloadSource::from(vec![b'z'; 10_000]))
        .content_type("application/octet-stream");
    ops.send_request(
        StreamId::random(),
        RequestPayload::new("POST", "/upload"),
        vec![content],
    )
    .await?;

    for _ in 0..2 {
        match events.recv().await {
            Some(AssemblyEvent::Completed(payload))
                if payload.payload_type() == PayloadType::Request =>
            {
                let request: RequestPayload = payload.decode_json()?;
                tracing::info!(
                    verb = %request.verb,
                    path = %request.path,
                    streams = request.streams.len(),
                    "request received"
                );
            }
            Some(AssemblyEvent::Completed(payload)) => {
                tracing::info!(
                    stream_id = %payload.stream_id(),
                    bytes = payload.bytes().len(),
                    chunks = payload.chunks(),
                    "content received"
                );
            }
            Some(AssemblyEvent::Abandoned(abandoned)) => {
                tracing::warn!(
                    stream_id = %abandoned.stream_id(),
                    reason = %abandoned.reason(),
                    "stream abandoned"
                );
            }
            Some(AssemblyEvent::Control(control)) => {
                tracing::info!(
                    stream_id = %control.stream_id(),
                    payload_type = %control.payload_type(),
                    "control received"
                );
            }
            None => break,
        }
    }

    client_sender.disconnect(DisconnectReason::requested("demo finished"));
    server_sender.disconnect(DisconnectReason::requested("demo finished"));
    server_receiver.disconnect(DisconnectReason::requested("demo finished"));
    Ok(())
}
