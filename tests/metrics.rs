#![cfg(feature = "metrics")]
//! Tests for `streamframe` metrics helpers.
//!
//! These tests verify that counters update as expected using
//! `metrics_util::debugging::DebuggingRecorder`.

use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use rstest::rstest;
use streamframe::{
    AssemblyRegistry,
    ChannelConsumer,
    DisconnectReason,
    FrameHandler,
    Header,
    PayloadType,
    StreamId,
    metrics::{self as stream_metrics, Direction},
};

fn debugging_recorder_setup() -> (Snapshotter, DebuggingRecorder) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    (snapshotter, recorder)
}

fn counter_value(snapshotter: &Snapshotter, name: &str, label: Option<(&str, &str)>) -> u64 {
    snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter(|(k, _, _, _)| {
            k.key().name() == name
                && label.is_none_or(|(key, value)| {
                    k.key().labels().any(|l| l.key() == key && l.value() == value)
                })
        })
        .map(|(_, _, _, v)| match v {
            DebugValue::Counter(c) => c,
            _ => 0,
        })
        .sum()
}

#[rstest]
#[case::inbound(Direction::Inbound)]
#[case::outbound(Direction::Outbound)]
fn chunk_metric_is_labelled_by_direction(#[case] direction: Direction) {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || {
        stream_metrics::inc_chunks(direction);
        stream_metrics::inc_chunks(direction);
    });

    let recorded = counter_value(
        &snapshotter,
        stream_metrics::CHUNKS_TOTAL,
        Some(("direction", direction.as_str())),
    );
    assert_eq!(recorded, 2);
}

#[test]
fn disconnect_metric_increments() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, stream_metrics::inc_disconnects);

    assert_eq!(
        counter_value(&snapshotter, stream_metrics::DISCONNECTS_TOTAL, None),
        1
    );
}

#[test]
fn registry_records_abandoned_streams() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    let (consumer, _events) = ChannelConsumer::new();
    let mut registry = AssemblyRegistry::new(consumer);

    metrics::with_local_recorder(&recorder, || {
        for n in 0..3 {
            let header = Header::new(PayloadType::Stream, StreamId::from_bytes([n; 16]), 0, false);
            let _ = registry.get_sink(&header);
            registry.on_chunk(&header, 0);
        }
        registry.on_disconnect(&DisconnectReason::PeerClosed);
    });

    assert_eq!(
        counter_value(&snapshotter, stream_metrics::ABANDONED_STREAMS_TOTAL, None),
        3
    );
}
