//! Assertion macros shared by integration tests.

/// Await the next [`AssemblyEvent`](streamframe::AssemblyEvent) and require it
/// to be a completed payload.
///
/// Panics with the call site if the channel closes, the next event is not a
/// completion, or no event arrives within a second.
#[macro_export]
macro_rules! completed_expect {
    ($events:expr) => {{
        let event = ::tokio::time::timeout(::std::time::Duration::from_secs(1), $events.recv())
            .await
            .expect(concat!("no assembly event at ", file!(), ":", line!()))
            .expect(concat!("event channel closed at ", file!(), ":", line!()));
        match event {
            ::streamframe::AssemblyEvent::Completed(payload) => payload,
            ::streamframe::AssemblyEvent::Abandoned(abandoned) => panic!(
                "stream {} abandoned at {}:{}: {}",
                abandoned.stream_id(),
                file!(),
                line!(),
                abandoned.reason()
            ),
            ::streamframe::AssemblyEvent::Control(control) => panic!(
                "unexpected {} control chunk for stream {} at {}:{}",
                control.payload_type(),
                control.stream_id(),
                file!(),
                line!()
            ),
        }
    }};
}

pub use crate::completed_expect;
