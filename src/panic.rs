//! Panic capture for callbacks run on the read loop.
//!
//! A [`FrameHandler`](crate::receiver::FrameHandler) is user code. If one of
//! its callbacks panics, the read loop turns the panic into a
//! [`DisconnectReason::HandlerPanicked`](crate::error::DisconnectReason) and
//! tears the connection down instead of unwinding through the task.

use std::{
    any::Any,
    fmt,
    panic::{AssertUnwindSafe, catch_unwind},
};

/// Displays the message carried by a panic payload.
///
/// `String` and `&'static str` payloads print as-is; anything else prints a
/// placeholder naming the payload as opaque.
///
/// ```
/// use streamframe::panic::format_panic;
///
/// assert_eq!(format_panic(&"boom").to_string(), "boom");
/// assert_eq!(format_panic(&String::from("boom")).to_string(), "boom");
/// assert_eq!(format_panic(&5_u32).to_string(), "<non-string panic payload>");
/// ```
#[derive(Clone, Copy)]
#[must_use]
pub struct PanicMessage<'a>(&'a (dyn Any + Send));

impl fmt::Display for PanicMessage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(s) = self.0.downcast_ref::<String>() {
            f.write_str(s)
        } else if let Some(s) = self.0.downcast_ref::<&'static str>() {
            f.write_str(s)
        } else {
            f.write_str("<non-string panic payload>")
        }
    }
}

impl fmt::Debug for PanicMessage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PanicMessage").field(&self.to_string()).finish()
    }
}

/// Borrow a panic payload for display.
pub fn format_panic(payload: &(dyn Any + Send)) -> PanicMessage<'_> { PanicMessage(payload) }

/// Run `f`, converting a panic into its message.
///
/// # Errors
///
/// Returns the formatted panic message if `f` panics.
pub fn catch_callback<R>(f: impl FnOnce() -> R) -> Result<R, String> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|payload| format_panic(payload.as_ref()).to_string())
}
