//! The application-level invoke primitive.
//!
//! The core needs exactly one thing from the embedding event loop: a way to
//! run a closure on the UI thread, fire-and-forget, in FIFO order. Loops
//! provide it by implementing [`UiDispatcher`]; see
//! [`HeadlessLoop`](crate::headless::HeadlessLoop) and the `veneer-winit`
//! crate.

use std::any::Any;

use crate::error::ToolkitResult;

/// A unit of work destined for the UI thread.
pub type Work = Box<dyn FnOnce() + Send + 'static>;

/// Runs work on the UI thread.
pub trait UiDispatcher: Send + Sync + 'static {
    /// Queue `work` to run on the UI thread and return immediately.
    ///
    /// Items queued through the same dispatcher run in submission order.
    /// Fails with [`ToolkitError::DispatcherClosed`](crate::ToolkitError::DispatcherClosed)
    /// once the loop has shut down.
    fn invoke(&self, work: Work) -> ToolkitResult<()>;
}

/// Best-effort text of a panic payload, for logging.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
