//! Synchronization bridge onto the UI thread.
//!
//! [`SyncBridge::post`] hands work to the toolkit's dispatcher and returns.
//! [`SyncBridge::send`] does the same but blocks until the work has run,
//! unless the caller already is the UI thread, in which case it runs inline.
//!
//! Until a UI thread is attached both run the work inline on the caller; there
//! is nothing to wait for and waiting would deadlock.

use std::panic::{self, AssertUnwindSafe};

use crate::dispatch::panic_message;
use crate::error::{ToolkitError, ToolkitResult};
use crate::toolkit::Toolkit;

/// Marshals work onto a toolkit's UI thread.
///
/// Bridges are cheap to clone and all clones target the same thread.
#[derive(Debug, Clone)]
pub struct SyncBridge {
    toolkit: Toolkit,
}

impl SyncBridge {
    pub fn new(toolkit: &Toolkit) -> Self {
        Self {
            toolkit: toolkit.clone(),
        }
    }

    pub fn toolkit(&self) -> &Toolkit {
        &self.toolkit
    }

    /// Queue `work` on the UI thread without waiting.
    ///
    /// Work posted from one thread runs in posting order. A panic inside
    /// `work` goes to the toolkit's unhandled-panic hook.
    pub fn post(&self, work: impl FnOnce() + Send + 'static) -> ToolkitResult<()> {
        if !self.toolkit.has_ui_thread() {
            self.note_detached("post");
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(work)) {
                self.toolkit.report_panic(&panic_message(&*payload));
            }
            return Ok(());
        }

        self.toolkit.invoke(work)
    }

    /// Run `work` on the UI thread and wait for its result.
    ///
    /// A panic inside `work` is resumed on the calling thread once the UI
    /// thread is done with it. Fails with [`ToolkitError::DispatcherClosed`]
    /// if the loop went away without running the work.
    pub fn send<R>(&self, work: impl FnOnce() -> R + Send + 'static) -> ToolkitResult<R>
    where
        R: Send + 'static,
    {
        if !self.toolkit.has_ui_thread() {
            self.note_detached("send");
            return Ok(work());
        }
        if self.toolkit.is_ui_thread() {
            return Ok(work());
        }

        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        self.toolkit.dispatch(Box::new(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(work));
            // The waiter only disappears if it panicked itself.
            let _ = done_tx.send(result);
        }))?;

        match done_rx.recv() {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(payload)) => panic::resume_unwind(payload),
            Err(_) => Err(ToolkitError::DispatcherClosed),
        }
    }

    fn note_detached(&self, operation: &str) {
        if self.toolkit.config().inline_when_detached {
            tracing::trace!("No UI thread attached; running {} inline", operation);
        } else {
            tracing::warn!(
                "{} on toolkit {} before a UI thread was attached; running inline",
                operation,
                self.toolkit.name()
            );
        }
    }
}
