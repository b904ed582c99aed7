use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use parking_lot::Mutex;
use veneer::dispatch::panic_message;
use veneer::{Toolkit, ToolkitError, ToolkitResult, UiDispatcher, Work};
use winit::event_loop::{EventLoopClosed, EventLoopProxy};

/// User event carried by the Veneer event loop.
pub enum UiEvent {
    /// Run on the UI thread.
    Invoke(Work),
}

impl UiEvent {
    /// Run on the loop thread. A panicking work item goes to the toolkit's
    /// unhandled-panic hook and the loop keeps going.
    pub(crate) fn run(self, toolkit: &Toolkit) {
        match self {
            UiEvent::Invoke(work) => {
                veneer_core::profiling::profile_scope!("ui_work_item");
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(work)) {
                    toolkit.report_panic(&panic_message(&*payload));
                }
            }
        }
    }
}

impl fmt::Debug for UiEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UiEvent::Invoke(_) => f.write_str("UiEvent::Invoke(..)"),
        }
    }
}

/// Sends work to the event loop as [`UiEvent::Invoke`].
pub struct WinitDispatcher {
    proxy: Mutex<EventLoopProxy<UiEvent>>,
}

impl WinitDispatcher {
    pub fn new(proxy: EventLoopProxy<UiEvent>) -> Self {
        Self {
            proxy: Mutex::new(proxy),
        }
    }
}

impl UiDispatcher for WinitDispatcher {
    fn invoke(&self, work: Work) -> ToolkitResult<()> {
        self.proxy
            .lock()
            .send_event(UiEvent::Invoke(work))
            .map_err(closed)
    }
}

fn closed(err: EventLoopClosed<UiEvent>) -> ToolkitError {
    tracing::warn!("Event loop has exited, dropping {:?}", err.0);
    ToolkitError::DispatcherClosed
}
