//! A UI loop without a windowing system.
//!
//! [`HeadlessLoop`] owns a dedicated thread that plays the UI thread: it
//! drains a FIFO channel of work items until shut down. Tests and offscreen
//! tools use it wherever a native event loop would otherwise be needed.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle, ThreadId};

use crossbeam_channel::{Receiver, Sender};

use crate::config::ToolkitConfig;
use crate::dispatch::{UiDispatcher, Work, panic_message};
use crate::error::{ToolkitError, ToolkitResult};
use crate::toolkit::ToolkitBuilder;

enum Message {
    Work(Work),
    /// Signals once everything queued ahead of it has run.
    Marker(Sender<()>),
    Shutdown,
}

/// Dispatcher feeding a [`HeadlessLoop`].
#[derive(Clone)]
pub struct HeadlessDispatcher {
    sender: Sender<Message>,
    in_flight: Arc<AtomicUsize>,
}

impl UiDispatcher for HeadlessDispatcher {
    fn invoke(&self, work: Work) -> ToolkitResult<()> {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        self.sender.send(Message::Work(work)).map_err(|_| {
            self.in_flight.fetch_sub(1, Ordering::AcqRel);
            ToolkitError::DispatcherClosed
        })
    }
}

/// A UI thread driven by a channel.
///
/// # Example
///
/// ```ignore
/// let ui_loop = HeadlessLoop::spawn(&config)?;
/// let toolkit = ui_loop.bind(Toolkit::builder().with_family(MockToolkit::new())).build();
///
/// toolkit.sync_bridge().post(|| println!("on the UI thread"))?;
/// ui_loop.run_until_idle();
/// ```
pub struct HeadlessLoop {
    dispatcher: HeadlessDispatcher,
    thread_id: ThreadId,
    handle: Option<JoinHandle<()>>,
}

impl HeadlessLoop {
    /// Start a loop on a thread named after `config.thread_name`.
    pub fn spawn(config: &ToolkitConfig) -> ToolkitResult<Self> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let in_flight = Arc::new(AtomicUsize::new(0));

        let counter = in_flight.clone();
        let handle = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || run(receiver, counter))
            .map_err(|err| ToolkitError::ThreadSpawn(err.to_string()))?;

        let thread_id = handle.thread().id();
        tracing::debug!("Headless UI loop started on {:?}", thread_id);

        Ok(Self {
            dispatcher: HeadlessDispatcher { sender, in_flight },
            thread_id,
            handle: Some(handle),
        })
    }

    /// Start a loop with the default configuration.
    pub fn new() -> ToolkitResult<Self> {
        Self::spawn(&ToolkitConfig::default())
    }

    pub fn dispatcher(&self) -> Arc<dyn UiDispatcher> {
        Arc::new(self.dispatcher.clone())
    }

    /// The loop's thread, which is the UI thread of toolkits bound to it.
    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    /// Point `builder` at this loop as dispatcher and UI thread.
    pub fn bind(&self, builder: ToolkitBuilder) -> ToolkitBuilder {
        builder
            .with_dispatcher(self.dispatcher())
            .with_ui_thread(self.thread_id)
    }

    /// Items queued or running.
    pub fn pending(&self) -> usize {
        self.dispatcher.in_flight.load(Ordering::Acquire)
    }

    /// Block until every queued item, including items they queue, has run.
    ///
    /// Returns immediately when called on the loop thread itself or after
    /// shutdown.
    pub fn run_until_idle(&self) {
        if thread::current().id() == self.thread_id {
            return;
        }

        while self.pending() > 0 {
            let (done_tx, done_rx) = crossbeam_channel::bounded::<()>(1);
            if self.dispatcher.sender.send(Message::Marker(done_tx)).is_err()
                || done_rx.recv().is_err()
            {
                return;
            }
        }
    }

    /// Stop the loop after the items already queued and join its thread.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        let _ = self.dispatcher.sender.send(Message::Shutdown);

        if thread::current().id() == self.thread_id {
            return;
        }
        if handle.join().is_err() {
            tracing::error!("Headless UI loop thread panicked");
        }
    }
}

impl Drop for HeadlessLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(receiver: Receiver<Message>, in_flight: Arc<AtomicUsize>) {
    while let Ok(message) = receiver.recv() {
        match message {
            Message::Work(work) => {
                {
                    veneer_core::profiling::profile_scope!("ui_work_item");
                    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(work)) {
                        tracing::error!(
                            "Unhandled panic in UI work item: {}",
                            panic_message(&*payload)
                        );
                    }
                }
                in_flight.fetch_sub(1, Ordering::AcqRel);
                if receiver.is_empty() {
                    veneer_core::profiling::new_frame();
                }
            }
            Message::Marker(done) => {
                let _ = done.send(());
            }
            Message::Shutdown => break,
        }
    }

    // Whatever is still queued will never run.
    let dropped = receiver.try_iter().count();
    if dropped > 0 {
        tracing::debug!("Headless UI loop dropped {} queued items", dropped);
    }
    in_flight.store(0, Ordering::Release);
    tracing::debug!("Headless UI loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolkit::Toolkit;
    use parking_lot::Mutex;

    #[test]
    fn test_posted_work_runs_on_loop_thread_in_order() {
        let ui_loop = HeadlessLoop::new().unwrap();
        let toolkit = ui_loop.bind(Toolkit::builder()).build();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for i in 0..5 {
            let seen = seen.clone();
            toolkit
                .invoke(move || seen.lock().push((i, thread::current().id())))
                .unwrap();
        }
        ui_loop.run_until_idle();

        let seen = seen.lock();
        let order: Vec<_> = seen.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
        assert!(seen.iter().all(|(_, id)| *id == ui_loop.thread_id()));
    }

    #[test]
    fn test_invoke_after_shutdown_is_closed() {
        let ui_loop = HeadlessLoop::new().unwrap();
        let dispatcher = ui_loop.dispatcher();
        ui_loop.shutdown();

        assert_eq!(
            dispatcher.invoke(Box::new(|| {})),
            Err(ToolkitError::DispatcherClosed)
        );
    }

    #[test]
    fn test_thread_uses_configured_name() {
        let config = ToolkitConfig::default().with_thread_name("headless-test-ui");
        let ui_loop = HeadlessLoop::spawn(&config).unwrap();
        let toolkit = ui_loop.bind(Toolkit::builder()).build();

        let name = toolkit
            .sync_bridge()
            .send(|| thread::current().name().map(str::to_string))
            .unwrap();
        assert_eq!(name.as_deref(), Some("headless-test-ui"));
    }

    #[test]
    fn test_loop_survives_panicking_item() {
        let ui_loop = HeadlessLoop::new().unwrap();
        let dispatcher = ui_loop.dispatcher();
        dispatcher.invoke(Box::new(|| panic!("bad item"))).unwrap();

        let ran = Arc::new(Mutex::new(false));
        let flag = ran.clone();
        dispatcher.invoke(Box::new(move || *flag.lock() = true)).unwrap();
        ui_loop.run_until_idle();
        assert!(*ran.lock());
    }
}
