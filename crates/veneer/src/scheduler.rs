//! Task scheduler that runs every continuation on the UI thread.
//!
//! Futures spawned here are polled only on the UI thread, one at a time. The
//! scheduler keeps no queue of its own: every wake-up is redirected through the
//! toolkit's dispatcher, so there is never a backlog to cancel.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

pub use async_task::Runnable;

use crate::sync::SyncBridge;
use crate::toolkit::Toolkit;

/// Continuations never run concurrently with each other or with other UI work.
pub const MAXIMUM_CONCURRENCY: usize = 1;

/// Schedules futures onto a toolkit's UI thread.
///
/// # Example
///
/// ```ignore
/// let scheduler = toolkit.task_scheduler();
/// let task = scheduler.spawn(async move {
///     let text = download().await;
///     entry.set_text(text);
/// });
/// task.detach();
/// ```
#[derive(Debug, Clone)]
pub struct UiTaskScheduler {
    toolkit: Toolkit,
    bridge: SyncBridge,
}

impl UiTaskScheduler {
    pub fn new(toolkit: &Toolkit) -> Self {
        Self {
            toolkit: toolkit.clone(),
            bridge: toolkit.sync_bridge(),
        }
    }

    pub fn maximum_concurrency(&self) -> usize {
        MAXIMUM_CONCURRENCY
    }

    /// Spawn `future`; its first poll is queued immediately.
    pub fn spawn<F>(&self, future: F) -> UiTask<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let (runnable, task) = self.create_task(future);
        self.queue(runnable);
        task
    }

    /// Create a task without scheduling its first poll.
    ///
    /// The caller decides how the returned runnable first runs, through
    /// [`queue`](Self::queue) or [`try_execute_inline`](Self::try_execute_inline).
    /// Later wake-ups always go through `queue`.
    pub fn create_task<F>(&self, future: F) -> (Runnable, UiTask<F::Output>)
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let scheduler = self.clone();
        let (runnable, task) = async_task::Builder::new()
            .propagate_panic(true)
            .spawn(move |_: &()| future, move |runnable: Runnable| {
                scheduler.queue(runnable)
            });
        (runnable, UiTask { task: Some(task) })
    }

    /// Run `runnable` on the UI thread without blocking the caller.
    ///
    /// The hop goes through a toolkit invoke and then a bridge post, so a
    /// continuation queued from inside UI work still lands behind it.
    pub fn queue(&self, runnable: Runnable) {
        if !self.toolkit.has_ui_thread() {
            runnable.run();
            return;
        }

        let bridge = self.bridge.clone();
        let queued = self.toolkit.dispatch(Box::new(move || {
            if let Err(err) = bridge.post(move || {
                runnable.run();
            }) {
                tracing::error!("Dropping UI continuation: {}", err);
            }
        }));
        if let Err(err) = queued {
            tracing::error!("Dropping UI continuation: {}", err);
        }
    }

    /// Run `runnable` now, on the UI thread.
    ///
    /// On the UI thread (or with none attached) it runs inline; otherwise the
    /// caller blocks while it runs on the UI thread. Returns whether it ran.
    pub fn try_execute_inline(&self, runnable: Runnable) -> bool {
        if !self.toolkit.has_ui_thread() || self.toolkit.is_ui_thread() {
            runnable.run();
            return true;
        }

        match self.bridge.send(move || {
            runnable.run();
        }) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!("Inline execution hop failed: {}", err);
                false
            }
        }
    }

    /// Always `false`: nothing is ever held back to be dequeued.
    pub fn try_dequeue(&self, _runnable: &Runnable) -> bool {
        false
    }
}

/// Handle to a future spawned on a [`UiTaskScheduler`].
///
/// Awaiting yields the output, or resumes the panic the future raised.
/// Dropping the handle lets the future keep running.
#[must_use = "awaiting or detaching a UiTask is the only way to observe it"]
pub struct UiTask<T> {
    task: Option<async_task::Task<T>>,
}

impl<T> UiTask<T> {
    /// Let the future run to completion unobserved.
    pub fn detach(mut self) {
        if let Some(task) = self.task.take() {
            task.detach();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_some_and(|task| task.is_finished())
    }
}

impl<T> Future for UiTask<T> {
    type Output = T;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.task.as_mut() {
            Some(task) => Pin::new(task).poll(cx),
            None => Poll::Pending,
        }
    }
}

impl<T> Drop for UiTask<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.detach();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_detached_spawn_runs_inline() {
        let toolkit = Toolkit::builder().build();
        let task = toolkit.task_scheduler().spawn(async { 5 });
        assert!(task.is_finished());
        assert_eq!(pollster::block_on(task), 5);
    }

    #[test]
    fn test_try_dequeue_always_fails() {
        let toolkit = Toolkit::builder().build();
        let scheduler = toolkit.task_scheduler();
        let (runnable, task) = scheduler.create_task(async {});
        assert!(!scheduler.try_dequeue(&runnable));
        assert!(scheduler.try_execute_inline(runnable));
        pollster::block_on(task);
    }

    #[test]
    fn test_try_execute_inline_on_ui_thread() {
        let toolkit = Toolkit::builder()
            .with_ui_thread(thread::current().id())
            .build();
        let scheduler = toolkit.task_scheduler();
        let (runnable, task) = scheduler.create_task(async { thread::current().id() });

        assert!(scheduler.try_execute_inline(runnable));
        assert_eq!(pollster::block_on(task), thread::current().id());
        assert_eq!(scheduler.maximum_concurrency(), 1);
    }
}
