//! Background task pool.
//!
//! Work that must not block the UI thread runs here; results come back to
//! the UI thread through a [`UiTaskScheduler`].

use std::future::Future;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use async_executor::{Executor, Task};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::scheduler::{UiTask, UiTaskScheduler};

/// How long an idle worker waits before polling the executor again.
const IDLE_WAIT: Duration = Duration::from_millis(1);

/// A pool of worker threads driving an `async-executor`.
///
/// # Example
///
/// ```ignore
/// let pool = TaskPool::new(2);
/// let scheduler = toolkit.task_scheduler();
///
/// pool.spawn_then_on_ui(&scheduler, async { load_config() }, move |config| {
///     label.set_text(config.title);
/// })
/// .detach();
/// ```
pub struct TaskPool {
    executor: Arc<Executor<'static>>,
    workers: Vec<thread::JoinHandle<()>>,
    /// Dropping the sender tells every worker to exit.
    shutdown: Option<Sender<()>>,
}

impl TaskPool {
    /// Create a pool with `num_threads` workers.
    ///
    /// # Panics
    ///
    /// Panics if `num_threads` is 0.
    pub fn new(num_threads: usize) -> Self {
        assert!(num_threads > 0, "TaskPool must have at least one thread");

        let executor = Arc::new(Executor::new());
        let (shutdown, stop) = crossbeam_channel::bounded::<()>(0);
        let mut workers = Vec::with_capacity(num_threads);

        for index in 0..num_threads {
            let executor = executor.clone();
            let stop = stop.clone();
            let spawned = thread::Builder::new()
                .name(format!("veneer-pool-{}", index))
                .spawn(move || work_loop(&executor, &stop));

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(err) => tracing::error!("Failed to spawn pool worker {}: {}", index, err),
            }
        }

        tracing::debug!("TaskPool started {} workers", workers.len());

        Self {
            executor,
            workers,
            shutdown: Some(shutdown),
        }
    }

    /// One worker per spare core, leaving one for the UI thread.
    pub fn default_threads() -> Self {
        Self::new(num_cpus::get().saturating_sub(1).max(1))
    }

    /// Run `future` on the pool.
    pub fn spawn<T>(&self, future: impl Future<Output = T> + Send + 'static) -> Task<T>
    where
        T: Send + 'static,
    {
        self.executor.spawn(future)
    }

    /// Run `future` on the pool, then hand its output to `continuation` on
    /// the UI thread.
    pub fn spawn_then_on_ui<T, R>(
        &self,
        scheduler: &UiTaskScheduler,
        future: impl Future<Output = T> + Send + 'static,
        continuation: impl FnOnce(T) -> R + Send + 'static,
    ) -> UiTask<R>
    where
        T: Send + 'static,
        R: Send + 'static,
    {
        let background = self.executor.spawn(future);
        scheduler.spawn(async move { continuation(background.await) })
    }

    pub fn thread_count(&self) -> usize {
        self.workers.len()
    }

    /// Stop the workers and wait for them. Tasks still pending are dropped.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        self.shutdown.take();
        for worker in self.workers.drain(..) {
            if let Err(err) = worker.join() {
                tracing::error!("Pool worker panicked: {:?}", err);
            }
        }
    }
}

fn work_loop(executor: &Executor<'static>, stop: &Receiver<()>) {
    loop {
        if executor.try_tick() {
            continue;
        }
        match stop.recv_timeout(IDLE_WAIT) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

impl Default for TaskPool {
    fn default() -> Self {
        Self::default_threads()
    }
}

impl Drop for TaskPool {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}
