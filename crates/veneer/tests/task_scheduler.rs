//! Async continuations on the UI thread.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use veneer::dispatch::panic_message;
use veneer::{HeadlessLoop, TaskPool, Toolkit};

fn headless_toolkit() -> (HeadlessLoop, Toolkit) {
    let ui_loop = HeadlessLoop::new().unwrap();
    let toolkit = ui_loop.bind(Toolkit::builder()).build();
    (ui_loop, toolkit)
}

/// Tracks how many futures are inside a poll at once.
#[derive(Default)]
struct Occupancy {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl Occupancy {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

#[test]
fn test_continuations_never_overlap() {
    let (ui_loop, toolkit) = headless_toolkit();
    let occupancy = Arc::new(Occupancy::default());
    let threads = Arc::new(Mutex::new(Vec::new()));

    let spawners: Vec<_> = (0..2)
        .map(|_| {
            let scheduler = toolkit.task_scheduler();
            let occupancy = occupancy.clone();
            let threads = threads.clone();
            thread::spawn(move || {
                scheduler.spawn(async move {
                    for _ in 0..3 {
                        occupancy.enter();
                        threads.lock().push(thread::current().id());
                        thread::sleep(Duration::from_millis(5));
                        occupancy.leave();
                        futures_lite::future::yield_now().await;
                    }
                })
            })
        })
        .collect();

    let tasks: Vec<_> = spawners.into_iter().map(|h| h.join().unwrap()).collect();
    for task in tasks {
        pollster::block_on(task);
    }
    ui_loop.run_until_idle();

    assert_eq!(occupancy.peak.load(Ordering::SeqCst), 1);
    let threads = threads.lock();
    assert_eq!(threads.len(), 6);
    assert!(threads.iter().all(|id| *id == ui_loop.thread_id()));
}

#[test]
fn test_continuation_after_pool_work_runs_on_ui_thread() {
    let (ui_loop, toolkit) = headless_toolkit();
    let pool = TaskPool::new(2);
    let scheduler = toolkit.task_scheduler();

    let task = pool.spawn_then_on_ui(
        &scheduler,
        async { (21, thread::current().id()) },
        |(value, worker)| (value * 2, worker, thread::current().id()),
    );
    let (value, worker, continuation) = pollster::block_on(task);

    assert_eq!(value, 42);
    assert_ne!(worker, ui_loop.thread_id());
    assert_eq!(continuation, ui_loop.thread_id());
    pool.shutdown();
}

#[test]
fn test_await_inside_ui_task_resumes_on_ui_thread() {
    let (ui_loop, toolkit) = headless_toolkit();
    let pool = Arc::new(TaskPool::new(1));
    let scheduler = toolkit.task_scheduler();

    let background = pool.clone();
    let task = scheduler.spawn(async move {
        let before = thread::current().id();
        let loaded = background.spawn(async { "payload" }).await;
        (before, loaded, thread::current().id())
    });
    let (before, loaded, after) = pollster::block_on(task);

    assert_eq!(loaded, "payload");
    assert_eq!(before, ui_loop.thread_id());
    assert_eq!(after, ui_loop.thread_id());
}

#[test]
fn test_try_execute_inline_from_background_runs_on_ui_thread() {
    let (ui_loop, toolkit) = headless_toolkit();
    let scheduler = toolkit.task_scheduler();
    let (runnable, task) = scheduler.create_task(async { thread::current().id() });

    assert!(scheduler.try_execute_inline(runnable));
    assert!(task.is_finished());
    assert_eq!(pollster::block_on(task), ui_loop.thread_id());
}

#[test]
fn test_spawn_from_ui_work_runs_after_it() {
    let (ui_loop, toolkit) = headless_toolkit();
    let order = Arc::new(Mutex::new(Vec::new()));

    let scheduler = toolkit.task_scheduler();
    let log = order.clone();
    toolkit
        .sync_bridge()
        .post(move || {
            let inner = log.clone();
            scheduler
                .spawn(async move { inner.lock().push("task") })
                .detach();
            log.lock().push("work-end");
        })
        .unwrap();
    ui_loop.run_until_idle();

    assert_eq!(*order.lock(), vec!["work-end", "task"]);
}

#[test]
fn test_panic_reaches_awaiter() {
    let (_ui_loop, toolkit) = headless_toolkit();
    let task = toolkit
        .task_scheduler()
        .spawn(async { panic!("continuation failed") });

    let payload =
        panic::catch_unwind(AssertUnwindSafe(|| pollster::block_on(task))).unwrap_err();
    assert_eq!(panic_message(&*payload), "continuation failed");
}

#[test]
fn test_dropped_handle_still_runs() {
    let (ui_loop, toolkit) = headless_toolkit();
    let ran = Arc::new(AtomicUsize::new(0));

    let counter = ran.clone();
    drop(toolkit.task_scheduler().spawn(async move {
        counter.fetch_add(1, Ordering::SeqCst);
    }));
    ui_loop.run_until_idle();

    assert_eq!(ran.load(Ordering::SeqCst), 1);
}
