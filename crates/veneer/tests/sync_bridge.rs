//! Posting and sending work to a UI thread owned by a headless loop.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use veneer::dispatch::panic_message;
use veneer::{HeadlessLoop, Toolkit, ToolkitError};

fn headless_toolkit() -> (HeadlessLoop, Toolkit) {
    let ui_loop = HeadlessLoop::new().unwrap();
    let toolkit = ui_loop.bind(Toolkit::builder()).build();
    (ui_loop, toolkit)
}

#[test]
fn test_send_from_ui_thread_runs_inline() {
    let (ui_loop, toolkit) = headless_toolkit();
    let bridge = toolkit.sync_bridge();
    let observed = Arc::new(Mutex::new(None));

    let inner = bridge.clone();
    let slot = observed.clone();
    bridge
        .post(move || {
            let outer = thread::current().id();
            let flag = Arc::new(AtomicBool::new(false));
            let set = flag.clone();
            let inner_thread = inner
                .send(move || {
                    set.store(true, Ordering::SeqCst);
                    thread::current().id()
                })
                .unwrap();
            // Inline execution means the flag is already set here.
            *slot.lock() = Some((outer, inner_thread, flag.load(Ordering::SeqCst)));
        })
        .unwrap();
    ui_loop.run_until_idle();

    let (outer, inner_thread, ran) = observed.lock().take().unwrap();
    assert_eq!(outer, ui_loop.thread_id());
    assert_eq!(inner_thread, outer);
    assert!(ran);
}

#[test]
fn test_send_from_background_blocks_until_done() {
    let (ui_loop, toolkit) = headless_toolkit();
    let done = Arc::new(AtomicBool::new(false));

    let flag = done.clone();
    let ran_on = toolkit
        .sync_bridge()
        .send(move || {
            thread::sleep(Duration::from_millis(30));
            flag.store(true, Ordering::SeqCst);
            thread::current().id()
        })
        .unwrap();

    assert!(done.load(Ordering::SeqCst));
    assert_eq!(ran_on, ui_loop.thread_id());
    assert_ne!(ran_on, thread::current().id());
}

#[test]
fn test_send_resumes_panic_on_caller() {
    let (ui_loop, toolkit) = headless_toolkit();
    let bridge = toolkit.sync_bridge();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        bridge.send(|| -> u32 { panic!("widget exploded") })
    }));
    let payload = result.unwrap_err();
    assert_eq!(panic_message(&*payload), "widget exploded");

    // The UI thread survives and keeps serving.
    assert_eq!(bridge.send(|| 1 + 1).unwrap(), 2);
    drop(ui_loop);
}

#[test]
fn test_post_does_not_block() {
    let (ui_loop, toolkit) = headless_toolkit();
    let (release_tx, release_rx) = crossbeam_channel::bounded::<()>(1);
    let runs = Arc::new(AtomicUsize::new(0));
    let ran_on = Arc::new(Mutex::new(None));

    let counter = runs.clone();
    let slot = ran_on.clone();
    toolkit
        .sync_bridge()
        .post(move || {
            // Only released after post has returned to the caller.
            release_rx.recv().unwrap();
            counter.fetch_add(1, Ordering::SeqCst);
            *slot.lock() = Some(thread::current().id());
        })
        .unwrap();

    assert_eq!(runs.load(Ordering::SeqCst), 0);
    release_tx.send(()).unwrap();
    ui_loop.run_until_idle();

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(*ran_on.lock(), Some(ui_loop.thread_id()));
}

#[test]
fn test_posts_from_many_threads_run_on_ui_thread_once() {
    let (ui_loop, toolkit) = headless_toolkit();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let posters: Vec<_> = (0..4)
        .map(|poster| {
            let bridge = toolkit.sync_bridge();
            let seen = seen.clone();
            thread::spawn(move || {
                for item in 0..25 {
                    let seen = seen.clone();
                    bridge
                        .post(move || seen.lock().push((poster, item, thread::current().id())))
                        .unwrap();
                }
            })
        })
        .collect();
    for poster in posters {
        poster.join().unwrap();
    }
    ui_loop.run_until_idle();

    let seen = seen.lock();
    assert_eq!(seen.len(), 100);
    assert!(seen.iter().all(|(_, _, id)| *id == ui_loop.thread_id()));
    for poster in 0..4 {
        let order: Vec<_> = seen
            .iter()
            .filter(|(p, _, _)| *p == poster)
            .map(|(_, item, _)| *item)
            .collect();
        assert_eq!(order, (0..25).collect::<Vec<_>>());
    }
}

#[test]
fn test_post_panic_reaches_unhandled_hook() {
    let ui_loop = HeadlessLoop::new().unwrap();
    let reported = Arc::new(Mutex::new(Vec::new()));
    let sink = reported.clone();
    let toolkit = ui_loop
        .bind(Toolkit::builder())
        .with_unhandled_panic_hook(move |message| sink.lock().push(message.to_string()))
        .build();

    toolkit
        .sync_bridge()
        .post(|| panic!("fire and forget"))
        .unwrap();
    ui_loop.run_until_idle();

    assert_eq!(*reported.lock(), vec!["fire and forget".to_string()]);
}

#[test]
fn test_send_after_shutdown_reports_closed() {
    let (ui_loop, toolkit) = headless_toolkit();
    ui_loop.shutdown();

    assert_eq!(
        toolkit.sync_bridge().send(|| ()),
        Err(ToolkitError::DispatcherClosed)
    );
    assert_eq!(
        toolkit.sync_bridge().post(|| ()),
        Err(ToolkitError::DispatcherClosed)
    );
}
