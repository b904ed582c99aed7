//! Repeating UI-thread timers.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, Sender};
use parking_lot::Mutex;

use crate::dispatch::panic_message;
use crate::sync::SyncBridge;

/// Cancels a timer started with
/// [`Toolkit::timeout_invoke`](crate::Toolkit::timeout_invoke).
///
/// Dropping the handle does not stop the timer; it keeps firing until its
/// callback returns `false`.
#[derive(Debug)]
pub struct TimerHandle {
    cancelled: Arc<AtomicBool>,
    wake: Sender<()>,
}

impl TimerHandle {
    /// Stop the timer. A tick already running on the UI thread completes.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        let _ = self.wake.try_send(());
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

pub(crate) fn start(
    bridge: SyncBridge,
    interval: Duration,
    callback: impl FnMut() -> bool + Send + 'static,
) -> TimerHandle {
    let (wake, woken) = crossbeam_channel::bounded::<()>(1);
    let cancelled = Arc::new(AtomicBool::new(false));
    let handle = TimerHandle {
        cancelled: cancelled.clone(),
        wake,
    };

    let callback = Arc::new(Mutex::new(callback));
    let spawned = thread::Builder::new()
        .name("veneer-timer".to_string())
        .spawn(move || {
            let mut handle_alive = true;
            loop {
                if handle_alive {
                    match woken.recv_timeout(interval) {
                        Ok(()) | Err(RecvTimeoutError::Timeout) => {}
                        Err(RecvTimeoutError::Disconnected) => {
                            handle_alive = false;
                            continue;
                        }
                    }
                } else {
                    thread::sleep(interval);
                }

                if cancelled.load(Ordering::Acquire) {
                    break;
                }

                let tick = callback.clone();
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    bridge.send(move || {
                        let mut callback = tick.lock();
                        (*callback)()
                    })
                }));

                match outcome {
                    Ok(Ok(true)) => {}
                    Ok(Ok(false)) => break,
                    Ok(Err(err)) => {
                        tracing::debug!("Stopping timer: {}", err);
                        break;
                    }
                    Err(payload) => {
                        bridge.toolkit().report_panic(&panic_message(&*payload));
                        break;
                    }
                }
            }
            tracing::trace!("Timer thread exiting");
        });

    if let Err(err) = spawned {
        tracing::error!("Failed to spawn timer thread: {}", err);
        handle.cancelled.store(true, Ordering::Release);
    }

    handle
}

#[cfg(test)]
mod tests {
    use crate::toolkit::Toolkit;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    fn wait_until(deadline: Duration, condition: impl Fn() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < deadline {
            if condition() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        condition()
    }

    #[test]
    fn test_timer_stops_when_callback_returns_false() {
        let toolkit = Toolkit::builder().build();
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();

        let handle = toolkit.timeout_invoke(Duration::from_millis(1), move || {
            counter.fetch_add(1, Ordering::SeqCst) + 1 < 3
        });

        assert!(wait_until(Duration::from_secs(2), || ticks.load(Ordering::SeqCst) == 3));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
        assert!(!handle.is_cancelled());
    }

    #[test]
    fn test_cancel_stops_ticks() {
        let toolkit = Toolkit::builder().build();
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();

        let handle = toolkit.timeout_invoke(Duration::from_millis(1), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        });
        assert!(wait_until(Duration::from_secs(2), || ticks.load(Ordering::SeqCst) > 0));

        handle.cancel();
        std::thread::sleep(Duration::from_millis(10));
        let after_cancel = ticks.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(ticks.load(Ordering::SeqCst), after_cancel);
    }
}
