//! Cancel-and-replace debounce timer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Coalesces a burst of calls into at most one execution per quiet period.
///
/// Each `call` cancels whatever is pending and schedules the new closure
/// `delay` in the future, so only the last call of a burst survives.
/// Cancellation is a shared generation counter: a timer fires only if no
/// newer call or cancel has bumped the generation while it slept. Dropping
/// the debouncer cancels any pending execution.
pub struct Debouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Debouncer {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// A zero delay means callers should run their work synchronously.
    pub fn is_immediate(&self) -> bool {
        self.delay.is_zero()
    }

    /// Schedule `f` to run after the quiet period, replacing any pending
    /// execution. With a zero delay, `f` runs immediately on this thread.
    pub fn call<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.delay.is_zero() {
            f();
            return;
        }

        let scheduled = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = Arc::clone(&self.generation);
        let delay = self.delay;

        thread::spawn(move || {
            thread::sleep(delay);
            if generation.load(Ordering::SeqCst) == scheduled {
                f();
            }
        });
    }

    /// Cancel any pending execution.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
