//! Wakeup signal for idle queue consumers.

use std::sync::{Condvar, Mutex};
use std::time::Duration;

struct WakeupState {
    counter: u64,
}

/// Condvar-backed wakeup shared by the workers of one pool.
pub(crate) struct QueueWakeup {
    state: Mutex<WakeupState>,
    ready: Condvar,
}

impl QueueWakeup {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(WakeupState { counter: 0 }),
            ready: Condvar::new(),
        }
    }

    /// Wake every idle worker.
    pub(crate) fn notify(&self) {
        let mut state = self.state.lock().expect("queue wakeup poisoned");
        state.counter = state.counter.wrapping_add(1);
        self.ready.notify_all();
    }

    /// Wait until notified or the timeout elapses. Returns `true` when a
    /// notification arrived since `seen`.
    pub(crate) fn wait_for(&self, seen: &mut u64, timeout: Duration) -> bool {
        let state = self.state.lock().expect("queue wakeup poisoned");
        if state.counter != *seen {
            *seen = state.counter;
            return true;
        }
        let (state, _timeout) = self
            .ready
            .wait_timeout(state, timeout)
            .expect("queue wakeup poisoned");
        if state.counter != *seen {
            *seen = state.counter;
            return true;
        }
        false
    }
}
