//! Waiter lists for the channel's wait conditions
//!
//! A `WaitQueue` suspends tasks until a state transition is signaled.
//! Without care, the classic lost-wakeup race is possible:
//!
//! 10. Waiter: check condition ("buffer is empty, I must wait")
//! 20. Waker: put data into the buffer
//! 30. Waker: wake the queue (nobody is registered yet)
//! 40. Waiter: register and suspend, missing the wakeup
//!
//! To avoid this, the waiter acquires the queue lock, re-checks the
//! condition while holding it, and registers before releasing:
//!
//! ```ignore
//! if should_wait() {
//!     let guard = queue.lock();
//!     if should_wait() {
//!         queue.wait(guard, "reader").await;
//!         // Note: guard is consumed by wait and released before awaiting
//!     }
//! }
//! ```
//!
//! Wakers mutate state under the store lock, release it, then call
//! `wake_all` (which takes the queue lock). Lock ordering is therefore
//! queue -> store on the wait path, while wakers take the two locks in
//! disjoint critical sections: no nesting hazard, no missed wakeup.
//!
//! Wakes are broadcast: every registered waiter is fired and must
//! re-check its condition, because several woken tasks may race to
//! consume a single transition.

use parking_lot::{Mutex, MutexGuard};
use tokio::sync::oneshot;

/// One registered waiter.
///
/// Fields are private; the type is public only because it appears in the
/// guard returned by [`WaitQueue::lock`].
pub struct WaitSlot {
    sender: oneshot::Sender<()>,
    debug_hint: &'static str,
}

impl std::fmt::Debug for WaitSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaitSlot")
            .field("debug_hint", &self.debug_hint)
            .finish_non_exhaustive()
    }
}

/// A single wait condition: a named list of suspended tasks.
pub struct WaitQueue {
    name: &'static str,
    waiters: Mutex<Vec<WaitSlot>>,
}

impl WaitQueue {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            waiters: Mutex::new(Vec::new()),
        }
    }

    /// Acquire the queue lock for an atomic check-then-register step.
    pub fn lock(&self) -> MutexGuard<'_, Vec<WaitSlot>> {
        self.waiters.lock()
    }

    /// Register a waiter under the held guard and return the wait future.
    ///
    /// Registration happens before the guard is released; the suspension
    /// happens when the returned future is awaited. Dropping the future
    /// abandons the wait; the stale slot is discarded at the next wake.
    pub fn wait(
        &self,
        mut guard: MutexGuard<'_, Vec<WaitSlot>>,
        debug_hint: &'static str,
    ) -> impl std::future::Future<Output = ()> + Send {
        let (sender, receiver) = oneshot::channel();
        guard.push(WaitSlot { sender, debug_hint });
        drop(guard);

        async move {
            // Err only if the queue was dropped wholesale during teardown;
            // the caller re-checks its condition either way.
            let _ = receiver.await;
        }
    }

    /// Broadcast wake: drain the list and fire every registered waiter.
    pub fn wake_all(&self) {
        let waiters = std::mem::take(&mut *self.waiters.lock());
        if waiters.is_empty() {
            return;
        }
        log::debug!(
            "wait_queue {}: waking {} waiter(s)",
            self.name,
            waiters.len()
        );
        for slot in waiters {
            if slot.sender.send(()).is_err() {
                // The wait was abandoned (interrupted or timed out)
                log::debug!(
                    "wait_queue {}: stale waiter discarded (hint: {})",
                    self.name,
                    slot.debug_hint
                );
            }
        }
    }

    /// Number of currently registered waiters
    #[must_use]
    pub fn waiter_count(&self) -> usize {
        self.waiters.lock().len()
    }
}
