//! Cancellation of blocked channel operations
//!
//! An `Interrupt` is the userspace analogue of a pending signal: raising
//! it makes the owning session's current (or next) blocked wait return
//! `ChannelError::Interrupted` without transferring any data. The flag
//! is consumed on delivery, so a retried operation proceeds normally.
//!
//! Interrupts are only ever observed between critical sections, never
//! while a lock is held, so a cancelled operation leaves the channel
//! state untouched.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Default)]
struct InterruptState {
    raised: AtomicBool,
    notify: Notify,
}

/// Clonable handle used to cancel a session's blocked operation.
///
/// Each session owns one `Interrupt`; at most one operation per session
/// is in flight at a time, so a raised interrupt has exactly one
/// possible consumer.
#[derive(Clone, Default)]
pub struct Interrupt {
    state: Arc<InterruptState>,
}

impl Interrupt {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the interrupt and wake the pending wait, if any.
    pub fn raise(&self) {
        self.state.raised.store(true, Ordering::SeqCst);
        // notify_one stores a permit, so a wait that starts after this
        // call still observes the wakeup
        self.state.notify.notify_one();
    }

    /// Whether an interrupt is pending. Does not consume it.
    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.state.raised.load(Ordering::SeqCst)
    }

    /// Consume a pending interrupt, if any.
    pub(crate) fn take(&self) -> bool {
        self.state.raised.swap(false, Ordering::SeqCst)
    }

    /// Resolve once the interrupt is raised, consuming it.
    pub(crate) async fn raised(&self) {
        loop {
            if self.take() {
                return;
            }
            self.state.notify.notified().await;
        }
    }
}

impl std::fmt::Debug for Interrupt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Interrupt(raised={})", self.is_raised())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_raise_before_wait_is_observed() {
        let interrupt = Interrupt::new();
        interrupt.raise();
        assert!(interrupt.is_raised());
        interrupt.raised().await;
        // Consumed on delivery
        assert!(!interrupt.is_raised());
    }

    #[tokio::test]
    async fn test_raise_wakes_pending_wait() {
        let interrupt = Interrupt::new();
        let remote = interrupt.clone();

        let waiter = tokio::spawn(async move {
            interrupt.raised().await;
        });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        remote.raise();
        waiter.await.unwrap();
        assert!(!remote.is_raised());
    }
}
