//! Bounded byte channel: the producer/consumer core
//!
//! A `Channel` composes a [`BufferStore`] with two wait conditions and a
//! notification registry:
//!
//! - readers suspend on `read_wait` until the store becomes non-empty,
//! - writers suspend on `write_wait` until the store becomes non-full,
//! - subscribers get a `Readable` event whenever a write takes the store
//!   from empty to non-empty.
//!
//! # Locking
//!
//! One mutex per channel protects the store; each wait queue carries its
//! own lock. The wait path locks queue -> store (see `wait_queue` for
//! why), the mutation path never holds both at once: it mutates under
//! the store lock, releases it, then wakes. No awaits happen while any
//! lock is held.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::error::ChannelError;
use crate::idgen::Handle;
use crate::interrupt::Interrupt;
use crate::notifications::{ChannelEvent, NotificationRegistry, DEFAULT_EVENT_CAPACITY};
use crate::session::Session;
use crate::store::BufferStore;
use crate::wait_queue::WaitQueue;

/// What a readiness wait is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interest {
    pub readable: bool,
    pub writable: bool,
}

impl Interest {
    pub const READABLE: Self = Self {
        readable: true,
        writable: false,
    };
    pub const WRITABLE: Self = Self {
        readable: false,
        writable: true,
    };
    pub const BOTH: Self = Self {
        readable: true,
        writable: true,
    };
}

/// Whether an immediate non-blocking read or write would succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Readiness {
    /// At least one byte is stored
    pub readable: bool,
    /// At least one byte of free space remains
    pub writable: bool,
}

impl Readiness {
    #[must_use]
    pub fn satisfies(self, interest: Interest) -> bool {
        (interest.readable && self.readable) || (interest.writable && self.writable)
    }
}

/// State behind the channel mutex.
struct Shared<S> {
    store: S,
    closed: bool,
}

/// Bounded shared byte buffer plus its synchronization state.
///
/// Created once with a fixed-capacity store and torn down once with
/// [`Channel::close`]. All access in between goes through the channel
/// operations; the store is never aliased outside the lock.
pub struct Channel<S: BufferStore> {
    shared: Mutex<Shared<S>>,
    /// Signaled when the store becomes non-empty
    read_wait: WaitQueue,
    /// Signaled when the store becomes non-full
    write_wait: WaitQueue,
    notifications: NotificationRegistry,
}

impl<S: BufferStore> Channel<S> {
    /// Create a channel around the given store.
    #[must_use]
    pub fn new(store: S) -> Arc<Self> {
        log::info!("channel: created with capacity {}", store.capacity());
        Arc::new(Self {
            shared: Mutex::new(Shared {
                store,
                closed: false,
            }),
            read_wait: WaitQueue::new("nonempty"),
            write_wait: WaitQueue::new("nonfull"),
            notifications: NotificationRegistry::new(DEFAULT_EVENT_CAPACITY),
        })
    }

    /// Open a session on this channel with an explicit handle.
    #[must_use]
    pub fn open(self: &Arc<Self>, handle: Handle) -> Session<S> {
        Session::new(handle, Arc::clone(self))
    }

    /// Bytes currently stored
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.lock().store.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.lock().store.is_empty()
    }

    /// Size of the backing array (the ring store keeps one slot of it
    /// reserved)
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.shared.lock().store.capacity()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    /// Tear the channel down.
    ///
    /// Every blocked reader, writer and readiness wait is woken and
    /// fails with `Closed` on its re-check; subscribers receive a final
    /// `Closed` event. Subsequent operations fail with `Closed`.
    pub fn close(&self) {
        {
            let mut shared = self.shared.lock();
            if shared.closed {
                log::warn!("Channel::close() called on an already closed channel");
                return;
            }
            shared.closed = true;
        }
        log::info!("channel: closed");
        self.read_wait.wake_all();
        self.write_wait.wake_all();
        self.notifications.emit(ChannelEvent::Closed);
    }

    /// Current readiness. Never blocks, never mutates.
    #[must_use]
    pub fn readiness(&self) -> Readiness {
        self.snapshot().0
    }

    pub(crate) fn subscribe(&self, debug_hint: &str) -> broadcast::Receiver<ChannelEvent> {
        self.notifications.subscribe(debug_hint)
    }

    /// Read up to `buf.len()` bytes.
    ///
    /// Returns the number of bytes copied out; short reads are normal
    /// (only what is contiguously available is served, a wrapped ring
    /// needs a second call for the remainder). On an empty store a
    /// zero-length request completes with 0, a non-blocking request
    /// fails with `WouldBlock`, and a blocking one suspends until a
    /// writer fills the store, the channel closes, or the interrupt
    /// fires.
    pub(crate) async fn read_with(
        &self,
        buf: &mut [u8],
        non_blocking: bool,
        interrupt: &Interrupt,
    ) -> Result<usize, ChannelError> {
        loop {
            {
                let mut shared = self.shared.lock();
                if shared.closed {
                    return Err(ChannelError::Closed);
                }
                if !shared.store.is_empty() {
                    let span = shared.store.readable_span();
                    let n = span.len().min(buf.len());
                    buf[..n].copy_from_slice(&span[..n]);
                    shared.store.commit_read(n);
                    drop(shared);
                    if n > 0 {
                        // Space opened up: wake blocked writers outside
                        // the store lock
                        self.write_wait.wake_all();
                    }
                    log::debug!("channel: read {n} byte(s)");
                    return Ok(n);
                }
                // Empty store: a zero-length request is complete as-is,
                // before the would-block decision
                if buf.is_empty() {
                    return Ok(0);
                }
            }
            if non_blocking {
                return Err(ChannelError::WouldBlock);
            }
            self.wait_nonempty(interrupt).await?;
        }
    }

    /// Write up to `data.len()` bytes.
    ///
    /// Returns the number of bytes accepted; short writes are normal
    /// (limited to the contiguous free span). On a full store a
    /// zero-length request completes with 0, a non-blocking request
    /// fails with `WouldBlock`, and a blocking one suspends until a
    /// reader frees space, the channel closes, or the interrupt fires.
    pub(crate) async fn write_with(
        &self,
        data: &[u8],
        non_blocking: bool,
        interrupt: &Interrupt,
    ) -> Result<usize, ChannelError> {
        loop {
            {
                let mut shared = self.shared.lock();
                if shared.closed {
                    return Err(ChannelError::Closed);
                }
                if !shared.store.is_full() {
                    let was_empty = shared.store.is_empty();
                    let span = shared.store.writable_span();
                    let n = span.len().min(data.len());
                    span[..n].copy_from_slice(&data[..n]);
                    shared.store.commit_write(n);
                    drop(shared);
                    if n > 0 {
                        // Wake blocked readers and poll waits outside the
                        // store lock
                        self.read_wait.wake_all();
                        if was_empty {
                            // Exactly one event per empty -> non-empty
                            // transition, not one per write
                            self.notifications.emit(ChannelEvent::Readable);
                        }
                    }
                    log::debug!("channel: wrote {n} byte(s)");
                    return Ok(n);
                }
                if data.is_empty() {
                    return Ok(0);
                }
            }
            if non_blocking {
                return Err(ChannelError::WouldBlock);
            }
            self.wait_nonfull(interrupt).await?;
        }
    }

    /// Administrative clear: zero the store and return it to empty.
    ///
    /// Only writers can benefit from the transition, so only the
    /// non-full condition fires.
    pub(crate) fn reset(&self) -> Result<(), ChannelError> {
        {
            let mut shared = self.shared.lock();
            if shared.closed {
                return Err(ChannelError::Closed);
            }
            shared.store.reset();
        }
        log::debug!("channel: reset to empty");
        self.write_wait.wake_all();
        Ok(())
    }

    /// Suspend until the interest is satisfied; the readiness port.
    ///
    /// A snapshot that already satisfies the interest is returned without
    /// touching the wait queues, so repeated satisfied polls leave no
    /// registrations behind. Only a call that is about to suspend
    /// registers with both wait conditions, then re-checks, so a
    /// transition between the snapshot and the suspension is never lost.
    /// Timeout policy belongs to the caller (wrap in
    /// `tokio::time::timeout`); the channel has no timers of its own.
    pub(crate) async fn ready_with(
        &self,
        interest: Interest,
        interrupt: &Interrupt,
    ) -> Result<Readiness, ChannelError> {
        loop {
            // Fast path: nothing to wait for, nothing registered
            let (current, closed) = self.snapshot();
            if closed {
                return Err(ChannelError::Closed);
            }
            if current.satisfies(interest) || (!interest.readable && !interest.writable) {
                return Ok(current);
            }

            let read_wakeup = self.read_wait.wait(self.read_wait.lock(), "poll");
            let write_wakeup = self.write_wait.wait(self.write_wait.lock(), "poll");

            // Re-check after registering: a transition from here on
            // wakes us
            let (current, closed) = self.snapshot();
            if closed {
                return Err(ChannelError::Closed);
            }
            if current.satisfies(interest) {
                // Lost the race to a transition; the two registrations
                // go stale and are drained at the next wake
                return Ok(current);
            }

            tokio::select! {
                () = read_wakeup => {}
                () = write_wakeup => {}
                () = interrupt.raised() => return Err(ChannelError::Interrupted),
            }
        }
    }

    fn snapshot(&self) -> (Readiness, bool) {
        let shared = self.shared.lock();
        (
            Readiness {
                readable: !shared.store.is_empty(),
                writable: !shared.store.is_full(),
            },
            shared.closed,
        )
    }

    /// Suspend until data arrives, the channel closes, or the interrupt
    /// fires. Lock ordering: queue -> store.
    async fn wait_nonempty(&self, interrupt: &Interrupt) -> Result<(), ChannelError> {
        let guard = self.read_wait.lock();
        let must_wait = {
            let shared = self.shared.lock();
            !shared.closed && shared.store.is_empty()
        };
        if !must_wait {
            drop(guard);
            return Ok(());
        }
        let wakeup = self.read_wait.wait(guard, "read");
        tokio::select! {
            () = wakeup => Ok(()),
            () = interrupt.raised() => Err(ChannelError::Interrupted),
        }
    }

    /// Suspend until space frees up, the channel closes, or the
    /// interrupt fires. Lock ordering: queue -> store.
    async fn wait_nonfull(&self, interrupt: &Interrupt) -> Result<(), ChannelError> {
        let guard = self.write_wait.lock();
        let must_wait = {
            let shared = self.shared.lock();
            !shared.closed && shared.store.is_full()
        };
        if !must_wait {
            drop(guard);
            return Ok(());
        }
        let wakeup = self.write_wait.wait(guard, "write");
        tokio::select! {
            () = wakeup => Ok(()),
            () = interrupt.raised() => Err(ChannelError::Interrupted),
        }
    }
}

impl<S: BufferStore> std::fmt::Debug for Channel<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shared = self.shared.lock();
        write!(
            f,
            "Channel(len={}, capacity={}, closed={}, subscribers={})",
            shared.store.len(),
            shared.store.capacity(),
            shared.closed,
            self.notifications.subscriber_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RingStore;

    #[tokio::test]
    async fn test_satisfied_ready_leaves_no_registrations() {
        let channel = Channel::new(RingStore::new(8).unwrap());
        let interrupt = Interrupt::new();

        // Satisfied polls must not accumulate wait-set entries, even
        // when no read or write ever comes along to drain the queues
        for _ in 0..100 {
            let readiness = channel
                .ready_with(Interest::WRITABLE, &interrupt)
                .await
                .unwrap();
            assert!(readiness.writable);
        }
        assert_eq!(channel.read_wait.waiter_count(), 0);
        assert_eq!(channel.write_wait.waiter_count(), 0);
    }
}
