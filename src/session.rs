//! Session layer: the open/close surface over a channel
//!
//! A `Session` is what a collaborator gets from [`Channel::open`]. It
//! carries the interrupt used to cancel its blocked operations and
//! enforces at-most-one in-flight operation through `&mut self`.
//!
//! # Thread Safety
//!
//! - **Sessions are independent**: any number of sessions can operate on
//!   the same channel concurrently; the channel serializes them.
//! - **NOT reentrant per session**: `read`/`write`/`ready` take
//!   `&mut self`, so a single session cannot overlap its own operations.
//!   This is enforced at compile time by the borrow checker.
//! - Cancelling a blocked operation happens through a clone of the
//!   session's [`Interrupt`], obtained up front via
//!   [`Session::interrupter`].

use std::fmt;
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::channel::{Channel, Interest, Readiness};
use crate::error::ChannelError;
use crate::idgen::Handle;
use crate::interrupt::Interrupt;
use crate::notifications::ChannelEvent;
use crate::store::BufferStore;

pub struct Session<S: BufferStore> {
    handle: Handle,
    channel: Arc<Channel<S>>,
    interrupt: Interrupt,
    closed: bool,
}

impl<S: BufferStore> Session<S> {
    pub(crate) fn new(handle: Handle, channel: Arc<Channel<S>>) -> Self {
        Self {
            handle,
            channel,
            interrupt: Interrupt::new(),
            closed: false,
        }
    }

    /// Get the session's handle
    #[must_use]
    pub fn handle(&self) -> Handle {
        self.handle
    }

    fn ensure_open(&self) -> Result<(), ChannelError> {
        if self.closed {
            Err(ChannelError::Closed)
        } else {
            Ok(())
        }
    }

    /// Read up to `buf.len()` bytes from the channel.
    ///
    /// Short reads are normal: the call returns as much as is currently
    /// available, never more than requested. With `non_blocking` an
    /// empty channel yields `WouldBlock` instead of suspending.
    ///
    /// # Errors
    /// `WouldBlock`, `Interrupted`, or `Closed`; see [`ChannelError`].
    pub async fn read(
        &mut self,
        buf: &mut [u8],
        non_blocking: bool,
    ) -> Result<usize, ChannelError> {
        self.ensure_open()?;
        self.channel.read_with(buf, non_blocking, &self.interrupt).await
    }

    /// Write up to `data.len()` bytes to the channel.
    ///
    /// Short writes are normal: only the contiguous free span is
    /// accepted, the caller re-invokes for the remainder. With
    /// `non_blocking` a full channel yields `WouldBlock` instead of
    /// suspending.
    ///
    /// # Errors
    /// `WouldBlock`, `Interrupted`, or `Closed`; see [`ChannelError`].
    pub async fn write(
        &mut self,
        data: &[u8],
        non_blocking: bool,
    ) -> Result<usize, ChannelError> {
        self.ensure_open()?;
        self.channel.write_with(data, non_blocking, &self.interrupt).await
    }

    /// Administrative clear: drop all stored bytes and zero the storage.
    ///
    /// # Errors
    /// `Closed` if the session or channel is torn down.
    pub fn reset(&mut self) -> Result<(), ChannelError> {
        self.ensure_open()?;
        self.channel.reset()
    }

    /// Instant readiness snapshot; never blocks, never mutates.
    ///
    /// # Errors
    /// `Closed` if the session is torn down.
    pub fn readiness(&self) -> Result<Readiness, ChannelError> {
        self.ensure_open()?;
        Ok(self.channel.readiness())
    }

    /// Suspend until the interest is satisfied, then return the
    /// readiness that satisfied it. Deadlines are the caller's business:
    /// wrap the call in `tokio::time::timeout`.
    ///
    /// # Errors
    /// `Interrupted` or `Closed`.
    pub async fn ready(&mut self, interest: Interest) -> Result<Readiness, ChannelError> {
        self.ensure_open()?;
        self.channel.ready_with(interest, &self.interrupt).await
    }

    /// Subscribe to channel events.
    ///
    /// The subscription is independent of the session once created: it
    /// keeps delivering events after [`Session::close`] and ends only
    /// when the returned receiver is dropped. Nothing is retained in the
    /// channel on the subscriber's behalf beyond the receiver itself.
    ///
    /// # Errors
    /// `Closed` if the session is torn down.
    pub fn subscribe(
        &self,
        debug_hint: &str,
    ) -> Result<broadcast::Receiver<ChannelEvent>, ChannelError> {
        self.ensure_open()?;
        Ok(self.channel.subscribe(debug_hint))
    }

    /// Clonable handle to cancel this session's blocked operation.
    #[must_use]
    pub fn interrupter(&self) -> Interrupt {
        self.interrupt.clone()
    }

    /// Close the session. Subsequent operations fail with `Closed`;
    /// the channel itself stays open for other sessions.
    pub fn close(&mut self) {
        if self.closed {
            log::warn!("Session::close() called on already closed session: {self:?}");
            return;
        }
        self.closed = true;
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl<S: BufferStore> fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Session(handle={:?}, closed={}, channel={:?})",
            self.handle, self.closed, self.channel
        )
    }
}

impl<S: BufferStore> Drop for Session<S> {
    fn drop(&mut self) {
        if !self.closed {
            self.close();
        }
    }
}
