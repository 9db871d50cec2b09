//! Bounded byte storage strategies
//!
//! Two interchangeable stores behind one trait: a compacting buffer that
//! keeps data left-aligned and shifts on every read, and a wrap-around
//! ring that keeps one sentinel slot free to tell "full" from "empty".
//!
//! Stores do no locking of their own; every call happens under the
//! channel mutex.

use crate::error::ChannelError;

/// Raw storage and space accounting for a channel.
///
/// Invariant between calls: `0 <= len() <= capacity()`, and for the ring
/// variant `len() <= capacity() - 1`.
pub trait BufferStore: Send + 'static {
    /// Total size of the backing array
    fn capacity(&self) -> usize;

    /// Bytes currently stored
    fn len(&self) -> usize;

    /// Bytes the store can still accept
    fn free_space(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_full(&self) -> bool {
        self.free_space() == 0
    }

    /// Longest contiguous readable run, without wrapping.
    ///
    /// May be shorter than `len()` for a wrapped ring; the caller issues
    /// another read for the remainder.
    fn readable_span(&self) -> &[u8];

    /// First contiguous run of free space
    fn writable_span(&mut self) -> &mut [u8];

    /// Consume `n` bytes from the front; `n` must not exceed the
    /// readable span
    fn commit_read(&mut self, n: usize);

    /// Publish `n` bytes already placed in the writable span
    fn commit_write(&mut self, n: usize);

    /// Zero the storage and return to the empty state
    fn reset(&mut self);
}

/// Left-aligned store: consumed bytes are shifted out on every read.
///
/// Trades a copy of up to `capacity` bytes per read for zero wasted
/// capacity and trivial span accounting.
pub struct CompactingStore {
    storage: Box<[u8]>,
    used: usize,
}

impl CompactingStore {
    /// Create a store of the given fixed capacity.
    ///
    /// # Errors
    /// `InvalidArgument` if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, ChannelError> {
        if capacity == 0 {
            return Err(ChannelError::InvalidArgument("capacity must be positive"));
        }
        Ok(Self {
            storage: vec![0u8; capacity].into_boxed_slice(),
            used: 0,
        })
    }
}

impl BufferStore for CompactingStore {
    fn capacity(&self) -> usize {
        self.storage.len()
    }

    fn len(&self) -> usize {
        self.used
    }

    fn free_space(&self) -> usize {
        self.storage.len() - self.used
    }

    fn readable_span(&self) -> &[u8] {
        &self.storage[..self.used]
    }

    fn writable_span(&mut self) -> &mut [u8] {
        &mut self.storage[self.used..]
    }

    fn commit_read(&mut self, n: usize) {
        debug_assert!(n <= self.used);
        self.storage.copy_within(n..self.used, 0);
        self.used -= n;
    }

    fn commit_write(&mut self, n: usize) {
        debug_assert!(n <= self.free_space());
        self.used += n;
    }

    fn reset(&mut self) {
        self.storage.fill(0);
        self.used = 0;
    }
}

/// Wrap-around ring store with one sentinel slot.
///
/// `head` is the next byte to read, `tail` the next byte to write.
/// `head == tail` means empty; one slot always stays free, so at most
/// `capacity - 1` bytes are stored.
pub struct RingStore {
    storage: Box<[u8]>,
    head: usize,
    tail: usize,
}

impl RingStore {
    /// Create a ring of the given array size (usable space is one less).
    ///
    /// # Errors
    /// `InvalidArgument` if `capacity` is below 2: the sentinel slot
    /// would leave no usable space.
    pub fn new(capacity: usize) -> Result<Self, ChannelError> {
        if capacity < 2 {
            return Err(ChannelError::InvalidArgument(
                "ring capacity must be at least 2",
            ));
        }
        Ok(Self {
            storage: vec![0u8; capacity].into_boxed_slice(),
            head: 0,
            tail: 0,
        })
    }
}

impl BufferStore for RingStore {
    fn capacity(&self) -> usize {
        self.storage.len()
    }

    fn len(&self) -> usize {
        let cap = self.storage.len();
        (self.tail + cap - self.head) % cap
    }

    fn free_space(&self) -> usize {
        let cap = self.storage.len();
        (self.head + cap - self.tail - 1) % cap
    }

    fn readable_span(&self) -> &[u8] {
        if self.tail >= self.head {
            &self.storage[self.head..self.tail]
        } else {
            // Wrapped: serve up to the end of the array
            &self.storage[self.head..]
        }
    }

    fn writable_span(&mut self) -> &mut [u8] {
        let cap = self.storage.len();
        if self.head > self.tail {
            // Fill up to one slot before the read cursor
            &mut self.storage[self.tail..self.head - 1]
        } else if self.head == 0 {
            // Cannot wrap: the sentinel slot is the last one
            &mut self.storage[self.tail..cap - 1]
        } else {
            &mut self.storage[self.tail..]
        }
    }

    fn commit_read(&mut self, n: usize) {
        debug_assert!(n <= self.readable_span().len());
        self.head = (self.head + n) % self.storage.len();
    }

    fn commit_write(&mut self, n: usize) {
        debug_assert!(n <= self.free_space());
        self.tail = (self.tail + n) % self.storage.len();
    }

    fn reset(&mut self) {
        self.storage.fill(0);
        self.head = 0;
        self.tail = 0;
    }
}
