//! SPSC Ring Buffer - lock-free bounded handoff between two threads.
//!
//! Single producer, single consumer, no locks, no allocation after
//! construction. The producer and consumer indices live on their own
//! cache lines so the two threads never false-share.
//!
//! Capacity is rounded up to the next power of two and one slot is kept
//! open to distinguish full from empty, so the usable capacity is
//! `capacity() - 1`:
//!
//! - `empty`: `head == tail`
//! - `full`:  `((head + 1) & mask) == tail`
//!
//! Ordering: each side loads its own index relaxed, the peer index with
//! acquire, and publishes its own index with release, so a consumer that
//! observes a new head also observes the element written before it (and
//! symmetrically for slot reuse).

use std::cell::UnsafeCell;
use std::fmt;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_utils::CachePadded;

/// Create a ring with the smallest power-of-two slot count that is at
/// least `min_capacity`, and split it into its two endpoints. One slot
/// stays open, so the usable capacity is one less than the slot count.
///
/// # Panics
/// Panics if `min_capacity` is zero.
pub fn new<T>(min_capacity: usize) -> (Producer<T>, Consumer<T>) {
    assert!(min_capacity > 0, "ring capacity must be non-zero");

    let capacity = min_capacity.next_power_of_two();
    let slots = (0..capacity)
        .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
        .collect::<Vec<_>>()
        .into_boxed_slice();

    let shared = Arc::new(Shared {
        head: CachePadded::new(AtomicUsize::new(0)),
        tail: CachePadded::new(AtomicUsize::new(0)),
        mask: capacity - 1,
        slots,
    });

    (
        Producer {
            shared: Arc::clone(&shared),
        },
        Consumer { shared },
    )
}

struct Shared<T> {
    /// Producer index: next slot to write. Written only by the producer.
    head: CachePadded<AtomicUsize>,
    /// Consumer index: next slot to read. Written only by the consumer.
    tail: CachePadded<AtomicUsize>,
    mask: usize,
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
}

// Slots are handed across threads with release/acquire on the indices;
// each slot is accessed by exactly one side at a time.
unsafe impl<T: Send> Send for Shared<T> {}
unsafe impl<T: Send> Sync for Shared<T> {}

impl<T> Shared<T> {
    #[inline]
    fn next(&self, index: usize) -> usize {
        (index + 1) & self.mask
    }

    fn len(&self) -> usize {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Relaxed);
        if head >= tail {
            head - tail
        } else {
            self.slots.len() - tail + head
        }
    }
}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        // Both endpoints are gone; drop whatever was pushed but not popped.
        let head = self.head.load(Ordering::Relaxed);
        let mut tail = self.tail.load(Ordering::Relaxed);
        while tail != head {
            unsafe { (*self.slots[tail].get()).assume_init_drop() };
            tail = self.next(tail);
        }
    }
}

/// Error value returned by [`Producer::push`] when the ring is full; owns
/// the rejected element so the caller decides whether to drop it.
pub enum PushError<T> {
    Full(T),
}

impl<T> fmt::Debug for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushError::Full(_) => f.write_str("Full(..)"),
        }
    }
}

/// Error returned by [`Consumer::pop`] when the ring is empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PopError {
    Empty,
}

/// Producing endpoint. Exactly one thread may own this.
pub struct Producer<T> {
    shared: Arc<Shared<T>>,
}

/// Consuming endpoint. Exactly one thread may own this.
pub struct Consumer<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Producer<T> {
    /// Push an element without blocking.
    ///
    /// Returns the element back inside [`PushError::Full`] when no slot is
    /// free; the caller counts the drop. Never blocks, never spins.
    #[inline]
    pub fn push(&mut self, item: T) -> Result<(), PushError<T>> {
        let shared = &*self.shared;
        let head = shared.head.load(Ordering::Relaxed);
        let tail = shared.tail.load(Ordering::Acquire);

        if shared.next(head) == tail {
            return Err(PushError::Full(item));
        }

        unsafe { (*shared.slots[head].get()).write(item) };
        shared.head.store(shared.next(head), Ordering::Release);
        Ok(())
    }

    /// True if a push would currently fail.
    #[inline]
    pub fn is_full(&self) -> bool {
        let shared = &*self.shared;
        let head = shared.head.load(Ordering::Relaxed);
        let tail = shared.tail.load(Ordering::Acquire);
        shared.next(head) == tail
    }

    /// Total slot count (power of two); usable capacity is one less.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.shared.slots.len()
    }

    /// Number of elements currently buffered (advisory under concurrency).
    #[inline]
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Consumer<T> {
    /// Pop the oldest element without blocking.
    ///
    /// Returns `Err(PopError::Empty)` when nothing is buffered; this is
    /// not an error condition, the consumer yields and retries.
    #[inline]
    pub fn pop(&mut self) -> Result<T, PopError> {
        let shared = &*self.shared;
        let tail = shared.tail.load(Ordering::Relaxed);
        let head = shared.head.load(Ordering::Acquire);

        if head == tail {
            return Err(PopError::Empty);
        }

        let item = unsafe { (*shared.slots[tail].get()).assume_init_read() };
        shared.tail.store(shared.next(tail), Ordering::Release);
        Ok(item)
    }

    /// Total slot count (power of two); usable capacity is one less.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.shared.slots.len()
    }

    /// Number of elements currently buffered (advisory under concurrency).
    #[inline]
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish()
    }
}

impl<T> fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish()
    }
}
