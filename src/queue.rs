//! Bounded MPMC queue on a ring of sequenced cells.
//!
//! Implementation of Dmitry Vyukov's bounded MPMC algorithm
//! <http://www.1024cores.net/home/lock-free-algorithms/queues/bounded-mpmc-queue>.
//!
//! Every cell of the ring carries an atomic sequence number that doubles as
//! a ticket lock between exactly one producer and exactly one consumer per
//! wrap. For the cell at ring index `i`:
//!
//! - `sequence == pos` (where `pos & MASK == i`) means the cell is empty and
//!   writable by the producer holding ticket `pos`;
//! - `sequence == pos + 1` means the cell is full and readable by the
//!   consumer holding ticket `pos`;
//! - after the read, the consumer stores `pos + N`, arming the cell for the
//!   producer one wrap ahead.
//!
//! The cursors themselves are updated with relaxed CAS; the sequence field
//! is the only synchronization variable that publishes payload data.

#[cfg(not(loom))]
use core::sync::atomic::{AtomicUsize, Ordering};
#[cfg(loom)]
use loom::sync::atomic::{AtomicUsize, Ordering};

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;

use crossbeam_utils::CachePadded;

use crate::error::{DequeueError, EnqueueError};

/// One ring cell: the sequence number and storage for one payload.
///
/// `sequence` is the sole rendezvous between the producer and the consumer
/// of this cell; the payload is only ever touched by the thread whose
/// cursor CAS claimed the matching ticket, so it needs no atomicity.
struct Slot<T> {
    sequence: AtomicUsize,
    payload: UnsafeCell<MaybeUninit<T>>,
}

impl<T> Slot<T> {
    fn new(sequence: usize) -> Self {
        Slot {
            sequence: AtomicUsize::new(sequence),
            payload: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }
}

/// Bounded lock-free MPMC queue.
///
/// Any number of producers and consumers may call [`enqueue`] and
/// [`dequeue`] concurrently through a shared reference; share the queue
/// across threads with `Arc`. Capacity is fixed at construction: `N` must
/// be a power of two and at least 2.
///
/// Both operations are non-blocking. "Full" and "empty" are reported
/// through the return value, never by waiting; callers bring their own
/// retry or backoff policy.
///
/// ```
/// use seqring::Queue;
///
/// let q = Queue::<u64, 4>::new();
/// q.enqueue(7).unwrap();
/// assert_eq!(q.dequeue().unwrap(), 7);
/// ```
///
/// [`enqueue`]: Queue::enqueue
/// [`dequeue`]: Queue::dequeue
pub struct Queue<T, const N: usize> {
    /// The cells. Each is padded to its own cache line: neighboring cells
    /// are written by unrelated producer/consumer pairs.
    ring: Box<[CachePadded<Slot<T>>; N]>,
    /// Next ticket a producer may claim. Monotonic; folded into a ring
    /// index with `& (N - 1)`.
    enqueue_pos: CachePadded<AtomicUsize>,
    /// Next ticket a consumer may claim.
    dequeue_pos: CachePadded<AtomicUsize>,
}

// SAFETY: all shared mutation goes through the atomics; a payload slot is
// only accessed by the single thread whose cursor CAS claimed its ticket,
// and that claim is handed over via release/acquire on `sequence`. `T: Send`
// because a value enqueued on one thread is dropped or returned on another.
unsafe impl<T: Send, const N: usize> Send for Queue<T, N> {}
unsafe impl<T: Send, const N: usize> Sync for Queue<T, N> {}

impl<T, const N: usize> Queue<T, N> {
    /// Create an empty queue.
    ///
    /// # Panics
    ///
    /// Panics if `N` is not a power of two or is less than 2.
    pub fn new() -> Self {
        assert!(N.is_power_of_two(), "capacity must be a power of two");
        assert!(N >= 2, "capacity must be at least 2");

        let mut cells = Vec::with_capacity(N);
        for i in 0..N {
            cells.push(CachePadded::new(Slot::new(i)));
        }
        let ring: Box<[CachePadded<Slot<T>>; N]> = cells
            .into_boxed_slice()
            .try_into()
            .unwrap_or_else(|_| unreachable!("ring length mismatch"));

        Queue {
            ring,
            enqueue_pos: CachePadded::new(AtomicUsize::new(0)),
            dequeue_pos: CachePadded::new(AtomicUsize::new(0)),
        }
    }

    /// Attempt to insert `value` at the tail.
    ///
    /// Returns `Err(EnqueueError(value))` if the queue was full at some
    /// moment during the attempt, handing the value back to the caller.
    pub fn enqueue(&self, value: T) -> Result<(), EnqueueError<T>> {
        let mut pos = self.enqueue_pos.load(Ordering::Relaxed);

        let (slot, ticket) = loop {
            let slot = &self.ring[pos & (N - 1)];
            // Synchronizes with the release store of the consumer that armed
            // this cell (or with construction).
            let seq = slot.sequence.load(Ordering::Acquire);
            // Wrap-tolerant signed distance; a naive unsigned compare would
            // misjudge cursors that have wrapped the word width.
            let diff = seq.wrapping_sub(pos) as isize;

            if diff == 0 {
                // Cell is writable for ticket `pos`. Claim it by advancing
                // the cursor. Weak CAS: a spurious failure only costs one
                // more trip around the loop.
                match self.enqueue_pos.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => break (slot, pos),
                    Err(current) => pos = current,
                }
            } else if diff < 0 {
                // The consumer for the previous wrap has not released this
                // cell yet: full relative to our ticket.
                return Err(EnqueueError(value));
            } else {
                // Another producer already advanced past `pos`.
                pos = self.enqueue_pos.load(Ordering::Relaxed);
            }
        };

        // SAFETY: the CAS above made ticket `ticket` exclusively ours, and
        // the slot was observed writable for it. No other thread touches
        // this payload until the release store below publishes it.
        unsafe { (*slot.payload.get()).write(value) };

        // Publish: the matching consumer's acquire load of `sequence` now
        // sees the payload write.
        slot.sequence.store(ticket.wrapping_add(1), Ordering::Release);

        Ok(())
    }

    /// Attempt to remove the element at the head.
    ///
    /// Returns `Err(DequeueError)` if the queue was empty at some moment
    /// during the attempt.
    pub fn dequeue(&self) -> Result<T, DequeueError> {
        let mut pos = self.dequeue_pos.load(Ordering::Relaxed);

        let (slot, ticket) = loop {
            let slot = &self.ring[pos & (N - 1)];
            let seq = slot.sequence.load(Ordering::Acquire);
            let diff = seq.wrapping_sub(pos.wrapping_add(1)) as isize;

            if diff == 0 {
                // Cell is readable for ticket `pos`.
                match self.dequeue_pos.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => break (slot, pos),
                    Err(current) => pos = current,
                }
            } else if diff < 0 {
                // No producer has published this cell: empty relative to
                // our ticket.
                return Err(DequeueError);
            } else {
                // Another consumer advanced past `pos`. Rarely taken.
                pos = self.dequeue_pos.load(Ordering::Relaxed);
            }
        };

        // SAFETY: ticket `ticket` is exclusively ours, and the producer's
        // release store of `ticket + 1` happened-before our acquire load,
        // so the payload is initialized and visible.
        let value = unsafe { (*slot.payload.get()).assume_init_read() };

        // Re-arm the cell for the producer one wrap ahead.
        slot.sequence
            .store(ticket.wrapping_add(N), Ordering::Release);

        Ok(value)
    }

    /// The fixed capacity `N`.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Best-effort emptiness check.
    ///
    /// Inspects the cell the next consumer would claim. Under concurrent
    /// activity the answer reflects some moment during the call; it is not
    /// a synchronization point and must not be used as one.
    pub fn is_empty(&self) -> bool {
        let mut pos = self.dequeue_pos.load(Ordering::Relaxed);

        loop {
            let slot = &self.ring[pos & (N - 1)];
            let seq = slot.sequence.load(Ordering::Acquire);
            let diff = seq.wrapping_sub(pos.wrapping_add(1)) as isize;

            if diff == 0 {
                return false;
            } else if diff < 0 {
                return true;
            }
            // The cursor moved under us; retry against the fresh head.
            pos = self.dequeue_pos.load(Ordering::Relaxed);
        }
    }

    /// Approximate number of queued elements.
    ///
    /// Computed from two independent relaxed cursor loads, so under
    /// concurrent activity the result may be stale by the time it returns.
    pub fn len(&self) -> usize {
        let head = self.dequeue_pos.load(Ordering::Relaxed);
        let tail = self.enqueue_pos.load(Ordering::Relaxed);
        tail.wrapping_sub(head)
    }
}

impl<T, const N: usize> Default for Queue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Drop for Queue<T, N> {
    fn drop(&mut self) {
        // `&mut self` guarantees quiescence, so every position in
        // [dequeue_pos, enqueue_pos) holds an initialized payload.
        let tail = self.enqueue_pos.load(Ordering::Relaxed);
        let mut pos = self.dequeue_pos.load(Ordering::Relaxed);

        while pos != tail {
            let slot = &self.ring[pos & (N - 1)];
            // SAFETY: position is in the initialized range and is dropped
            // exactly once.
            unsafe { (*slot.payload.get()).assume_init_drop() };
            pos = pos.wrapping_add(1);
        }
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use super::*;

    #[test]
    fn smoke() {
        let q = Queue::<i32, 8>::new();
        q.enqueue(42).unwrap();
        assert_eq!(q.dequeue().unwrap(), 42);
    }

    #[test]
    fn full_and_empty_boundaries() {
        let q = Queue::<i32, 4>::new();
        assert_eq!(q.dequeue(), Err(DequeueError));
        for i in 0..4 {
            assert!(q.enqueue(i).is_ok());
        }
        assert_eq!(q.enqueue(99), Err(EnqueueError(99)));
        for i in 0..4 {
            assert_eq!(q.dequeue(), Ok(i));
        }
        assert_eq!(q.dequeue(), Err(DequeueError));
    }

    #[test]
    fn capacity_is_constant() {
        let q = Queue::<i32, 1024>::new();
        assert_eq!(q.capacity(), 1024);
    }

    #[test]
    fn len_tracks_occupancy() {
        let q = Queue::<i32, 8>::new();
        assert!(q.is_empty());
        assert_eq!(q.len(), 0);

        q.enqueue(1).unwrap();
        q.enqueue(2).unwrap();
        assert!(!q.is_empty());
        assert_eq!(q.len(), 2);

        q.dequeue().unwrap();
        assert_eq!(q.len(), 1);
    }
}
