//! Operational failure values for the queue.
//!
//! Neither of these is an error in the exceptional sense: "full" and
//! "empty" are normal outcomes of a non-blocking attempt, and callers
//! choose their own retry, backoff, or rejection policy.

use thiserror::Error;

/// Returned by [`Queue::enqueue`](crate::Queue::enqueue) when the queue was
/// observed full during the attempt.
///
/// Carries the rejected value back so the caller can retry or drop it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("queue is full")]
pub struct EnqueueError<T>(pub T);

/// Returned by [`Queue::dequeue`](crate::Queue::dequeue) when the queue was
/// observed empty during the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("queue is empty")]
pub struct DequeueError;
