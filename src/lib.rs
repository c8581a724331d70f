//! seqring - bounded lock-free MPMC queue on sequenced ring cells
//!
//! A fixed-capacity multi-producer multi-consumer queue implementing
//! Dmitry Vyukov's sequenced-array-cells algorithm. Producers and
//! consumers ticket themselves into ring cells through two shared
//! cursors; each cell's atomic sequence number arbitrates the handoff,
//! so no operation ever takes a lock or blocks.
//!
//! - [`Queue::enqueue`] / [`Queue::dequeue`] are non-blocking and report
//!   "full" / "empty" through their return value
//! - capacity is fixed at construction and must be a power of two >= 2
//! - lock-free: the system makes progress as long as any thread runs
//!
//! Share a queue between threads with `Arc`:
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//!
//! use seqring::Queue;
//!
//! let q = Arc::new(Queue::<u32, 16>::new());
//!
//! let producer = {
//!     let q = q.clone();
//!     thread::spawn(move || {
//!         for i in 0..8 {
//!             while q.enqueue(i).is_err() {
//!                 std::hint::spin_loop();
//!             }
//!         }
//!     })
//! };
//!
//! let mut got = Vec::new();
//! while got.len() < 8 {
//!     if let Ok(v) = q.dequeue() {
//!         got.push(v);
//!     }
//! }
//! producer.join().unwrap();
//! assert_eq!(got, (0..8u32).collect::<Vec<_>>());
//! ```

#![warn(missing_docs)]

mod error;
mod queue;

pub use error::{DequeueError, EnqueueError};
pub use queue::Queue;
