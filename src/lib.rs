//! # `pipeheap`
//!
//! A concurrent max-priority queue whose operations are pipelined over the
//! levels of a binary heap.
//!
//! The heap is an array-backed complete binary tree with one mutex per tree
//! level. Both insert and extract-max walk strictly top-down, holding at most
//! two adjacent level locks at a time (hand-over-hand lock coupling). Several
//! operations can therefore be in flight at once, each at a different depth,
//! like stages of a pipeline.
//!
//! ## How It Works
//!
//! - Every slot records the free capacity of its subtree. An insert uses it to
//!   steer toward the emptier child, so the tree fills without holes and no
//!   bottom-up sift is ever needed.
//! - An insert carries its element down from the root. At each occupied slot
//!   the larger of the two elements stays and the smaller moves on.
//! - An extraction takes the root and pulls the greater child up into the
//!   vacancy, level by level, until the vacancy has no occupied children.
//! - When the root subtree has no free slot left, the inserting thread grows
//!   the array and the lock array together while holding every level lock.
//!
//! ## Thread Safety
//!
//! `PipelinedQueue<E, C>` is `Send + Sync` when `E: Send` and `C: Send + Sync`.
//! All methods take `&self`; share the queue with an `Arc`.
//!
//! ```rust
//! use std::sync::Arc;
//! use std::thread;
//!
//! use pipeheap::PipelinedQueue;
//!
//! let queue: Arc<PipelinedQueue<u64>> = Arc::new(PipelinedQueue::new());
//!
//! let producers: Vec<_> = (0..4_u64)
//!     .map(|t| {
//!         let queue = Arc::clone(&queue);
//!         thread::spawn(move || {
//!             for i in 0..100 {
//!                 queue.insert(t * 100 + i).expect("unbounded queue");
//!             }
//!         })
//!     })
//!     .collect();
//!
//! for handle in producers {
//!     handle.join().expect("producer panicked");
//! }
//!
//! assert_eq!(queue.len(), 400);
//! assert_eq!(queue.try_extract_max(), Some(399));
//! ```
//!
//! ## Ordering
//!
//! Elements are ordered by a [`Comparator`]. The default, [`NaturalOrder`],
//! uses `Ord`; [`Reversed`] turns the queue into a min-queue, and any
//! `Fn(&E, &E) -> Ordering` closure works as well.
//!
//! ## Blocking
//!
//! [`PipelinedQueue::take`] and [`PipelinedQueue::take_timeout`] wait for an
//! element to arrive. Inserts never wait: the queue grows instead, up to
//! [`QueueConfig::max_capacity`].

#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

// Declared first so the logging macros are in scope for every module below.
mod tracing_helpers;

pub mod blocking;
pub mod compare;
pub mod config;
pub mod error;
pub mod heap;
pub mod level;
pub mod node;
pub mod ordering;
pub mod queue;

pub use compare::{Comparator, NaturalOrder, Reversed};
pub use config::QueueConfig;
pub use error::{InsertError, QueueError};
pub use queue::{InvariantViolation, PipelinedQueue};
