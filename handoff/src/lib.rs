//! # handoff - single-producer hand-off queue with a coalescing wake signal
//!
//! Moves owned values from one thread to another without the producing thread
//! ever waiting on the consumer. The consumer is expected to run inside an
//! event loop that polls the signal's file descriptor.
//!
//! Two pieces:
//!
//! - [`HandoffQueue`]: an unbounded FIFO. The producer pushes, the consumer
//!   takes everything queued so far in one step.
//! - [`WakeSignal`]: an `eventfd` guarded by a pending flag. Any number of
//!   signals raised before the consumer acknowledges result in a single
//!   readable edge on the descriptor.
//!
//! ## Producer side
//!
//! ```rust
//! use handoff::{HandoffQueue, WakeSignal};
//!
//! let queue = HandoffQueue::new();
//! let signal = WakeSignal::new()?;
//!
//! queue.push("first");
//! assert!(signal.signal()?); // schedules a wake-up
//! queue.push("second");
//! assert!(!signal.signal()?); // coalesced into the pending one
//! # Ok::<(), handoff::HandoffError>(())
//! ```
//!
//! ## Consumer side
//!
//! Acknowledge before draining. A push that races with the drain is then
//! either part of the drained batch or raises a fresh wake-up.
//!
//! ```rust
//! # use handoff::{HandoffQueue, WakeSignal};
//! # let queue = HandoffQueue::new();
//! # let signal = WakeSignal::new()?;
//! # queue.push(1);
//! # signal.signal()?;
//! signal.acknowledge()?;
//! for item in queue.drain_all() {
//!     // process item...
//! #   assert_eq!(item, 1);
//! }
//! # Ok::<(), handoff::HandoffError>(())
//! ```
//!
//! ## Polling
//!
//! [`WakeSignal::fd`] is readable while a wake-up is pending, so it can be
//! registered with epoll or poll alongside other descriptors.

pub use error::HandoffError;
pub use notification::WakeSignal;
pub use queue::HandoffQueue;
pub use sync::notification::Notification;

pub mod error;
#[cfg(all(test, feature = "loom"))]
pub(crate) mod loom;
pub(crate) mod notification;
pub(crate) mod queue;
pub(crate) mod sync;
mod trace_macro;
