use std::os::fd::BorrowedFd;

use crate::handoff_trace;
use crate::sync::notification::Notification;
use crate::sync::{AtomicBool, Ordering};
use crate::HandoffError;

/// Cross-thread wake-up that coalesces repeated signals.
///
/// The descriptor only receives a write on the transition from idle to
/// pending, so a burst of producer signals costs the consumer one wake-up.
pub struct WakeSignal {
    notification: Notification,
    pending: AtomicBool,
}

impl WakeSignal {
    pub fn new() -> Result<Self, HandoffError> {
        Ok(WakeSignal {
            notification: Notification::new()?,
            pending: AtomicBool::new(false),
        })
    }

    /// Schedules a wake-up. Returns `false` when one was already pending.
    ///
    /// Safe to call from any thread.
    pub fn signal(&self) -> Result<bool, HandoffError> {
        if self.pending.swap(true, Ordering::AcqRel) {
            handoff_trace!("wake-up already pending");
            return Ok(false);
        }
        if let Err(e) = self.notification.notify() {
            self.pending.store(false, Ordering::Release);
            return Err(e);
        }
        Ok(true)
    }

    /// Consumer side: rearms the signal. Call before draining the data the
    /// signal guards.
    ///
    /// The descriptor is reset before the flag is cleared; the other order
    /// could swallow the write of a signal raised in between. The clear is a
    /// read-modify-write so it is ordered against the producer's swap.
    pub fn acknowledge(&self) -> Result<(), HandoffError> {
        self.notification.reset()?;
        self.pending.swap(false, Ordering::AcqRel);
        Ok(())
    }

    /// Blocks until a wake-up is pending, then acknowledges it.
    pub fn wait(&self) -> Result<(), HandoffError> {
        self.notification.wait()?;
        self.pending.swap(false, Ordering::AcqRel);
        Ok(())
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    pub fn fd(&self) -> BorrowedFd<'_> {
        self.notification.fd()
    }
}
