#[cfg(not(feature = "loom"))]
pub use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "loom")]
pub use loom::sync::atomic::{AtomicBool, Ordering};

#[cfg(not(feature = "loom"))]
pub use parking_lot::Mutex;

#[cfg(feature = "loom")]
pub struct Mutex<T> {
    inner: loom::sync::Mutex<T>,
}

#[cfg(feature = "loom")]
impl<T> Mutex<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: loom::sync::Mutex::new(value),
        }
    }

    pub fn lock(&self) -> loom::sync::MutexGuard<'_, T> {
        self.inner.lock().unwrap()
    }
}

#[cfg(not(feature = "loom"))]
pub mod notification {
    use crate::error::HandoffError;
    use nix::errno::Errno;
    use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
    use nix::sys::eventfd::{EfdFlags, EventFd};
    use std::os::fd::{AsFd, BorrowedFd};

    /// Non-blocking `eventfd` used as the readable edge of a wake signal.
    pub struct Notification {
        eventfd: EventFd,
    }

    impl Notification {
        pub fn new() -> Result<Self, HandoffError> {
            let eventfd =
                EventFd::from_value_and_flags(0, EfdFlags::EFD_CLOEXEC | EfdFlags::EFD_NONBLOCK)
                    .map_err(|e| HandoffError::EventfdCreation(e.to_string()))?;

            Ok(Notification { eventfd })
        }

        pub fn notify(&self) -> Result<(), HandoffError> {
            self.eventfd
                .write(1)
                .map_err(|e| HandoffError::EventfdWrite(e.to_string()))?;
            Ok(())
        }

        /// Clears the counter. An already empty counter is not an error.
        pub fn reset(&self) -> Result<(), HandoffError> {
            match self.eventfd.read() {
                Ok(_) | Err(Errno::EAGAIN) => Ok(()),
                Err(e) => Err(HandoffError::EventfdRead(e.to_string())),
            }
        }

        /// Blocks until the counter is non-zero, then clears it.
        pub fn wait(&self) -> Result<(), HandoffError> {
            loop {
                let mut fds = [PollFd::new(self.eventfd.as_fd(), PollFlags::POLLIN)];
                match poll(&mut fds, PollTimeout::NONE) {
                    Ok(_) => return self.reset(),
                    Err(Errno::EINTR) => continue,
                    Err(e) => return Err(HandoffError::Poll(e)),
                }
            }
        }

        pub fn fd(&self) -> BorrowedFd<'_> {
            self.eventfd.as_fd()
        }
    }
}

#[cfg(feature = "loom")]
pub mod notification {
    use crate::error::HandoffError;
    use loom::sync::{Condvar, Mutex};
    use std::os::fd::BorrowedFd;
    use std::sync::Arc;

    #[derive(Clone)]
    pub struct Notification {
        inner: Arc<NotificationInner>,
    }

    struct NotificationInner {
        condvar: Condvar,
        mutex: Mutex<bool>,
    }

    impl Notification {
        pub fn new() -> Result<Self, HandoffError> {
            Ok(Notification {
                inner: Arc::new(NotificationInner {
                    condvar: Condvar::new(),
                    mutex: Mutex::new(false),
                }),
            })
        }

        pub fn notify(&self) -> Result<(), HandoffError> {
            let mut notified = self.inner.mutex.lock().unwrap();
            *notified = true;
            self.inner.condvar.notify_one();
            Ok(())
        }

        pub fn reset(&self) -> Result<(), HandoffError> {
            *self.inner.mutex.lock().unwrap() = false;
            Ok(())
        }

        pub fn wait(&self) -> Result<(), HandoffError> {
            let mut notified = self.inner.mutex.lock().unwrap();
            while !*notified {
                notified = self.inner.condvar.wait(notified).unwrap();
            }
            *notified = false;
            Ok(())
        }

        pub fn fd(&self) -> BorrowedFd<'_> {
            panic!("fd() not supported in loom mode")
        }
    }
}
