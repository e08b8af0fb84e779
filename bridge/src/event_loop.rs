use handoff::WakeSignal;
use nix::errno::Errno;
use nix::sys::epoll::{Epoll, EpollCreateFlags, EpollEvent, EpollFlags, EpollTimeout};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

use crate::config::LoopConfig;
use crate::Result;

/// Identifies one armed wake source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token(u64);

struct Source {
    signal: Arc<WakeSignal>,
    drain: Rc<dyn Fn()>,
}

struct LoopInner {
    epoll: Epoll,
    sources: RefCell<HashMap<u64, Source>>,
    next_token: Cell<u64>,
    max_events: usize,
}

/// Single-threaded loop that runs drain routines when their wake signal
/// fires.
///
/// Cloning is cheap and yields another handle to the same loop. The handle is
/// neither `Send` nor `Sync`; only the [`WakeSignal`] returned by
/// [`EventLoop::arm`] may cross threads.
#[derive(Clone)]
pub struct EventLoop {
    inner: Rc<LoopInner>,
}

impl EventLoop {
    pub fn new() -> Result<Self> {
        Self::with_config(&LoopConfig::default())
    }

    pub fn with_config(config: &LoopConfig) -> Result<Self> {
        let epoll = Epoll::new(EpollCreateFlags::EPOLL_CLOEXEC)?;
        debug!(max_events = config.max_events, "event loop created");

        Ok(EventLoop {
            inner: Rc::new(LoopInner {
                epoll,
                sources: RefCell::new(HashMap::new()),
                next_token: Cell::new(0),
                max_events: config.max_events.max(1),
            }),
        })
    }

    /// Registers `drain` to run on this loop each time the returned signal
    /// fires. Signals raised before the loop gets to the source coalesce into
    /// one run.
    pub fn arm<F>(&self, drain: F) -> Result<(Token, Arc<WakeSignal>)>
    where
        F: Fn() + 'static,
    {
        let signal = Arc::new(WakeSignal::new()?);
        let token = self.inner.next_token.get();
        self.inner.next_token.set(token + 1);

        self.inner
            .epoll
            .add(signal.fd(), EpollEvent::new(EpollFlags::EPOLLIN, token))?;
        self.inner.sources.borrow_mut().insert(
            token,
            Source {
                signal: signal.clone(),
                drain: Rc::new(drain),
            },
        );

        debug!(token, "wake source armed");
        Ok((Token(token), signal))
    }

    /// Removes a source. Unknown tokens are ignored.
    pub fn disarm(&self, token: Token) -> Result<()> {
        let source = self.inner.sources.borrow_mut().remove(&token.0);
        if let Some(source) = source {
            self.inner.epoll.delete(source.signal.fd())?;
            debug!(token = token.0, "wake source disarmed");
        }
        Ok(())
    }

    pub fn armed(&self) -> usize {
        self.inner.sources.borrow().len()
    }

    /// Waits up to `timeout` (forever with `None`) for signalled sources and
    /// runs each one's drain routine once. Returns the number of drains run.
    ///
    /// Timeouts are rounded up to whole milliseconds and clamped to
    /// `u16::MAX` of them.
    pub fn run_once(&self, timeout: Option<Duration>) -> Result<usize> {
        let mut events = vec![EpollEvent::empty(); self.inner.max_events];
        let timeout = match timeout {
            None => EpollTimeout::NONE,
            Some(timeout) => {
                let millis = timeout.as_nanos().div_ceil(1_000_000);
                EpollTimeout::from(u16::try_from(millis).unwrap_or(u16::MAX))
            }
        };

        let nfds = match self.inner.epoll.wait(&mut events, timeout) {
            Ok(nfds) => nfds,
            Err(Errno::EINTR) => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut drained = 0;
        for event in events.iter().take(nfds) {
            let token = event.data();
            let source = self
                .inner
                .sources
                .borrow()
                .get(&token)
                .map(|source| (source.signal.clone(), source.drain.clone()));
            let Some((signal, drain)) = source else {
                trace!(token, "readiness for disarmed source");
                continue;
            };

            signal.acknowledge()?;
            drain();
            drained += 1;
        }
        Ok(drained)
    }
}
