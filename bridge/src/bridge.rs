use code_event::{CodeEvent, EventRecord};
use handoff::{HandoffQueue, WakeSignal};
use parking_lot::Mutex;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::config::BridgeConfig;
use crate::dispatcher::{CodeEventHandler, Instrumentation, RegistrationId};
use crate::event_loop::{EventLoop, Token};
use crate::{BridgeError, Result};

type Handler = Box<dyn FnMut(&EventRecord)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Unregistered,
    Enabled,
    Disabled,
}

/// Producer half, shared with the VM's instrumentation thread.
struct Inbox {
    queue: HandoffQueue<EventRecord>,
    signal: Mutex<Option<Arc<WakeSignal>>>,
    config: BridgeConfig,
}

impl Inbox {
    fn is_detached(&self) -> bool {
        self.signal.lock().is_none()
    }

    fn wake(&self) {
        if let Some(signal) = self.signal.lock().as_ref() {
            if let Err(e) = signal.signal() {
                warn!(error = ?e, "failed to signal event loop");
            }
        }
    }
}

impl CodeEventHandler for Inbox {
    fn handle(&self, event: &dyn CodeEvent) {
        if !self.config.accepts(event.code_type()) {
            return;
        }
        let record = EventRecord::capture(event);

        // Held across push and signal so that detaching the signal orders
        // after any delivery already in progress.
        let signal = self.signal.lock();
        match signal.as_ref() {
            Some(signal) => {
                self.queue.push(record);
                if let Err(e) = signal.signal() {
                    warn!(error = ?e, "failed to signal event loop");
                }
            }
            None => trace!(
                address = record.address(),
                "bridge detached, dropping code event"
            ),
        }
    }
}

/// Records taken off the queue but not yet handed to the handler. Anything
/// left when this is dropped goes back to the head of the queue.
struct Undelivered<'a> {
    records: VecDeque<EventRecord>,
    inbox: &'a Inbox,
}

impl Drop for Undelivered<'_> {
    fn drop(&mut self) {
        if self.records.is_empty() {
            return;
        }
        if std::thread::panicking() {
            warn!(
                requeued = self.records.len(),
                "handler panicked mid-drain, requeueing remaining records"
            );
        } else {
            debug!(
                requeued = self.records.len(),
                "drain stopped early, requeueing remaining records"
            );
        }
        self.inbox
            .queue
            .requeue_front(std::mem::take(&mut self.records));
        self.inbox.wake();
    }
}

fn drain(inbox: &Inbox, handler: &RefCell<Handler>) {
    let mut pending = Undelivered {
        records: inbox.queue.drain_all(),
        inbox,
    };
    if pending.records.is_empty() {
        trace!("wake-up with nothing queued");
        return;
    }
    trace!(records = pending.records.len(), "draining code events");

    let mut handler = handler.borrow_mut();
    // The handler may disable its own bridge; stop as soon as it does.
    while !inbox.is_detached() {
        let Some(record) = pending.records.pop_front() else {
            break;
        };
        (*handler)(&record);
    }
}

struct Attached {
    token: Token,
    registration: RegistrationId,
}

/// Delivers code events from a VM's instrumentation thread to a handler
/// running on an [`EventLoop`].
///
/// Events are queued by the VM thread and handed to the handler in emission
/// order from [`EventLoop::run_once`]. Dropping an enabled bridge disables it.
pub struct EventBridge {
    inbox: Arc<Inbox>,
    handler: Rc<RefCell<Handler>>,
    instrumentation: Arc<dyn Instrumentation>,
    event_loop: EventLoop,
    state: BridgeState,
    attached: Option<Attached>,
}

#[derive(Default)]
pub struct BridgeBuilder {
    handler: Option<Handler>,
    config: BridgeConfig,
}

impl BridgeBuilder {
    pub fn handler<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&EventRecord) + 'static,
    {
        self.handler = Some(Box::new(handler));
        self
    }

    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Fails with [`BridgeError::InvalidArgument`] when no handler was set.
    /// Nothing is registered or armed until [`EventBridge::enable`].
    pub fn build(
        self,
        instrumentation: Arc<dyn Instrumentation>,
        event_loop: &EventLoop,
    ) -> Result<EventBridge> {
        let handler = self
            .handler
            .ok_or(BridgeError::InvalidArgument("must provide a handler function"))?;

        Ok(EventBridge {
            inbox: Arc::new(Inbox {
                queue: HandoffQueue::new(),
                signal: Mutex::new(None),
                config: self.config,
            }),
            handler: Rc::new(RefCell::new(handler)),
            instrumentation,
            event_loop: event_loop.clone(),
            state: BridgeState::Unregistered,
            attached: None,
        })
    }
}

impl EventBridge {
    pub fn builder() -> BridgeBuilder {
        BridgeBuilder::default()
    }

    pub fn new<F>(
        handler: F,
        instrumentation: Arc<dyn Instrumentation>,
        event_loop: &EventLoop,
    ) -> Result<Self>
    where
        F: FnMut(&EventRecord) + 'static,
    {
        Self::builder()
            .handler(handler)
            .build(instrumentation, event_loop)
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state == BridgeState::Enabled
    }

    /// Records queued but not yet delivered.
    pub fn pending(&self) -> usize {
        self.inbox.queue.len()
    }

    /// Arms a wake source on the loop and registers with the VM. No-op when
    /// already enabled.
    pub fn enable(&mut self) -> Result<()> {
        if self.state == BridgeState::Enabled {
            return Ok(());
        }

        let (token, signal) = {
            let inbox = self.inbox.clone();
            let handler = self.handler.clone();
            self.event_loop.arm(move || drain(&inbox, &handler))?
        };
        *self.inbox.signal.lock() = Some(signal);

        let registration = match self
            .instrumentation
            .register(self.inbox.clone() as Arc<dyn CodeEventHandler>)
        {
            Ok(registration) => registration,
            Err(e) => {
                self.inbox.signal.lock().take();
                if let Err(disarm_err) = self.event_loop.disarm(token) {
                    warn!(error = ?disarm_err, "failed to disarm after rejected registration");
                }
                return Err(e);
            }
        };

        if !self.inbox.queue.is_empty() {
            self.inbox.wake();
        }

        self.attached = Some(Attached {
            token,
            registration,
        });
        self.state = BridgeState::Enabled;
        debug!(pending = self.pending(), "code event bridge enabled");
        Ok(())
    }

    /// Unregisters from the VM, then retires the wake source. No-op unless
    /// enabled. Records still queued are kept for a later `enable`.
    pub fn disable(&mut self) -> Result<()> {
        let Some(attached) = self.attached.take() else {
            return Ok(());
        };
        self.state = BridgeState::Disabled;

        self.instrumentation.unregister(attached.registration);
        self.inbox.signal.lock().take();
        self.event_loop.disarm(attached.token)?;

        debug!(pending = self.pending(), "code event bridge disabled");
        Ok(())
    }
}

impl Drop for EventBridge {
    fn drop(&mut self) {
        if let Err(e) = self.disable() {
            warn!(error = ?e, "failed to disable code event bridge on drop");
        }
    }
}
