use code_event::CodeEvent;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::Result;

/// Receives code events on the VM's own thread.
pub trait CodeEventHandler: Send + Sync + 'static {
    /// `event` is only valid for the duration of the call.
    fn handle(&self, event: &dyn CodeEvent);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationId(u64);

/// The VM side of the bridge: delivers code events to registered handlers.
pub trait Instrumentation: Send + Sync {
    fn register(&self, handler: Arc<dyn CodeEventHandler>) -> Result<RegistrationId>;

    /// Must not return while a `handle` call for `id` is still running.
    /// Unknown ids are ignored.
    fn unregister(&self, id: RegistrationId);
}

/// In-process [`Instrumentation`] for VMs that emit events by calling
/// [`CodeEventDispatcher::dispatch`] from their compiler thread.
pub struct CodeEventDispatcher {
    handlers: RwLock<Vec<(RegistrationId, Arc<dyn CodeEventHandler>)>>,
    next_id: AtomicU64,
}

impl Default for CodeEventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeEventDispatcher {
    pub fn new() -> Self {
        CodeEventDispatcher {
            handlers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Hands `event` to every registered handler, in registration order.
    ///
    /// Holds the read lock for the whole fan-out; that is what makes
    /// `unregister` wait for in-flight deliveries.
    pub fn dispatch(&self, event: &dyn CodeEvent) {
        let handlers = self.handlers.read();
        trace!(
            handlers = handlers.len(),
            address = event.code_start_address(),
            "dispatching code event"
        );
        for (_, handler) in handlers.iter() {
            handler.handle(event);
        }
    }

    pub fn registrations(&self) -> usize {
        self.handlers.read().len()
    }
}

impl Instrumentation for CodeEventDispatcher {
    fn register(&self, handler: Arc<dyn CodeEventHandler>) -> Result<RegistrationId> {
        let id = RegistrationId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.write().push((id, handler));
        debug!(id = id.0, "code event handler registered");
        Ok(id)
    }

    fn unregister(&self, id: RegistrationId) {
        let mut handlers = self.handlers.write();
        let before = handlers.len();
        handlers.retain(|(registered, _)| *registered != id);
        if handlers.len() != before {
            debug!(id = id.0, "code event handler unregistered");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use code_event::{CodeEventType, EventRecord, RawCodeEvent};
    use parking_lot::Mutex;
    use rstest::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<EventRecord>>,
    }

    impl CodeEventHandler for Recorder {
        fn handle(&self, event: &dyn CodeEvent) {
            self.seen.lock().push(EventRecord::capture(event));
        }
    }

    #[fixture]
    fn dispatcher() -> CodeEventDispatcher {
        CodeEventDispatcher::new()
    }

    #[rstest]
    fn test_dispatch_without_handlers(dispatcher: CodeEventDispatcher) {
        dispatcher.dispatch(&RawCodeEvent::new(CodeEventType::Stub, 0x10, 4));
        assert_eq!(dispatcher.registrations(), 0);
    }

    #[rstest]
    fn test_dispatch_reaches_registered_handlers(dispatcher: CodeEventDispatcher) {
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        dispatcher.register(first.clone()).unwrap();
        dispatcher.register(second.clone()).unwrap();

        dispatcher.dispatch(&RawCodeEvent::new(CodeEventType::Function, 0x1000, 32));

        assert_eq!(first.seen.lock().len(), 1);
        assert_eq!(second.seen.lock()[0].address(), 0x1000);
    }

    #[rstest]
    fn test_unregister_stops_delivery(dispatcher: CodeEventDispatcher) {
        let recorder = Arc::new(Recorder::default());
        let id = dispatcher.register(recorder.clone()).unwrap();

        dispatcher.unregister(id);
        dispatcher.unregister(id);
        dispatcher.dispatch(&RawCodeEvent::new(CodeEventType::Function, 0x1000, 32));

        assert_eq!(dispatcher.registrations(), 0);
        assert!(recorder.seen.lock().is_empty());
    }

    struct Blocking {
        entered: Mutex<Option<mpsc::Sender<()>>>,
        release: Mutex<Option<mpsc::Receiver<()>>>,
        finished: AtomicBool,
    }

    impl CodeEventHandler for Blocking {
        fn handle(&self, _event: &dyn CodeEvent) {
            if let Some(entered) = self.entered.lock().take() {
                entered.send(()).unwrap();
            }
            if let Some(release) = self.release.lock().take() {
                release.recv().unwrap();
            }
            self.finished.store(true, Ordering::SeqCst);
        }
    }

    #[rstest]
    fn test_unregister_waits_for_in_flight_handle() {
        let dispatcher = Arc::new(CodeEventDispatcher::new());
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let handler = Arc::new(Blocking {
            entered: Mutex::new(Some(entered_tx)),
            release: Mutex::new(Some(release_rx)),
            finished: AtomicBool::new(false),
        });
        let id = dispatcher.register(handler.clone()).unwrap();

        let vm_thread = {
            let dispatcher = dispatcher.clone();
            thread::spawn(move || {
                dispatcher.dispatch(&RawCodeEvent::new(CodeEventType::Function, 0x1, 1));
            })
        };
        entered_rx.recv().unwrap();

        let releaser = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            release_tx.send(()).unwrap();
        });

        dispatcher.unregister(id);
        assert!(handler.finished.load(Ordering::SeqCst));

        vm_thread.join().expect("vm thread panicked");
        releaser.join().expect("releaser thread panicked");
    }
}
