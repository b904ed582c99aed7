//! Managed events and subscription gating.
//!
//! Each native-backed event lives in an [`EventSlot`]. Connecting and
//! disconnecting handlers goes through an [`EventGate`] (the widget's backend
//! host) so the native event is only enabled while someone is listening.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::backend::{EventId, Key, Modifiers};

/// Hooks run around handler list mutations.
pub trait EventGate: Send + Sync {
    /// Called before a handler for `event` is appended.
    fn on_before_event_add(&self, event: EventId);

    /// Called after a handler for `event` has been removed.
    fn on_after_event_remove(&self, event: EventId);
}

/// Identifies a connected handler so it can be disconnected later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl HandlerId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

type Handler<A> = Arc<dyn Fn(&mut A) + Send + Sync>;

/// Ordered handler list for one managed event.
pub struct EventSlot<A> {
    event: EventId,
    handlers: Mutex<Vec<(HandlerId, Handler<A>)>>,
}

impl<A> EventSlot<A> {
    pub fn new(event: EventId) -> Self {
        Self {
            event,
            handlers: Mutex::new(Vec::new()),
        }
    }

    pub fn event(&self) -> EventId {
        self.event
    }

    /// Append `handler`, letting `gate` enable the native event first.
    pub fn connect(
        &self,
        gate: &dyn EventGate,
        handler: impl Fn(&mut A) + Send + Sync + 'static,
    ) -> HandlerId {
        gate.on_before_event_add(self.event);

        let id = HandlerId::next();
        self.handlers.lock().push((id, Arc::new(handler)));
        id
    }

    /// Remove the handler with `id`. Returns `false` if it wasn't connected,
    /// in which case the gate is not consulted.
    pub fn disconnect(&self, gate: &dyn EventGate, id: HandlerId) -> bool {
        let removed = {
            let mut handlers = self.handlers.lock();
            match handlers.iter().position(|(handler_id, _)| *handler_id == id) {
                Some(index) => {
                    handlers.remove(index);
                    true
                }
                None => false,
            }
        };

        if removed {
            gate.on_after_event_remove(self.event);
        }
        removed
    }

    /// Invoke every handler in connection order.
    ///
    /// Handlers may connect or disconnect while the event is being raised;
    /// changes take effect from the next emission.
    pub fn emit(&self, args: &mut A) {
        let handlers: Vec<Handler<A>> = self
            .handlers
            .lock()
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();

        for handler in handlers {
            handler(args);
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.lock().is_empty()
    }
}

impl<A> fmt::Debug for EventSlot<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSlot")
            .field("event", &self.event)
            .field("handlers", &self.len())
            .finish()
    }
}

/// Static description of the events a widget kind can raise.
#[derive(Debug, Clone, Copy)]
pub struct EventTable {
    /// Widget kind, used in log messages.
    pub kind: &'static str,
    /// Every event the widget kind maps onto its backend.
    pub events: &'static [EventId],
    /// Events enabled as soon as the backend exists and never gated.
    pub always_enabled: &'static [EventId],
}

impl EventTable {
    pub fn contains(&self, event: EventId) -> bool {
        self.events.contains(&event)
    }

    pub fn is_always_enabled(&self, event: EventId) -> bool {
        self.always_enabled.contains(&event)
    }
}

/// Arguments of a key press. Setting `handled` stops bubbling to the parent
/// and suppresses the backend's default processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEventArgs {
    pub key: Key,
    pub modifiers: Modifiers,
    pub handled: bool,
}

impl KeyEventArgs {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self {
            key,
            modifiers,
            handled: false,
        }
    }
}

/// Arguments of a link activation. Setting `handled` prevents the backend
/// from opening `uri` itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigateToUrlEventArgs {
    pub uri: String,
    pub handled: bool,
}

impl NavigateToUrlEventArgs {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            handled: false,
        }
    }
}
