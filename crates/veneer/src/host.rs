//! Per-widget backend ownership.
//!
//! A [`BackendHost`] creates its backend on first access, never earlier.
//! Property writes made before that point are buffered and replayed once the
//! backend exists, and native events are enabled from the host's listener
//! counts so a backend only delivers what somebody is listening to.

use std::fmt;
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use ahash::AHashMap;
use parking_lot::Mutex;

use crate::backend::{Capability, EventId};
use crate::error::{ToolkitError, ToolkitResult};
use crate::event::{EventGate, EventTable};
use crate::toolkit::Toolkit;

type PendingOp<B> = Box<dyn FnOnce(&B) + Send>;

struct GateState<B: ?Sized> {
    listeners: AHashMap<EventId, usize>,
    pending: Vec<PendingOp<B>>,
    /// No backend will ever be created: disposed, or creation failed for good.
    closed: bool,
}

/// Lazily creates and owns one backend of capability `B`.
pub struct BackendHost<B: ?Sized + Capability> {
    toolkit: Option<Toolkit>,
    events: &'static EventTable,
    backend: OnceLock<Arc<B>>,
    /// Serializes creation; holds the error of a failed attempt.
    creation: Mutex<Option<ToolkitError>>,
    state: Mutex<GateState<B>>,
    disposed: AtomicBool,
}

impl<B: ?Sized + Capability> BackendHost<B> {
    /// Create a host. Without an explicit toolkit the current one is looked
    /// up when the backend is first needed.
    pub fn new(toolkit: Option<Toolkit>, events: &'static EventTable) -> Self {
        Self {
            toolkit,
            events,
            backend: OnceLock::new(),
            creation: Mutex::new(None),
            state: Mutex::new(GateState {
                listeners: AHashMap::new(),
                pending: Vec::new(),
                closed: false,
            }),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn events(&self) -> &'static EventTable {
        self.events
    }

    /// Whether the backend exists. Once `true`, stays `true`.
    pub fn is_created(&self) -> bool {
        self.backend.get().is_some()
    }

    /// The backend if it has already been created.
    pub fn try_backend(&self) -> Option<Arc<B>> {
        self.backend.get().cloned()
    }

    /// Get the backend, creating it on first access.
    ///
    /// `on_created` runs exactly once, right after the factory and before
    /// buffered writes are replayed and events are enabled; widgets use it to
    /// install their event sinks.
    ///
    /// A missing capability fails permanently. A missing toolkit does not, so
    /// a later access can succeed once a toolkit is current. After
    /// [`dispose`](Self::dispose) this always fails with
    /// [`ToolkitError::Disposed`].
    pub fn backend_with(&self, on_created: impl FnOnce(&Arc<B>)) -> ToolkitResult<Arc<B>> {
        if self.is_disposed() {
            return Err(ToolkitError::Disposed(self.events.kind));
        }
        if let Some(backend) = self.backend.get() {
            return Ok(backend.clone());
        }

        let mut failure = self.creation.lock();
        if self.is_disposed() {
            return Err(ToolkitError::Disposed(self.events.kind));
        }
        if let Some(backend) = self.backend.get() {
            return Ok(backend.clone());
        }
        if let Some(err) = failure.as_ref() {
            return Err(err.clone());
        }

        let toolkit = match &self.toolkit {
            Some(toolkit) => toolkit.clone(),
            None => Toolkit::current()?,
        };

        let backend = match toolkit.create_backend::<B>() {
            Ok(backend) => backend,
            Err(err) => {
                tracing::warn!("{} backend creation failed: {}", self.events.kind, err);
                *failure = Some(err.clone());
                self.close();
                return Err(err);
            }
        };

        on_created(&backend);

        // Replay buffered writes until none are left, then publish the backend
        // under the state lock so a concurrent write is either replayed here or
        // applied directly.
        let listening = loop {
            let mut state = self.state.lock();
            if state.pending.is_empty() {
                let _ = self.backend.set(backend.clone());
                break state
                    .listeners
                    .iter()
                    .filter(|(_, count)| **count > 0)
                    .map(|(&event, _)| event)
                    .collect::<Vec<_>>();
            }

            let pending = mem::take(&mut state.pending);
            drop(state);
            for op in pending {
                op(&backend);
            }
        };

        // Backends may notify synchronously while enabling.
        for &event in self.events.always_enabled {
            backend.enable_event(event);
        }
        for event in listening {
            tracing::trace!("Enabling {} on {} creation", event, self.events.kind);
            backend.enable_event(event);
        }

        Ok(backend)
    }

    /// Apply `op` to the backend now, or buffer it until creation.
    ///
    /// Never forces creation. Dropped once the host can no longer get a
    /// backend.
    pub fn set_or_buffer(&self, op: impl FnOnce(&B) + Send + 'static) {
        let mut state = self.state.lock();
        if state.closed {
            tracing::trace!("Dropping write to closed {} host", self.events.kind);
            return;
        }
        match self.backend.get() {
            Some(backend) => {
                let backend = backend.clone();
                drop(state);
                op(&backend);
            }
            None => state.pending.push(Box::new(op)),
        }
    }

    fn close(&self) {
        let pending = {
            let mut state = self.state.lock();
            state.closed = true;
            mem::take(&mut state.pending)
        };
        drop(pending);
    }

    /// Count a handler for `event`. Returns `true` on the first one.
    pub fn add_listener(&self, event: EventId) -> bool {
        if self.events.is_always_enabled(event) {
            return false;
        }
        if !self.events.contains(event) {
            tracing::warn!("{} has no event {}", self.events.kind, event);
        }

        let backend = {
            let mut state = self.state.lock();
            let count = state.listeners.entry(event).or_insert(0);
            *count += 1;
            if *count > 1 {
                return false;
            }
            self.backend.get().cloned()
        };
        if let Some(backend) = backend {
            tracing::debug!("Enabling {} on {}", event, self.events.kind);
            backend.enable_event(event);
        }
        true
    }

    /// Uncount a handler for `event`. Returns `true` when it was the last one.
    pub fn remove_listener(&self, event: EventId) -> bool {
        if self.events.is_always_enabled(event) {
            return false;
        }

        let backend = {
            let mut state = self.state.lock();
            let Some(count) = state.listeners.get_mut(&event) else {
                return false;
            };
            *count = count.saturating_sub(1);
            if *count > 0 {
                return false;
            }
            state.listeners.remove(&event);
            self.backend.get().cloned()
        };
        if let Some(backend) = backend {
            tracing::debug!("Disabling {} on {}", event, self.events.kind);
            backend.disable_event(event);
        }
        true
    }

    /// Number of handlers currently counted for `event`.
    pub fn listener_count(&self, event: EventId) -> usize {
        self.state.lock().listeners.get(&event).copied().unwrap_or(0)
    }

    /// Dispose the backend if one was created. Runs at most once, and no
    /// backend is created afterwards.
    pub fn dispose(&self) {
        let _creation = self.creation.lock();
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.close();
        if let Some(backend) = self.backend.get() {
            tracing::debug!("Disposing {} backend", self.events.kind);
            backend.dispose();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

impl<B: ?Sized + Capability> EventGate for BackendHost<B> {
    fn on_before_event_add(&self, event: EventId) {
        self.add_listener(event);
    }

    fn on_after_event_remove(&self, event: EventId) {
        self.remove_listener(event);
    }
}

impl<B: ?Sized + Capability> Drop for BackendHost<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<B: ?Sized + Capability> fmt::Debug for BackendHost<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendHost")
            .field("capability", &B::NAME)
            .field("kind", &self.events.kind)
            .field("created", &self.is_created())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Backend;
    use crate::config::{ToolkitConfig, ToolkitType};
    use crate::registry::BackendRegistry;
    use crate::toolkit::{ToolkitBackend, ToolkitBuilder};

    const PING: EventId = EventId::new("Fake.Ping");
    const ALWAYS: EventId = EventId::new("Fake.Always");

    static FAKE_EVENTS: EventTable = EventTable {
        kind: "Fake",
        events: &[PING, ALWAYS],
        always_enabled: &[ALWAYS],
    };

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Enable(EventId),
        Disable(EventId),
        Value(u32),
        Dispose,
    }

    trait FakeBackend: Backend {
        fn set_value(&self, value: u32);
    }

    impl Capability for dyn FakeBackend {
        const NAME: &'static str = "FakeBackend";
    }

    impl std::fmt::Debug for dyn FakeBackend {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("FakeBackend")
        }
    }

    type EnableHook = Arc<Mutex<Option<Arc<dyn Fn(EventId) + Send + Sync>>>>;

    struct Fake {
        calls: Arc<Mutex<Vec<Call>>>,
        on_enable: EnableHook,
    }

    impl Backend for Fake {
        fn enable_event(&self, event: EventId) {
            self.calls.lock().push(Call::Enable(event));
            let hook = self.on_enable.lock().clone();
            if let Some(hook) = hook {
                hook(event);
            }
        }

        fn disable_event(&self, event: EventId) {
            self.calls.lock().push(Call::Disable(event));
        }

        fn dispose(&self) {
            self.calls.lock().push(Call::Dispose);
        }
    }

    impl FakeBackend for Fake {
        fn set_value(&self, value: u32) {
            self.calls.lock().push(Call::Value(value));
        }
    }

    struct FakeFamily {
        calls: Arc<Mutex<Vec<Call>>>,
        on_enable: EnableHook,
    }

    impl ToolkitBackend for FakeFamily {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn toolkit_type(&self) -> ToolkitType {
            ToolkitType::Headless
        }

        fn register(&self, registry: &mut BackendRegistry) {
            let calls = self.calls.clone();
            let on_enable = self.on_enable.clone();
            registry.register::<dyn FakeBackend>(move || {
                Arc::new(Fake {
                    calls: calls.clone(),
                    on_enable: on_enable.clone(),
                })
            });
        }
    }

    fn fake_host() -> (BackendHost<dyn FakeBackend>, Arc<Mutex<Vec<Call>>>) {
        let (host, calls, _) = hooked_fake_host();
        (host, calls)
    }

    fn hooked_fake_host() -> (BackendHost<dyn FakeBackend>, Arc<Mutex<Vec<Call>>>, EnableHook) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let on_enable = EnableHook::default();
        let toolkit = ToolkitBuilder::from_config(ToolkitConfig::default())
            .with_family(FakeFamily {
                calls: calls.clone(),
                on_enable: on_enable.clone(),
            })
            .build();
        (BackendHost::new(Some(toolkit), &FAKE_EVENTS), calls, on_enable)
    }

    /// Host with no backend family, so creation fails for good.
    fn empty_host() -> BackendHost<dyn FakeBackend> {
        let toolkit = ToolkitBuilder::from_config(ToolkitConfig::default()).build();
        BackendHost::new(Some(toolkit), &FAKE_EVENTS)
    }

    #[test]
    fn test_buffered_writes_replay_before_events_enable() {
        let (host, calls) = fake_host();
        host.set_or_buffer(|backend| backend.set_value(1));
        host.set_or_buffer(|backend| backend.set_value(2));
        host.on_before_event_add(PING);
        assert!(calls.lock().is_empty());

        host.backend_with(|_| {}).unwrap();
        assert_eq!(
            *calls.lock(),
            vec![
                Call::Value(1),
                Call::Value(2),
                Call::Enable(ALWAYS),
                Call::Enable(PING)
            ]
        );
    }

    #[test]
    fn test_writes_after_creation_apply_immediately() {
        let (host, calls) = fake_host();
        host.backend_with(|_| {}).unwrap();
        calls.lock().clear();

        host.set_or_buffer(|backend| backend.set_value(9));
        assert_eq!(*calls.lock(), vec![Call::Value(9)]);
    }

    #[test]
    fn test_on_created_runs_once() {
        let (host, _calls) = fake_host();
        let mut runs = 0;
        host.backend_with(|_| runs += 1).unwrap();
        host.backend_with(|_| runs += 1).unwrap();
        assert_eq!(runs, 1);
    }

    #[test]
    fn test_always_enabled_events_bypass_counting() {
        let (host, calls) = fake_host();
        host.backend_with(|_| {}).unwrap();
        calls.lock().clear();

        host.on_before_event_add(ALWAYS);
        host.on_after_event_remove(ALWAYS);
        assert_eq!(host.listener_count(ALWAYS), 0);
        assert!(calls.lock().is_empty());
    }

    #[test]
    fn test_dispose_once_and_only_if_created() {
        let (host, calls) = fake_host();
        host.dispose();
        assert!(calls.lock().is_empty());

        let (host, calls) = fake_host();
        host.backend_with(|_| {}).unwrap();
        host.dispose();
        host.dispose();
        drop(host);
        let disposes = calls
            .lock()
            .iter()
            .filter(|call| **call == Call::Dispose)
            .count();
        assert_eq!(disposes, 1);
    }

    #[test]
    fn test_dispose_before_creation_prevents_creation() {
        let (host, calls) = fake_host();
        host.set_or_buffer(|backend| backend.set_value(1));
        host.dispose();

        assert_eq!(host.backend_with(|_| {}).unwrap_err(), ToolkitError::Disposed("Fake"));
        host.set_or_buffer(|backend| backend.set_value(2));
        drop(host);
        assert!(calls.lock().is_empty());
    }

    #[test]
    fn test_getter_after_dispose_fails() {
        let (host, calls) = fake_host();
        host.backend_with(|_| {}).unwrap();
        host.dispose();
        calls.lock().clear();

        assert!(matches!(host.backend_with(|_| {}), Err(ToolkitError::Disposed(_))));
        host.set_or_buffer(|backend| backend.set_value(3));
        assert!(calls.lock().is_empty());
    }

    #[test]
    fn test_permanent_failure_stops_buffering() {
        let host = empty_host();
        let captured = Arc::new(());

        let held = captured.clone();
        host.set_or_buffer(move |_| drop(held));
        assert_eq!(Arc::strong_count(&captured), 2);

        assert!(matches!(
            host.backend_with(|_| {}),
            Err(ToolkitError::BackendNotFound { .. })
        ));
        assert_eq!(Arc::strong_count(&captured), 1);

        let held = captured.clone();
        host.set_or_buffer(move |_| drop(held));
        assert_eq!(Arc::strong_count(&captured), 1);
    }

    #[test]
    fn test_backend_may_reenter_host_while_enabling() {
        let (host, calls, on_enable) = hooked_fake_host();
        let host = Arc::new(host);

        let weak = Arc::downgrade(&host);
        *on_enable.lock() = Some(Arc::new(move |event| {
            if event != PING {
                return;
            }
            if let Some(host) = weak.upgrade() {
                host.set_or_buffer(|backend| backend.set_value(7));
                assert_eq!(host.listener_count(PING), 1);
            }
        }));

        // Enabled on creation.
        host.on_before_event_add(PING);
        host.backend_with(|_| {}).unwrap();
        assert_eq!(calls.lock().last(), Some(&Call::Value(7)));

        // Enabled on the first connect after creation.
        host.on_after_event_remove(PING);
        calls.lock().clear();
        host.on_before_event_add(PING);
        assert_eq!(*calls.lock(), vec![Call::Enable(PING), Call::Value(7)]);
    }
}
