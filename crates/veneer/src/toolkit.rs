//! Toolkit engine - selects the active backend family and owns the UI thread
//! identity.
//!
//! A [`Toolkit`] is built once at application start from one or more
//! [`ToolkitBackend`] families. Only the family matching the configured
//! [`ToolkitType`] registers its factories, so every widget created against the
//! toolkit resolves to the same native backend family.
//!
//! The handle is cheap to clone; clones share the same engine. Widgets can be
//! given a toolkit explicitly, or fall back to the process-wide current one set
//! with [`Toolkit::set_current`].

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};
use std::time::Duration;

use parking_lot::RwLock;

use crate::backend::Capability;
use crate::config::{ToolkitConfig, ToolkitType};
use crate::dispatch::{UiDispatcher, Work, panic_message};
use crate::error::{ToolkitError, ToolkitResult};
use crate::registry::BackendRegistry;
use crate::scheduler::UiTaskScheduler;
use crate::sync::SyncBridge;
use crate::timer::{self, TimerHandle};

/// Receives panics that escape fire-and-forget work.
pub type PanicHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Process-wide default toolkit.
static CURRENT: RwLock<Option<Toolkit>> = RwLock::new(None);

/// A native backend family (GTK, Cocoa, a test mock, ...).
///
/// Families register one factory per capability they implement.
///
/// # Example
///
/// ```ignore
/// struct GtkToolkit;
///
/// impl ToolkitBackend for GtkToolkit {
///     fn name(&self) -> &'static str {
///         "gtk"
///     }
///
///     fn toolkit_type(&self) -> ToolkitType {
///         ToolkitType::Gtk
///     }
///
///     fn register(&self, registry: &mut BackendRegistry) {
///         registry.register::<dyn ButtonBackend>(|| Arc::new(GtkButton::new()));
///     }
/// }
/// ```
pub trait ToolkitBackend: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    fn toolkit_type(&self) -> ToolkitType;

    /// Register this family's backend factories.
    fn register(&self, registry: &mut BackendRegistry);
}

struct ToolkitInner {
    name: String,
    toolkit_type: ToolkitType,
    config: ToolkitConfig,
    registry: BackendRegistry,
    dispatcher: Option<Arc<dyn UiDispatcher>>,
    ui_thread: OnceLock<ThreadId>,
    panic_hook: PanicHook,
}

/// Handle to a built toolkit engine.
#[derive(Clone)]
pub struct Toolkit {
    inner: Arc<ToolkitInner>,
}

impl Toolkit {
    /// Create a new toolkit builder.
    pub fn builder() -> ToolkitBuilder {
        ToolkitBuilder::new()
    }

    /// Name of the active backend family.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn toolkit_type(&self) -> &ToolkitType {
        &self.inner.toolkit_type
    }

    pub fn config(&self) -> &ToolkitConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.inner.registry
    }

    /// Instantiate a backend for capability `B` from the active family.
    pub fn create_backend<B: ?Sized + Capability>(&self) -> ToolkitResult<Arc<B>> {
        match self.inner.registry.create::<B>() {
            Some(backend) => {
                tracing::debug!("Created {} backend under toolkit {}", B::NAME, self.name());
                Ok(backend)
            }
            None => Err(ToolkitError::BackendNotFound {
                capability: B::NAME,
                toolkit: self.inner.name.clone(),
            }),
        }
    }

    /// Record the calling thread as the UI thread.
    ///
    /// The identity is written once; later calls from a different thread are
    /// ignored. Returns `true` if the caller is now the UI thread.
    pub fn attach_ui_thread(&self) -> bool {
        let current = thread::current().id();
        let ui_thread = *self.inner.ui_thread.get_or_init(|| current);
        if ui_thread != current {
            tracing::warn!(
                "Toolkit {} already has UI thread {:?}; ignoring attach from {:?}",
                self.name(),
                ui_thread,
                current
            );
        }
        ui_thread == current
    }

    pub fn ui_thread(&self) -> Option<ThreadId> {
        self.inner.ui_thread.get().copied()
    }

    pub fn has_ui_thread(&self) -> bool {
        self.inner.ui_thread.get().is_some()
    }

    /// Whether the calling thread is the UI thread.
    pub fn is_ui_thread(&self) -> bool {
        self.ui_thread() == Some(thread::current().id())
    }

    /// Run `work` on the UI thread without waiting for it.
    ///
    /// A panic inside `work` is reported to the unhandled-panic hook; there is
    /// no caller left to return it to.
    pub fn invoke(&self, work: impl FnOnce() + Send + 'static) -> ToolkitResult<()> {
        let hook = self.inner.panic_hook.clone();
        self.dispatch(Box::new(move || {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(work)) {
                hook(&panic_message(&*payload));
            }
        }))
    }

    /// Hand raw work to the dispatcher, or run it inline when there is none.
    pub(crate) fn dispatch(&self, work: Work) -> ToolkitResult<()> {
        match &self.inner.dispatcher {
            Some(dispatcher) => dispatcher.invoke(work),
            None => {
                tracing::trace!("Toolkit {} has no dispatcher; running inline", self.name());
                work();
                Ok(())
            }
        }
    }

    /// Forward a panic message to the unhandled-panic hook.
    pub fn report_panic(&self, message: &str) {
        (self.inner.panic_hook)(message);
    }

    /// A synchronization bridge targeting this toolkit's UI thread.
    pub fn sync_bridge(&self) -> SyncBridge {
        SyncBridge::new(self)
    }

    /// A task scheduler whose continuations run on this toolkit's UI thread.
    pub fn task_scheduler(&self) -> UiTaskScheduler {
        UiTaskScheduler::new(self)
    }

    /// Call `callback` on the UI thread every `interval` for as long as it
    /// returns `true`.
    pub fn timeout_invoke(
        &self,
        interval: Duration,
        callback: impl FnMut() -> bool + Send + 'static,
    ) -> TimerHandle {
        timer::start(self.sync_bridge(), interval, callback)
    }

    /// Make this toolkit the process-wide default, returning the previous one.
    pub fn set_current(&self) -> Option<Toolkit> {
        let previous = CURRENT.write().replace(self.clone());
        if let Some(previous) = &previous {
            tracing::warn!(
                "Replacing current toolkit {} with {}",
                previous.name(),
                self.name()
            );
        } else {
            tracing::info!("Toolkit {} is now current", self.name());
        }
        previous
    }

    /// The process-wide default toolkit.
    pub fn current() -> ToolkitResult<Toolkit> {
        CURRENT
            .read()
            .clone()
            .ok_or(ToolkitError::ToolkitNotInitialized)
    }

    /// Tear down the process-wide default, usually at application exit.
    pub fn clear_current() -> Option<Toolkit> {
        let previous = CURRENT.write().take();
        if let Some(previous) = &previous {
            tracing::info!("Toolkit {} torn down", previous.name());
        }
        previous
    }

    pub fn ptr_eq(&self, other: &Toolkit) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Toolkit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Toolkit")
            .field("name", &self.inner.name)
            .field("toolkit_type", &self.inner.toolkit_type)
            .field("ui_thread", &self.inner.ui_thread.get())
            .field("registry", &self.inner.registry)
            .finish()
    }
}

/// A deferred registration applied after the family has registered.
type Override = Box<dyn FnOnce(&mut BackendRegistry)>;

/// Builder for constructing a [`Toolkit`].
///
/// # Example
///
/// ```ignore
/// let toolkit = Toolkit::builder()
///     .with_config(ToolkitConfig::from_env()?)
///     .with_family(GtkToolkit)
///     .with_family(CocoaToolkit)
///     .with_dispatcher(dispatcher)
///     .build();
/// ```
pub struct ToolkitBuilder {
    config: ToolkitConfig,
    families: Vec<Box<dyn ToolkitBackend>>,
    overrides: Vec<Override>,
    dispatcher: Option<Arc<dyn UiDispatcher>>,
    ui_thread: Option<ThreadId>,
    panic_hook: Option<PanicHook>,
}

impl ToolkitBuilder {
    pub fn new() -> Self {
        Self::from_config(ToolkitConfig::default())
    }

    pub fn from_config(config: ToolkitConfig) -> Self {
        Self {
            config,
            families: Vec::new(),
            overrides: Vec::new(),
            dispatcher: None,
            ui_thread: None,
            panic_hook: None,
        }
    }

    pub fn with_config(mut self, config: ToolkitConfig) -> Self {
        self.config = config;
        self
    }

    /// Offer a backend family. The one matching the configured toolkit type
    /// wins; if none matches, the first family offered is used.
    pub fn with_family(mut self, family: impl ToolkitBackend) -> Self {
        self.families.push(Box::new(family));
        self
    }

    /// Register or replace a single capability factory on top of the family.
    pub fn with_backend<B: ?Sized + Capability>(
        mut self,
        factory: impl Fn() -> Arc<B> + Send + Sync + 'static,
    ) -> Self {
        self.overrides.push(Box::new(move |registry: &mut BackendRegistry| {
            registry.register::<B>(factory);
        }));
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn UiDispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Declare the UI thread up front instead of calling
    /// [`Toolkit::attach_ui_thread`] from it.
    pub fn with_ui_thread(mut self, thread: ThreadId) -> Self {
        self.ui_thread = Some(thread);
        self
    }

    /// Replace the default hook (a `tracing` error) for panics escaping
    /// fire-and-forget work.
    pub fn with_unhandled_panic_hook(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.panic_hook = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> Toolkit {
        let mut registry = BackendRegistry::new();

        let wanted = &self.config.toolkit;
        let family = self
            .families
            .iter()
            .find(|family| family.toolkit_type() == *wanted)
            .or_else(|| {
                let fallback = self.families.first();
                if let Some(fallback) = fallback {
                    tracing::warn!(
                        "No backend family for toolkit {}; falling back to {}",
                        wanted,
                        fallback.name()
                    );
                }
                fallback
            });

        let (name, toolkit_type) = match family {
            Some(family) => {
                family.register(&mut registry);
                (family.name().to_string(), family.toolkit_type())
            }
            None => (wanted.to_string(), wanted.clone()),
        };

        for apply in self.overrides {
            apply(&mut registry);
        }

        let ui_thread = OnceLock::new();
        if let Some(thread) = self.ui_thread {
            let _ = ui_thread.set(thread);
        }

        let panic_hook = self.panic_hook.unwrap_or_else(|| {
            Arc::new(|message: &str| {
                tracing::error!("Unhandled panic in UI work item: {}", message);
            })
        });

        tracing::info!(
            "Toolkit {} built with {} capabilities: {:?}",
            name,
            registry.len(),
            registry.capability_names().collect::<Vec<_>>()
        );

        Toolkit {
            inner: Arc::new(ToolkitInner {
                name,
                toolkit_type,
                config: self.config,
                registry,
                dispatcher: self.dispatcher,
                ui_thread,
                panic_hook,
            }),
        }
    }
}

impl Default for ToolkitBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Backend, EventId};
    use parking_lot::Mutex;

    trait FakeBackend: Backend {
        fn family(&self) -> &'static str;
    }

    impl Capability for dyn FakeBackend {
        const NAME: &'static str = "FakeBackend";
    }

    struct Fake(&'static str);

    impl Backend for Fake {
        fn enable_event(&self, _event: EventId) {}
        fn disable_event(&self, _event: EventId) {}
    }

    impl FakeBackend for Fake {
        fn family(&self) -> &'static str {
            self.0
        }
    }

    struct Family(&'static str, ToolkitType);

    impl ToolkitBackend for Family {
        fn name(&self) -> &'static str {
            self.0
        }

        fn toolkit_type(&self) -> ToolkitType {
            self.1.clone()
        }

        fn register(&self, registry: &mut BackendRegistry) {
            let name = self.0;
            registry.register::<dyn FakeBackend>(move || Arc::new(Fake(name)));
        }
    }

    #[test]
    fn test_selects_configured_family() {
        let toolkit = ToolkitBuilder::from_config(
            ToolkitConfig::default().with_toolkit(ToolkitType::Cocoa),
        )
        .with_family(Family("gtk", ToolkitType::Gtk))
        .with_family(Family("cocoa", ToolkitType::Cocoa))
        .build();

        assert_eq!(toolkit.name(), "cocoa");
        let backend = toolkit.create_backend::<dyn FakeBackend>().unwrap();
        assert_eq!(backend.family(), "cocoa");
    }

    #[test]
    fn test_falls_back_to_first_family() {
        let toolkit = ToolkitBuilder::from_config(
            ToolkitConfig::default().with_toolkit(ToolkitType::Wpf),
        )
        .with_family(Family("gtk", ToolkitType::Gtk))
        .build();

        assert_eq!(toolkit.name(), "gtk");
        assert_eq!(toolkit.toolkit_type(), &ToolkitType::Gtk);
    }

    #[test]
    fn test_missing_capability_names_capability_and_toolkit() {
        let toolkit = Toolkit::builder().build();
        let err = toolkit.create_backend::<dyn FakeBackend>().err().unwrap();
        assert_eq!(
            err,
            ToolkitError::BackendNotFound {
                capability: "FakeBackend",
                toolkit: "headless".to_string(),
            }
        );
    }

    #[test]
    fn test_override_replaces_family_factory() {
        let toolkit = Toolkit::builder()
            .with_family(Family("headless", ToolkitType::Headless))
            .with_backend::<dyn FakeBackend>(|| Arc::new(Fake("override")))
            .build();

        let backend = toolkit.create_backend::<dyn FakeBackend>().unwrap();
        assert_eq!(backend.family(), "override");
    }

    #[test]
    fn test_attach_ui_thread_is_write_once() {
        let toolkit = Toolkit::builder().build();
        assert!(!toolkit.has_ui_thread());
        assert!(toolkit.attach_ui_thread());
        assert!(toolkit.is_ui_thread());

        let other = toolkit.clone();
        let attached = thread::spawn(move || other.attach_ui_thread())
            .join()
            .unwrap();
        assert!(!attached);
        assert!(toolkit.is_ui_thread());
    }

    #[test]
    fn test_invoke_without_dispatcher_runs_inline() {
        let toolkit = Toolkit::builder().build();
        let ran_on = Arc::new(Mutex::new(None));
        let slot = ran_on.clone();

        toolkit
            .invoke(move || *slot.lock() = Some(thread::current().id()))
            .unwrap();

        assert_eq!(*ran_on.lock(), Some(thread::current().id()));
    }

    #[test]
    fn test_invoke_reports_panics_to_hook() {
        let reported = Arc::new(Mutex::new(Vec::new()));
        let sink = reported.clone();
        let toolkit = Toolkit::builder()
            .with_unhandled_panic_hook(move |message| sink.lock().push(message.to_string()))
            .build();

        toolkit.invoke(|| panic!("work failed")).unwrap();

        assert_eq!(*reported.lock(), vec!["work failed".to_string()]);
    }
}
