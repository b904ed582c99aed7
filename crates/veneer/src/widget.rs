//! The widget façade contract shared by every widget kind.
//!
//! A widget never talks to its backend directly: property writes go through
//! the host's buffer, reads force creation, and native notifications come back
//! through sink adapters that only hold weak references to the widget.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::backend::{Key, Modifiers, NativeHandle, WidgetBackend, WidgetEventSink, widget_events};
use crate::error::ToolkitResult;
use crate::event::{EventGate, EventSlot, HandlerId, KeyEventArgs};

/// Process-unique widget identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(u64);

impl WidgetId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A buffered write against the common widget backend surface.
pub type WidgetOp = Box<dyn FnOnce(&dyn WidgetBackend) + Send>;

/// State every widget carries regardless of kind.
pub struct WidgetCore {
    id: WidgetId,
    kind: &'static str,
    parent: Mutex<Option<Weak<WidgetCore>>>,
    pub(crate) got_focus: EventSlot<()>,
    pub(crate) lost_focus: EventSlot<()>,
    pub(crate) key_pressed: EventSlot<KeyEventArgs>,
}

impl WidgetCore {
    pub(crate) fn new(kind: &'static str) -> Arc<Self> {
        Arc::new(Self {
            id: WidgetId::next(),
            kind,
            parent: Mutex::new(None),
            got_focus: EventSlot::new(widget_events::GOT_FOCUS),
            lost_focus: EventSlot::new(widget_events::LOST_FOCUS),
            key_pressed: EventSlot::new(widget_events::KEY_PRESSED),
        })
    }

    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn parent(&self) -> Option<Arc<WidgetCore>> {
        self.parent.lock().as_ref().and_then(Weak::upgrade)
    }

    pub(crate) fn set_parent(&self, parent: Option<&Arc<WidgetCore>>) {
        *self.parent.lock() = parent.map(Arc::downgrade);
    }

    /// Raise `KeyPressed` here, then on each ancestor until handled.
    pub(crate) fn raise_key_pressed(&self, args: &mut KeyEventArgs) {
        self.key_pressed.emit(args);

        let mut next = self.parent();
        while let Some(ancestor) = next {
            if args.handled {
                break;
            }
            ancestor.key_pressed.emit(args);
            next = ancestor.parent();
        }
    }
}

impl fmt::Debug for WidgetCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetCore")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("parent", &self.parent().map(|parent| parent.id))
            .finish()
    }
}

/// Sink adapter for the events every widget kind shares.
pub(crate) struct WidgetSink {
    core: Weak<WidgetCore>,
}

impl WidgetSink {
    pub(crate) fn new(core: &Arc<WidgetCore>) -> Arc<Self> {
        Arc::new(Self {
            core: Arc::downgrade(core),
        })
    }
}

impl WidgetEventSink for WidgetSink {
    fn on_got_focus(&self) {
        if let Some(core) = self.core.upgrade() {
            core.got_focus.emit(&mut ());
        }
    }

    fn on_lost_focus(&self) {
        if let Some(core) = self.core.upgrade() {
            core.lost_focus.emit(&mut ());
        }
    }

    fn on_key_pressed(&self, key: Key, modifiers: Modifiers) -> bool {
        let Some(core) = self.core.upgrade() else {
            return false;
        };
        let mut args = KeyEventArgs::new(key, modifiers);
        core.raise_key_pressed(&mut args);
        args.handled
    }
}

/// A platform-independent widget.
///
/// Setters never force backend creation; they are buffered until the backend
/// exists. Getters create the backend and so can fail with
/// [`ToolkitNotInitialized`](crate::ToolkitError::ToolkitNotInitialized) or
/// [`BackendNotFound`](crate::ToolkitError::BackendNotFound).
///
/// Widgets belong to the UI thread. Touching one from another thread must go
/// through a [`SyncBridge`](crate::SyncBridge) or
/// [`UiTaskScheduler`](crate::UiTaskScheduler).
pub trait Widget: Send + Sync + 'static {
    fn core(&self) -> &Arc<WidgetCore>;

    /// The gate the widget's events connect through.
    fn gate(&self) -> &dyn EventGate;

    /// The backend viewed through the common widget surface, creating it if
    /// needed.
    fn widget_backend(&self) -> ToolkitResult<Arc<dyn WidgetBackend>>;

    /// The backend if it has already been created.
    fn try_widget_backend(&self) -> Option<Arc<dyn WidgetBackend>>;

    /// Apply `op` now or once the backend exists.
    fn buffer_widget_op(&self, op: WidgetOp);

    /// Release the native backend. No-op when it was never created.
    fn dispose(&self);

    fn as_any(&self) -> &dyn Any;

    fn id(&self) -> WidgetId {
        self.core().id()
    }

    fn kind(&self) -> &'static str {
        self.core().kind()
    }

    fn parent_id(&self) -> Option<WidgetId> {
        self.core().parent().map(|parent| parent.id())
    }

    fn is_backend_created(&self) -> bool {
        self.try_widget_backend().is_some()
    }

    fn native_handle(&self) -> ToolkitResult<NativeHandle> {
        Ok(self.widget_backend()?.native_handle())
    }

    fn set_visible(&self, visible: bool) {
        self.buffer_widget_op(Box::new(move |backend| backend.set_visible(visible)));
    }

    fn is_visible(&self) -> ToolkitResult<bool> {
        Ok(self.widget_backend()?.is_visible())
    }

    fn set_sensitive(&self, sensitive: bool) {
        self.buffer_widget_op(Box::new(move |backend| backend.set_sensitive(sensitive)));
    }

    fn is_sensitive(&self) -> ToolkitResult<bool> {
        Ok(self.widget_backend()?.is_sensitive())
    }

    fn set_tooltip(&self, tooltip: Option<String>) {
        self.buffer_widget_op(Box::new(move |backend| {
            backend.set_tooltip(tooltip.as_deref())
        }));
    }

    fn tooltip(&self) -> ToolkitResult<Option<String>> {
        Ok(self.widget_backend()?.tooltip())
    }

    fn set_focus(&self) -> ToolkitResult<()> {
        self.widget_backend()?.set_focus();
        Ok(())
    }

    fn connect_got_focus(&self, handler: impl Fn() + Send + Sync + 'static) -> HandlerId
    where
        Self: Sized,
    {
        self.core()
            .got_focus
            .connect(self.gate(), move |_: &mut ()| handler())
    }

    fn disconnect_got_focus(&self, id: HandlerId) -> bool {
        self.core().got_focus.disconnect(self.gate(), id)
    }

    fn connect_lost_focus(&self, handler: impl Fn() + Send + Sync + 'static) -> HandlerId
    where
        Self: Sized,
    {
        self.core()
            .lost_focus
            .connect(self.gate(), move |_: &mut ()| handler())
    }

    fn disconnect_lost_focus(&self, id: HandlerId) -> bool {
        self.core().lost_focus.disconnect(self.gate(), id)
    }

    /// Handlers may set `handled` to stop the press bubbling to the parent.
    fn connect_key_pressed(
        &self,
        handler: impl Fn(&mut KeyEventArgs) + Send + Sync + 'static,
    ) -> HandlerId
    where
        Self: Sized,
    {
        self.core().key_pressed.connect(self.gate(), handler)
    }

    fn disconnect_key_pressed(&self, id: HandlerId) -> bool {
        self.core().key_pressed.disconnect(self.gate(), id)
    }
}

/// Implements the required [`Widget`] methods for a façade shaped as
/// `struct W { shared: Arc<WShared> }`, where `WShared` has `core` and `host`
/// fields and a `backend(self: &Arc<Self>)` accessor.
///
/// Events connect through the host; `gate = shared` routes them through
/// `WShared` itself instead.
macro_rules! impl_widget {
    (@impl $widget:ty, |$shared:ident| $gate:expr) => {
        impl $crate::widget::Widget for $widget {
            fn core(&self) -> &::std::sync::Arc<$crate::widget::WidgetCore> {
                &self.shared.core
            }

            fn gate(&self) -> &dyn $crate::event::EventGate {
                let $shared = &self.shared;
                $gate
            }

            fn widget_backend(
                &self,
            ) -> $crate::error::ToolkitResult<
                ::std::sync::Arc<dyn $crate::backend::WidgetBackend>,
            > {
                let backend: ::std::sync::Arc<dyn $crate::backend::WidgetBackend> =
                    self.shared.backend()?;
                Ok(backend)
            }

            fn try_widget_backend(
                &self,
            ) -> Option<::std::sync::Arc<dyn $crate::backend::WidgetBackend>> {
                let backend = self.shared.host.try_backend()?;
                let backend: ::std::sync::Arc<dyn $crate::backend::WidgetBackend> = backend;
                Some(backend)
            }

            fn buffer_widget_op(&self, op: $crate::widget::WidgetOp) {
                self.shared.host.set_or_buffer(move |backend| {
                    let backend: &dyn $crate::backend::WidgetBackend = backend;
                    op(backend)
                });
            }

            fn dispose(&self) {
                self.shared.dispose();
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }
    };
    ($widget:ty) => {
        $crate::widget::impl_widget!(@impl $widget, |shared| &shared.host);
    };
    ($widget:ty, gate = shared) => {
        $crate::widget::impl_widget!(@impl $widget, |shared| &**shared);
    };
}

pub(crate) use impl_widget;
