//! Vertical box container.
//!
//! The box exclusively owns its children in insertion order. Children point
//! back at the box through a weak link, which is what key presses bubble
//! along. A press only reaches the box if the child's backend reports it, so
//! while the box listens for `KeyPressed` every child counts a listener too.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::backend::{Capability, EventId, NativeHandle, WidgetBackend, widget_events};
use crate::error::ToolkitResult;
use crate::event::{EventGate, EventTable};
use crate::host::BackendHost;
use crate::toolkit::Toolkit;
use crate::widget::{Widget, WidgetCore, WidgetId, WidgetSink, impl_widget};

/// Native container stacking children vertically.
pub trait BoxBackend: WidgetBackend {
    /// Append `child` after the existing children.
    fn add_child(&self, child: NativeHandle);
    fn remove_child(&self, child: NativeHandle);

    fn set_spacing(&self, spacing: u32);
    fn spacing(&self) -> u32;
}

impl Capability for dyn BoxBackend {
    const NAME: &'static str = "BoxBackend";
}

pub struct VBox {
    shared: Arc<VBoxShared>,
}

struct VBoxShared {
    core: Arc<WidgetCore>,
    host: BackendHost<dyn BoxBackend>,
    children: Mutex<Vec<Box<dyn Widget>>>,
}

impl VBoxShared {
    fn backend(self: &Arc<Self>) -> ToolkitResult<Arc<dyn BoxBackend>> {
        self.host.backend_with(|backend| {
            backend.set_widget_sink(WidgetSink::new(&self.core));
            for child in self.children.lock().iter() {
                match child.native_handle() {
                    Ok(handle) => backend.add_child(handle),
                    Err(err) => tracing::warn!(
                        "VBox {} could not attach {} {}: {}",
                        self.core.id(),
                        child.kind(),
                        child.id(),
                        err
                    ),
                }
            }
        })
    }

    fn dispose(&self) {
        for child in self.children.lock().iter() {
            child.dispose();
        }
        self.host.dispose();
    }

    fn forwards_keys(&self) -> bool {
        self.host.listener_count(widget_events::KEY_PRESSED) > 0
    }

    fn adopt(&self, child: &dyn Widget) {
        child.core().set_parent(Some(&self.core));
        if self.forwards_keys() {
            child.gate().on_before_event_add(widget_events::KEY_PRESSED);
        }
    }

    fn release(&self, child: &dyn Widget) {
        if self.forwards_keys() {
            child.gate().on_after_event_remove(widget_events::KEY_PRESSED);
        }
        child.core().set_parent(None);
    }
}

impl EventGate for VBoxShared {
    fn on_before_event_add(&self, event: EventId) {
        let children = self.children.lock();
        if self.host.add_listener(event) && event == widget_events::KEY_PRESSED {
            for child in children.iter() {
                child.gate().on_before_event_add(event);
            }
        }
    }

    fn on_after_event_remove(&self, event: EventId) {
        let children = self.children.lock();
        if self.host.remove_listener(event) && event == widget_events::KEY_PRESSED {
            for child in children.iter() {
                child.gate().on_after_event_remove(event);
            }
        }
    }
}

impl VBox {
    pub const EVENTS: EventTable = EventTable {
        kind: "VBox",
        events: &[
            widget_events::GOT_FOCUS,
            widget_events::LOST_FOCUS,
            widget_events::KEY_PRESSED,
        ],
        always_enabled: &[],
    };

    pub fn new() -> Self {
        Self::build(None)
    }

    pub fn with_toolkit(toolkit: &Toolkit) -> Self {
        Self::build(Some(toolkit.clone()))
    }

    fn build(toolkit: Option<Toolkit>) -> Self {
        Self {
            shared: Arc::new(VBoxShared {
                core: WidgetCore::new(Self::EVENTS.kind),
                host: BackendHost::new(toolkit, &Self::EVENTS),
                children: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Take ownership of `child` and append it.
    ///
    /// If the box already has a backend the child's backend is created and
    /// attached now; on failure the child is dropped and the error returned.
    pub fn add(&self, child: impl Widget) -> ToolkitResult<WidgetId> {
        if let Some(backend) = self.shared.host.try_backend() {
            backend.add_child(child.native_handle()?);
        }

        let id = child.id();
        let mut children = self.shared.children.lock();
        self.shared.adopt(&child);
        children.push(Box::new(child));
        Ok(id)
    }

    /// Detach the child with `id` and hand it back to the caller.
    pub fn remove(&self, id: WidgetId) -> Option<Box<dyn Widget>> {
        let child = {
            let mut children = self.shared.children.lock();
            let index = children.iter().position(|child| child.id() == id)?;
            let child = children.remove(index);
            self.shared.release(&*child);
            child
        };

        if let (Some(backend), Some(child_backend)) =
            (self.shared.host.try_backend(), child.try_widget_backend())
        {
            backend.remove_child(child_backend.native_handle());
        }
        Some(child)
    }

    /// Remove and drop every child.
    pub fn clear(&self) {
        let children = {
            let mut children = self.shared.children.lock();
            for child in children.iter() {
                self.shared.release(&**child);
            }
            std::mem::take(&mut *children)
        };
        let backend = self.shared.host.try_backend();
        for child in children {
            if let (Some(backend), Some(child_backend)) = (&backend, child.try_widget_backend()) {
                backend.remove_child(child_backend.native_handle());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.shared.children.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.children.lock().is_empty()
    }

    /// Child ids in display order.
    pub fn children(&self) -> Vec<WidgetId> {
        self.shared
            .children
            .lock()
            .iter()
            .map(|child| child.id())
            .collect()
    }

    /// Borrow the child with `id` as a `W`.
    ///
    /// Returns `None` if there is no such child or it is not a `W`.
    pub fn with_child<W: Widget, R>(&self, id: WidgetId, f: impl FnOnce(&W) -> R) -> Option<R> {
        let children = self.shared.children.lock();
        let child = children.iter().find(|child| child.id() == id)?;
        child.as_any().downcast_ref::<W>().map(f)
    }

    pub fn set_spacing(&self, spacing: u32) {
        self.shared
            .host
            .set_or_buffer(move |backend| backend.set_spacing(spacing));
    }

    pub fn spacing(&self) -> ToolkitResult<u32> {
        Ok(self.shared.backend()?.spacing())
    }
}

impl Default for VBox {
    fn default() -> Self {
        Self::new()
    }
}

impl_widget!(VBox, gate = shared);
