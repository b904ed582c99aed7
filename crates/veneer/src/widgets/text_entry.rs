//! Single-line text entry.

use std::sync::{Arc, Weak};

use crate::backend::{Capability, EventId, WidgetBackend, widget_events};
use crate::error::ToolkitResult;
use crate::event::{EventSlot, EventTable, HandlerId};
use crate::host::BackendHost;
use crate::toolkit::Toolkit;
use crate::widget::{WidgetCore, WidgetSink, impl_widget};

/// The text changed, by the user or by `set_text`.
pub const CHANGED: EventId = EventId::new("TextEntry.Changed");
/// The user confirmed the entry (usually Enter).
pub const ACTIVATED: EventId = EventId::new("TextEntry.Activated");

/// Native single-line text field.
///
/// `set_text` with the current text must not report `CHANGED`.
pub trait TextEntryBackend: WidgetBackend {
    fn set_text_entry_sink(&self, sink: Arc<dyn TextEntryEventSink>);

    fn set_text(&self, text: &str);
    fn text(&self) -> String;

    fn set_placeholder(&self, placeholder: &str);
    fn placeholder(&self) -> String;

    fn set_read_only(&self, read_only: bool);
    fn is_read_only(&self) -> bool;
}

impl Capability for dyn TextEntryBackend {
    const NAME: &'static str = "TextEntryBackend";
}

pub trait TextEntryEventSink: Send + Sync {
    fn on_changed(&self);
    fn on_activated(&self);
}

pub struct TextEntry {
    shared: Arc<TextEntryShared>,
}

struct TextEntryShared {
    core: Arc<WidgetCore>,
    host: BackendHost<dyn TextEntryBackend>,
    changed: EventSlot<()>,
    activated: EventSlot<()>,
}

impl TextEntryShared {
    fn backend(self: &Arc<Self>) -> ToolkitResult<Arc<dyn TextEntryBackend>> {
        self.host.backend_with(|backend| {
            backend.set_widget_sink(WidgetSink::new(&self.core));
            backend.set_text_entry_sink(Arc::new(TextEntrySink {
                shared: Arc::downgrade(self),
            }));
        })
    }

    fn on_changed(&self) {
        self.changed.emit(&mut ());
    }

    fn on_activated(&self) {
        self.activated.emit(&mut ());
    }

    fn dispose(&self) {
        self.host.dispose();
    }
}

struct TextEntrySink {
    shared: Weak<TextEntryShared>,
}

impl TextEntryEventSink for TextEntrySink {
    fn on_changed(&self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.on_changed();
        }
    }

    fn on_activated(&self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.on_activated();
        }
    }
}

impl TextEntry {
    pub const EVENTS: EventTable = EventTable {
        kind: "TextEntry",
        events: &[
            widget_events::GOT_FOCUS,
            widget_events::LOST_FOCUS,
            widget_events::KEY_PRESSED,
            CHANGED,
            ACTIVATED,
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
            shared: Arc::new(TextEntryShared {
                core: WidgetCore::new(Self::EVENTS.kind),
                host: BackendHost::new(toolkit, &Self::EVENTS),
                changed: EventSlot::new(CHANGED),
                activated: EventSlot::new(ACTIVATED),
            }),
        }
    }

    pub fn set_text(&self, text: impl Into<String>) {
        let text = text.into();
        self.shared
            .host
            .set_or_buffer(move |backend| backend.set_text(&text));
    }

    pub fn text(&self) -> ToolkitResult<String> {
        Ok(self.shared.backend()?.text())
    }

    pub fn set_placeholder(&self, placeholder: impl Into<String>) {
        let placeholder = placeholder.into();
        self.shared
            .host
            .set_or_buffer(move |backend| backend.set_placeholder(&placeholder));
    }

    pub fn placeholder(&self) -> ToolkitResult<String> {
        Ok(self.shared.backend()?.placeholder())
    }

    pub fn set_read_only(&self, read_only: bool) {
        self.shared
            .host
            .set_or_buffer(move |backend| backend.set_read_only(read_only));
    }

    pub fn is_read_only(&self) -> ToolkitResult<bool> {
        Ok(self.shared.backend()?.is_read_only())
    }

    pub fn connect_changed(&self, handler: impl Fn() + Send + Sync + 'static) -> HandlerId {
        self.shared
            .changed
            .connect(&self.shared.host, move |_: &mut ()| handler())
    }

    pub fn disconnect_changed(&self, id: HandlerId) -> bool {
        self.shared.changed.disconnect(&self.shared.host, id)
    }

    pub fn connect_activated(&self, handler: impl Fn() + Send + Sync + 'static) -> HandlerId {
        self.shared
            .activated
            .connect(&self.shared.host, move |_: &mut ()| handler())
    }

    pub fn disconnect_activated(&self, id: HandlerId) -> bool {
        self.shared.activated.disconnect(&self.shared.host, id)
    }
}

impl Default for TextEntry {
    fn default() -> Self {
        Self::new()
    }
}

impl_widget!(TextEntry);
