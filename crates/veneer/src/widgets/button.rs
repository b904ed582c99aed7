//! Push button.

use std::sync::{Arc, Weak};

use crate::backend::{Capability, EventId, WidgetBackend, widget_events};
use crate::error::ToolkitResult;
use crate::event::{EventSlot, EventTable, HandlerId};
use crate::host::BackendHost;
use crate::toolkit::Toolkit;
use crate::widget::{WidgetCore, WidgetSink, impl_widget};

pub const CLICKED: EventId = EventId::new("Button.Clicked");

/// Native push button.
pub trait ButtonBackend: WidgetBackend {
    fn set_button_sink(&self, sink: Arc<dyn ButtonEventSink>);

    fn set_label(&self, label: &str);
    fn label(&self) -> String;
}

impl Capability for dyn ButtonBackend {
    const NAME: &'static str = "ButtonBackend";
}

pub trait ButtonEventSink: Send + Sync {
    fn on_clicked(&self);
}

/// A clickable button with a text label.
///
/// # Example
///
/// ```ignore
/// let button = Button::new();
/// button.set_label("Save");
/// button.connect_clicked(|| save_document());
/// ```
pub struct Button {
    shared: Arc<ButtonShared>,
}

struct ButtonShared {
    core: Arc<WidgetCore>,
    host: BackendHost<dyn ButtonBackend>,
    clicked: EventSlot<()>,
}

impl ButtonShared {
    fn backend(self: &Arc<Self>) -> ToolkitResult<Arc<dyn ButtonBackend>> {
        self.host.backend_with(|backend| {
            backend.set_widget_sink(WidgetSink::new(&self.core));
            backend.set_button_sink(Arc::new(ButtonSink {
                shared: Arc::downgrade(self),
            }));
        })
    }

    fn on_clicked(&self) {
        self.clicked.emit(&mut ());
    }

    fn dispose(&self) {
        self.host.dispose();
    }
}

struct ButtonSink {
    shared: Weak<ButtonShared>,
}

impl ButtonEventSink for ButtonSink {
    fn on_clicked(&self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.on_clicked();
        }
    }
}

impl Button {
    pub const EVENTS: EventTable = EventTable {
        kind: "Button",
        events: &[
            widget_events::GOT_FOCUS,
            widget_events::LOST_FOCUS,
            widget_events::KEY_PRESSED,
            CLICKED,
        ],
        always_enabled: &[],
    };

    /// Create a button bound to the current toolkit.
    pub fn new() -> Self {
        Self::build(None)
    }

    pub fn with_toolkit(toolkit: &Toolkit) -> Self {
        Self::build(Some(toolkit.clone()))
    }

    fn build(toolkit: Option<Toolkit>) -> Self {
        Self {
            shared: Arc::new(ButtonShared {
                core: WidgetCore::new(Self::EVENTS.kind),
                host: BackendHost::new(toolkit, &Self::EVENTS),
                clicked: EventSlot::new(CLICKED),
            }),
        }
    }

    pub fn set_label(&self, label: impl Into<String>) {
        let label = label.into();
        self.shared
            .host
            .set_or_buffer(move |backend| backend.set_label(&label));
    }

    pub fn label(&self) -> ToolkitResult<String> {
        Ok(self.shared.backend()?.label())
    }

    pub fn connect_clicked(&self, handler: impl Fn() + Send + Sync + 'static) -> HandlerId {
        self.shared
            .clicked
            .connect(&self.shared.host, move |_: &mut ()| handler())
    }

    pub fn disconnect_clicked(&self, id: HandlerId) -> bool {
        self.shared.clicked.disconnect(&self.shared.host, id)
    }
}

impl Default for Button {
    fn default() -> Self {
        Self::new()
    }
}

impl_widget!(Button);
