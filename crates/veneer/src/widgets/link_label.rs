//! Clickable hyperlink label.
//!
//! Navigation is always delivered by the backend, even with no handler
//! connected: if nobody marks the event handled the backend opens the URI
//! itself.

use std::sync::{Arc, Weak};

use crate::backend::{Capability, EventId, WidgetBackend, widget_events};
use crate::error::ToolkitResult;
use crate::event::{EventSlot, EventTable, HandlerId, NavigateToUrlEventArgs};
use crate::host::BackendHost;
use crate::toolkit::Toolkit;
use crate::widget::{WidgetCore, WidgetSink, impl_widget};

pub const NAVIGATE_TO_URL: EventId = EventId::new("LinkLabel.NavigateToUrl");

pub trait LinkLabelBackend: WidgetBackend {
    fn set_link_label_sink(&self, sink: Arc<dyn LinkLabelEventSink>);

    fn set_text(&self, text: &str);
    fn text(&self) -> String;

    fn set_uri(&self, uri: &str);
    fn uri(&self) -> String;
}

impl Capability for dyn LinkLabelBackend {
    const NAME: &'static str = "LinkLabelBackend";
}

pub trait LinkLabelEventSink: Send + Sync {
    /// Returns `true` when the navigation was handled and the backend must
    /// not open `uri`.
    fn on_navigate_to_url(&self, uri: &str) -> bool;
}

pub struct LinkLabel {
    shared: Arc<LinkLabelShared>,
}

struct LinkLabelShared {
    core: Arc<WidgetCore>,
    host: BackendHost<dyn LinkLabelBackend>,
    navigate_to_url: EventSlot<NavigateToUrlEventArgs>,
}

impl LinkLabelShared {
    fn backend(self: &Arc<Self>) -> ToolkitResult<Arc<dyn LinkLabelBackend>> {
        self.host.backend_with(|backend| {
            backend.set_widget_sink(WidgetSink::new(&self.core));
            backend.set_link_label_sink(Arc::new(LinkLabelSink {
                shared: Arc::downgrade(self),
            }));
        })
    }

    fn on_navigate_to_url(&self, args: &mut NavigateToUrlEventArgs) {
        self.navigate_to_url.emit(args);
    }

    fn dispose(&self) {
        self.host.dispose();
    }
}

struct LinkLabelSink {
    shared: Weak<LinkLabelShared>,
}

impl LinkLabelEventSink for LinkLabelSink {
    fn on_navigate_to_url(&self, uri: &str) -> bool {
        let Some(shared) = self.shared.upgrade() else {
            return false;
        };
        let mut args = NavigateToUrlEventArgs::new(uri);
        shared.on_navigate_to_url(&mut args);
        args.handled
    }
}

impl LinkLabel {
    pub const EVENTS: EventTable = EventTable {
        kind: "LinkLabel",
        events: &[
            widget_events::GOT_FOCUS,
            widget_events::LOST_FOCUS,
            widget_events::KEY_PRESSED,
            NAVIGATE_TO_URL,
        ],
        always_enabled: &[NAVIGATE_TO_URL],
    };

    pub fn new() -> Self {
        Self::build(None)
    }

    pub fn with_toolkit(toolkit: &Toolkit) -> Self {
        Self::build(Some(toolkit.clone()))
    }

    fn build(toolkit: Option<Toolkit>) -> Self {
        Self {
            shared: Arc::new(LinkLabelShared {
                core: WidgetCore::new(Self::EVENTS.kind),
                host: BackendHost::new(toolkit, &Self::EVENTS),
                navigate_to_url: EventSlot::new(NAVIGATE_TO_URL),
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

    pub fn set_uri(&self, uri: impl Into<String>) {
        let uri = uri.into();
        self.shared
            .host
            .set_or_buffer(move |backend| backend.set_uri(&uri));
    }

    pub fn uri(&self) -> ToolkitResult<String> {
        Ok(self.shared.backend()?.uri())
    }

    /// Set `handled` to keep the backend from opening the URI.
    pub fn connect_navigate_to_url(
        &self,
        handler: impl Fn(&mut NavigateToUrlEventArgs) + Send + Sync + 'static,
    ) -> HandlerId {
        self.shared
            .navigate_to_url
            .connect(&self.shared.host, handler)
    }

    pub fn disconnect_navigate_to_url(&self, id: HandlerId) -> bool {
        self.shared
            .navigate_to_url
            .disconnect(&self.shared.host, id)
    }
}

impl Default for LinkLabel {
    fn default() -> Self {
        Self::new()
    }
}

impl_widget!(LinkLabel);
