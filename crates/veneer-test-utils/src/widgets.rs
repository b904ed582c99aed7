//! In-memory mock backends.
//!
//! Each mock records the calls it receives and exposes a few methods that
//! play the part of the user (`click`, `type_text`, `navigate`, ...). Those
//! deliver to the installed sink only while the matching event is enabled.

use std::fmt::Display;
use std::sync::Arc;

use parking_lot::Mutex;
use veneer::widgets::button::{self, ButtonBackend, ButtonEventSink};
use veneer::widgets::container::BoxBackend;
use veneer::widgets::link_label::{self, LinkLabelBackend, LinkLabelEventSink};
use veneer::widgets::slider::{self, SliderBackend, SliderEventSink};
use veneer::widgets::text_entry::{self, TextEntryBackend, TextEntryEventSink};
use veneer::{
    EventId, Key, Modifiers, NativeHandle, ToolkitError, ToolkitResult, WidgetEventSink,
    widget_events,
};

use crate::calls::{BackendCall, MockState};

/// State shared by every mock widget backend.
pub struct MockWidget {
    kind: &'static str,
    handle: NativeHandle,
    state: Arc<MockState>,
    enabled: Mutex<Vec<EventId>>,
    visible: Mutex<bool>,
    sensitive: Mutex<bool>,
    tooltip: Mutex<Option<String>>,
    sink: Mutex<Option<Arc<dyn WidgetEventSink>>>,
}

impl MockWidget {
    fn new(kind: &'static str, state: &Arc<MockState>) -> Self {
        let handle = state.next_handle();
        state.record(BackendCall::Created { kind, handle });
        Self {
            kind,
            handle,
            state: state.clone(),
            enabled: Mutex::new(Vec::new()),
            visible: Mutex::new(true),
            sensitive: Mutex::new(true),
            tooltip: Mutex::new(None),
            sink: Mutex::new(None),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn handle(&self) -> NativeHandle {
        self.handle
    }

    pub fn is_enabled(&self, event: EventId) -> bool {
        self.enabled.lock().contains(&event)
    }

    /// Events currently enabled, in the order they were enabled.
    pub fn enabled_events(&self) -> Vec<EventId> {
        self.enabled.lock().clone()
    }

    /// Simulate the widget gaining focus. Returns whether it was delivered.
    pub fn focus(&self) -> bool {
        match self.sink_for(widget_events::GOT_FOCUS) {
            Some(sink) => {
                sink.on_got_focus();
                true
            }
            None => false,
        }
    }

    pub fn blur(&self) -> bool {
        match self.sink_for(widget_events::LOST_FOCUS) {
            Some(sink) => {
                sink.on_lost_focus();
                true
            }
            None => false,
        }
    }

    /// Simulate a key press. Returns whether the managed side handled it.
    pub fn press_key(&self, key: Key, modifiers: Modifiers) -> bool {
        self.sink_for(widget_events::KEY_PRESSED)
            .is_some_and(|sink| sink.on_key_pressed(key, modifiers))
    }

    fn sink_for(&self, event: EventId) -> Option<Arc<dyn WidgetEventSink>> {
        if !self.is_enabled(event) {
            return None;
        }
        self.sink.lock().clone()
    }

    fn record_property(&self, property: &'static str, value: impl Display) {
        self.state.record(BackendCall::SetProperty {
            handle: self.handle,
            property,
            value: value.to_string(),
        });
    }

    fn enable_event(&self, event: EventId) {
        self.state.record(BackendCall::EnableEvent {
            handle: self.handle,
            event,
        });
        let mut enabled = self.enabled.lock();
        if !enabled.contains(&event) {
            enabled.push(event);
        }
    }

    fn disable_event(&self, event: EventId) {
        self.state.record(BackendCall::DisableEvent {
            handle: self.handle,
            event,
        });
        self.enabled.lock().retain(|e| *e != event);
    }

    fn dispose(&self) {
        self.state.record(BackendCall::Dispose {
            handle: self.handle,
        });
    }

    fn set_widget_sink(&self, sink: Arc<dyn WidgetEventSink>) {
        *self.sink.lock() = Some(sink);
    }

    fn set_visible(&self, visible: bool) {
        self.record_property("visible", visible);
        *self.visible.lock() = visible;
    }

    fn is_visible(&self) -> bool {
        *self.visible.lock()
    }

    fn set_sensitive(&self, sensitive: bool) {
        self.record_property("sensitive", sensitive);
        *self.sensitive.lock() = sensitive;
    }

    fn is_sensitive(&self) -> bool {
        *self.sensitive.lock()
    }

    fn set_tooltip(&self, tooltip: Option<&str>) {
        self.record_property("tooltip", tooltip.unwrap_or(""));
        *self.tooltip.lock() = tooltip.map(str::to_string);
    }

    fn tooltip(&self) -> Option<String> {
        self.tooltip.lock().clone()
    }

    fn set_focus(&self) {
        self.focus();
    }
}

/// Implements `Backend` and `WidgetBackend` by delegating to `self.base`.
macro_rules! impl_mock_widget {
    ($mock:ty) => {
        impl $mock {
            pub fn base(&self) -> &MockWidget {
                &self.base
            }
        }

        impl veneer::Backend for $mock {
            fn enable_event(&self, event: EventId) {
                self.base.enable_event(event);
            }

            fn disable_event(&self, event: EventId) {
                self.base.disable_event(event);
            }

            fn dispose(&self) {
                self.base.dispose();
            }
        }

        impl veneer::WidgetBackend for $mock {
            fn native_handle(&self) -> NativeHandle {
                self.base.handle()
            }

            fn set_widget_sink(&self, sink: Arc<dyn WidgetEventSink>) {
                self.base.set_widget_sink(sink);
            }

            fn set_visible(&self, visible: bool) {
                self.base.set_visible(visible);
            }

            fn is_visible(&self) -> bool {
                self.base.is_visible()
            }

            fn set_sensitive(&self, sensitive: bool) {
                self.base.set_sensitive(sensitive);
            }

            fn is_sensitive(&self) -> bool {
                self.base.is_sensitive()
            }

            fn set_tooltip(&self, tooltip: Option<&str>) {
                self.base.set_tooltip(tooltip);
            }

            fn tooltip(&self) -> Option<String> {
                self.base.tooltip()
            }

            fn set_focus(&self) {
                self.base.set_focus();
            }
        }
    };
}

pub struct MockButton {
    base: MockWidget,
    label: Mutex<String>,
    sink: Mutex<Option<Arc<dyn ButtonEventSink>>>,
}

impl MockButton {
    pub(crate) fn create(state: &Arc<MockState>) -> Arc<Self> {
        let button = Arc::new(Self {
            base: MockWidget::new("Button", state),
            label: Mutex::new(String::new()),
            sink: Mutex::new(None),
        });
        state.track_button(button.clone());
        button
    }

    /// Simulate a click. Returns whether it was delivered.
    pub fn click(&self) -> bool {
        if !self.base.is_enabled(button::CLICKED) {
            return false;
        }
        let sink = self.sink.lock().clone();
        match sink {
            Some(sink) => {
                sink.on_clicked();
                true
            }
            None => false,
        }
    }
}

impl_mock_widget!(MockButton);

impl ButtonBackend for MockButton {
    fn set_button_sink(&self, sink: Arc<dyn ButtonEventSink>) {
        *self.sink.lock() = Some(sink);
    }

    fn set_label(&self, label: &str) {
        self.base.record_property("label", label);
        *self.label.lock() = label.to_string();
    }

    fn label(&self) -> String {
        self.label.lock().clone()
    }
}

pub struct MockTextEntry {
    base: MockWidget,
    text: Mutex<String>,
    placeholder: Mutex<String>,
    read_only: Mutex<bool>,
    sink: Mutex<Option<Arc<dyn TextEntryEventSink>>>,
}

impl MockTextEntry {
    pub(crate) fn create(state: &Arc<MockState>) -> Arc<Self> {
        let entry = Arc::new(Self {
            base: MockWidget::new("TextEntry", state),
            text: Mutex::new(String::new()),
            placeholder: Mutex::new(String::new()),
            read_only: Mutex::new(false),
            sink: Mutex::new(None),
        });
        state.track_text_entry(entry.clone());
        entry
    }

    /// Simulate the user replacing the text.
    pub fn type_text(&self, text: &str) {
        self.replace_text(text);
    }

    /// Simulate the user pressing Enter. Returns whether it was delivered.
    pub fn activate(&self) -> bool {
        match self.sink_for(text_entry::ACTIVATED) {
            Some(sink) => {
                sink.on_activated();
                true
            }
            None => false,
        }
    }

    fn replace_text(&self, text: &str) {
        let changed = {
            let mut current = self.text.lock();
            if *current == text {
                false
            } else {
                *current = text.to_string();
                true
            }
        };

        if changed {
            if let Some(sink) = self.sink_for(text_entry::CHANGED) {
                sink.on_changed();
            }
        }
    }

    fn sink_for(&self, event: EventId) -> Option<Arc<dyn TextEntryEventSink>> {
        if !self.base.is_enabled(event) {
            return None;
        }
        self.sink.lock().clone()
    }
}

impl_mock_widget!(MockTextEntry);

impl TextEntryBackend for MockTextEntry {
    fn set_text_entry_sink(&self, sink: Arc<dyn TextEntryEventSink>) {
        *self.sink.lock() = Some(sink);
    }

    fn set_text(&self, text: &str) {
        self.base.record_property("text", text);
        self.replace_text(text);
    }

    fn text(&self) -> String {
        self.text.lock().clone()
    }

    fn set_placeholder(&self, placeholder: &str) {
        self.base.record_property("placeholder", placeholder);
        *self.placeholder.lock() = placeholder.to_string();
    }

    fn placeholder(&self) -> String {
        self.placeholder.lock().clone()
    }

    fn set_read_only(&self, read_only: bool) {
        self.base.record_property("read_only", read_only);
        *self.read_only.lock() = read_only;
    }

    fn is_read_only(&self) -> bool {
        *self.read_only.lock()
    }
}

pub struct MockSlider {
    base: MockWidget,
    range: Mutex<(f64, f64)>,
    value: Mutex<f64>,
    step: Mutex<Option<f64>>,
    sink: Mutex<Option<Arc<dyn SliderEventSink>>>,
}

impl MockSlider {
    pub(crate) fn create(state: &Arc<MockState>) -> Arc<Self> {
        let slider = Arc::new(Self {
            base: MockWidget::new("Slider", state),
            range: Mutex::new((0.0, 1.0)),
            value: Mutex::new(0.0),
            step: Mutex::new(None),
            sink: Mutex::new(None),
        });
        state.track_slider(slider.clone());
        slider
    }

    /// Simulate the user dragging the thumb.
    pub fn drag_to(&self, value: f64) {
        self.move_to(value);
    }

    pub fn range(&self) -> (f64, f64) {
        *self.range.lock()
    }

    fn move_to(&self, value: f64) {
        let (min, max) = *self.range.lock();
        let value = value.clamp(min, max);
        let changed = {
            let mut current = self.value.lock();
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        };

        if changed && self.base.is_enabled(slider::VALUE_CHANGED) {
            let sink = self.sink.lock().clone();
            if let Some(sink) = sink {
                sink.on_value_changed(value);
            }
        }
    }
}

impl_mock_widget!(MockSlider);

impl SliderBackend for MockSlider {
    fn set_slider_sink(&self, sink: Arc<dyn SliderEventSink>) {
        *self.sink.lock() = Some(sink);
    }

    fn set_range(&self, min: f64, max: f64) {
        self.base.record_property("range", format!("{}..={}", min, max));
        *self.range.lock() = (min, max);
        let current = *self.value.lock();
        self.move_to(current);
    }

    fn set_value(&self, value: f64) {
        self.base.record_property("value", value);
        self.move_to(value);
    }

    fn value(&self) -> f64 {
        *self.value.lock()
    }

    fn set_step(&self, step: f64) -> ToolkitResult<()> {
        if !self.base.state.slider_step_supported() {
            return Err(ToolkitError::unsupported("SliderBackend", "set_step"));
        }
        self.base.record_property("step", step);
        *self.step.lock() = Some(step);
        Ok(())
    }

    fn step(&self) -> ToolkitResult<f64> {
        if !self.base.state.slider_step_supported() {
            return Err(ToolkitError::unsupported("SliderBackend", "step"));
        }
        Ok(self.step.lock().unwrap_or(1.0))
    }
}

pub struct MockLinkLabel {
    base: MockWidget,
    text: Mutex<String>,
    uri: Mutex<String>,
    sink: Mutex<Option<Arc<dyn LinkLabelEventSink>>>,
}

impl MockLinkLabel {
    pub(crate) fn create(state: &Arc<MockState>) -> Arc<Self> {
        let label = Arc::new(Self {
            base: MockWidget::new("LinkLabel", state),
            text: Mutex::new(String::new()),
            uri: Mutex::new(String::new()),
            sink: Mutex::new(None),
        });
        state.track_link_label(label.clone());
        label
    }

    /// Simulate the user activating the link.
    ///
    /// Returns whether the managed side handled it. When it did not, the
    /// mock opens the URI itself, recorded as [`BackendCall::OpenUrl`].
    pub fn navigate(&self) -> bool {
        let uri = self.uri.lock().clone();
        let sink = if self.base.is_enabled(link_label::NAVIGATE_TO_URL) {
            self.sink.lock().clone()
        } else {
            None
        };

        let handled = sink.is_some_and(|sink| sink.on_navigate_to_url(&uri));
        if !handled {
            self.base.state.record(BackendCall::OpenUrl {
                handle: self.base.handle(),
                uri,
            });
        }
        handled
    }
}

impl_mock_widget!(MockLinkLabel);

impl LinkLabelBackend for MockLinkLabel {
    fn set_link_label_sink(&self, sink: Arc<dyn LinkLabelEventSink>) {
        *self.sink.lock() = Some(sink);
    }

    fn set_text(&self, text: &str) {
        self.base.record_property("text", text);
        *self.text.lock() = text.to_string();
    }

    fn text(&self) -> String {
        self.text.lock().clone()
    }

    fn set_uri(&self, uri: &str) {
        self.base.record_property("uri", uri);
        *self.uri.lock() = uri.to_string();
    }

    fn uri(&self) -> String {
        self.uri.lock().clone()
    }
}

pub struct MockBox {
    base: MockWidget,
    children: Mutex<Vec<NativeHandle>>,
    spacing: Mutex<u32>,
}

impl MockBox {
    pub(crate) fn create(state: &Arc<MockState>) -> Arc<Self> {
        let vbox = Arc::new(Self {
            base: MockWidget::new("VBox", state),
            children: Mutex::new(Vec::new()),
            spacing: Mutex::new(0),
        });
        state.track_box(vbox.clone());
        vbox
    }

    /// Native children in display order.
    pub fn children(&self) -> Vec<NativeHandle> {
        self.children.lock().clone()
    }
}

impl_mock_widget!(MockBox);

impl BoxBackend for MockBox {
    fn add_child(&self, child: NativeHandle) {
        self.base.state.record(BackendCall::AddChild {
            parent: self.base.handle(),
            child,
        });
        self.children.lock().push(child);
    }

    fn remove_child(&self, child: NativeHandle) {
        self.base.state.record(BackendCall::RemoveChild {
            parent: self.base.handle(),
            child,
        });
        self.children.lock().retain(|handle| *handle != child);
    }

    fn set_spacing(&self, spacing: u32) {
        self.base.record_property("spacing", spacing);
        *self.spacing.lock() = spacing;
    }

    fn spacing(&self) -> u32 {
        *self.spacing.lock()
    }
}
