//! Call recording shared by every mock backend of one [`MockToolkit`].
//!
//! [`MockToolkit`]: crate::MockToolkit

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use veneer::{EventId, NativeHandle};

use crate::widgets::{MockBox, MockButton, MockLinkLabel, MockSlider, MockTextEntry};

/// One call made by the core into a mock backend.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Created {
        kind: &'static str,
        handle: NativeHandle,
    },
    EnableEvent {
        handle: NativeHandle,
        event: EventId,
    },
    DisableEvent {
        handle: NativeHandle,
        event: EventId,
    },
    SetProperty {
        handle: NativeHandle,
        property: &'static str,
        value: String,
    },
    AddChild {
        parent: NativeHandle,
        child: NativeHandle,
    },
    RemoveChild {
        parent: NativeHandle,
        child: NativeHandle,
    },
    /// Default link action, taken when navigation was not handled.
    OpenUrl {
        handle: NativeHandle,
        uri: String,
    },
    Dispose {
        handle: NativeHandle,
    },
}

/// Recorded calls and every backend the mock family has created.
pub struct MockState {
    calls: Mutex<Vec<BackendCall>>,
    next_handle: AtomicU64,
    slider_step_supported: AtomicBool,

    buttons: Mutex<Vec<Arc<MockButton>>>,
    text_entries: Mutex<Vec<Arc<MockTextEntry>>>,
    sliders: Mutex<Vec<Arc<MockSlider>>>,
    link_labels: Mutex<Vec<Arc<MockLinkLabel>>>,
    boxes: Mutex<Vec<Arc<MockBox>>>,
}

impl MockState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            next_handle: AtomicU64::new(1),
            slider_step_supported: AtomicBool::new(true),
            buttons: Mutex::new(Vec::new()),
            text_entries: Mutex::new(Vec::new()),
            sliders: Mutex::new(Vec::new()),
            link_labels: Mutex::new(Vec::new()),
            boxes: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn record(&self, call: BackendCall) {
        self.calls.lock().push(call);
    }

    pub(crate) fn next_handle(&self) -> NativeHandle {
        NativeHandle(self.next_handle.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn set_slider_step_supported(&self, supported: bool) {
        self.slider_step_supported.store(supported, Ordering::Relaxed);
    }

    pub fn slider_step_supported(&self) -> bool {
        self.slider_step_supported.load(Ordering::Relaxed)
    }

    /// Get a copy of all recorded calls.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().clone()
    }

    /// Recorded calls involving `handle`.
    pub fn calls_for(&self, handle: NativeHandle) -> Vec<BackendCall> {
        self.calls
            .lock()
            .iter()
            .filter(|call| match call {
                BackendCall::Created { handle: h, .. }
                | BackendCall::EnableEvent { handle: h, .. }
                | BackendCall::DisableEvent { handle: h, .. }
                | BackendCall::SetProperty { handle: h, .. }
                | BackendCall::OpenUrl { handle: h, .. }
                | BackendCall::Dispose { handle: h } => *h == handle,
                BackendCall::AddChild { parent, child }
                | BackendCall::RemoveChild { parent, child } => {
                    *parent == handle || *child == handle
                }
            })
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Count backends of `kind` created so far.
    pub fn count_creates(&self, kind: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, BackendCall::Created { kind: k, .. } if *k == kind))
            .count()
    }

    /// Count enable calls for `event` across all backends.
    pub fn count_enables(&self, event: EventId) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, BackendCall::EnableEvent { event: e, .. } if *e == event))
            .count()
    }

    /// Count disable calls for `event` across all backends.
    pub fn count_disables(&self, event: EventId) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, BackendCall::DisableEvent { event: e, .. } if *e == event))
            .count()
    }

    pub fn count_disposes(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, BackendCall::Dispose { .. }))
            .count()
    }

    /// URIs the backends opened themselves.
    pub fn opened_urls(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                BackendCall::OpenUrl { uri, .. } => Some(uri.clone()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn track_button(&self, button: Arc<MockButton>) {
        self.buttons.lock().push(button);
    }

    pub(crate) fn track_text_entry(&self, entry: Arc<MockTextEntry>) {
        self.text_entries.lock().push(entry);
    }

    pub(crate) fn track_slider(&self, slider: Arc<MockSlider>) {
        self.sliders.lock().push(slider);
    }

    pub(crate) fn track_link_label(&self, label: Arc<MockLinkLabel>) {
        self.link_labels.lock().push(label);
    }

    pub(crate) fn track_box(&self, vbox: Arc<MockBox>) {
        self.boxes.lock().push(vbox);
    }

    pub fn button(&self, handle: NativeHandle) -> Option<Arc<MockButton>> {
        find(&self.buttons, handle, |b| b.base().handle())
    }

    pub fn last_button(&self) -> Option<Arc<MockButton>> {
        self.buttons.lock().last().cloned()
    }

    pub fn text_entry(&self, handle: NativeHandle) -> Option<Arc<MockTextEntry>> {
        find(&self.text_entries, handle, |e| e.base().handle())
    }

    pub fn last_text_entry(&self) -> Option<Arc<MockTextEntry>> {
        self.text_entries.lock().last().cloned()
    }

    pub fn slider(&self, handle: NativeHandle) -> Option<Arc<MockSlider>> {
        find(&self.sliders, handle, |s| s.base().handle())
    }

    pub fn last_slider(&self) -> Option<Arc<MockSlider>> {
        self.sliders.lock().last().cloned()
    }

    pub fn link_label(&self, handle: NativeHandle) -> Option<Arc<MockLinkLabel>> {
        find(&self.link_labels, handle, |l| l.base().handle())
    }

    pub fn last_link_label(&self) -> Option<Arc<MockLinkLabel>> {
        self.link_labels.lock().last().cloned()
    }

    pub fn vbox(&self, handle: NativeHandle) -> Option<Arc<MockBox>> {
        find(&self.boxes, handle, |b| b.base().handle())
    }

    pub fn last_vbox(&self) -> Option<Arc<MockBox>> {
        self.boxes.lock().last().cloned()
    }
}

fn find<T>(
    list: &Mutex<Vec<Arc<T>>>,
    handle: NativeHandle,
    handle_of: impl Fn(&T) -> NativeHandle,
) -> Option<Arc<T>> {
    list.lock()
        .iter()
        .find(|item| handle_of(&***item) == handle)
        .cloned()
}
