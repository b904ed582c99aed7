//! Backend capability contracts.
//!
//! A backend is an opaque native-toolkit object implementing one capability
//! interface per widget kind. Widgets never see a concrete backend type: they
//! hold `Arc<dyn XBackend>` obtained through their
//! [`BackendHost`](crate::host::BackendHost), and backends talk back only
//! through the event-sink traits handed to them after creation.
//!
//! # Implementing a backend
//!
//! ```ignore
//! struct GtkButton { /* native handle, sinks, ... */ }
//!
//! impl Backend for GtkButton {
//!     fn enable_event(&self, event: EventId) { /* connect native signal */ }
//!     fn disable_event(&self, event: EventId) { /* disconnect it */ }
//! }
//! impl WidgetBackend for GtkButton { /* ... */ }
//! impl ButtonBackend for GtkButton { /* ... */ }
//! ```
//!
//! Property setters must be idempotent: setting the value a backend already
//! holds must not raise a second change notification.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

/// Identifier of a native event a backend can be asked to deliver.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventId(&'static str);

impl EventId {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub const fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Debug for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventId({})", self.0)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Events every widget kind can deliver.
pub mod widget_events {
    use super::EventId;

    pub const GOT_FOCUS: EventId = EventId::new("Widget.GotFocus");
    pub const LOST_FOCUS: EventId = EventId::new("Widget.LostFocus");
    pub const KEY_PRESSED: EventId = EventId::new("Widget.KeyPressed");
}

/// Opaque identity of a native widget, used when one backend has to refer
/// to another (e.g. a container adding a child).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeHandle(pub u64);

/// Base contract shared by every backend.
pub trait Backend: Send + Sync + 'static {
    /// Start delivering `event` to the installed sink.
    ///
    /// Unknown events are ignored.
    fn enable_event(&self, event: EventId);

    /// Stop delivering `event`.
    fn disable_event(&self, event: EventId);

    /// Release native resources. Called at most once by the owning host.
    fn dispose(&self) {}
}

/// Marks a capability interface (implemented for `dyn XBackend`) and gives
/// it a stable name for registry lookups and error messages.
pub trait Capability: Backend {
    const NAME: &'static str;
}

bitflags! {
    /// Keyboard modifier state at the time of a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CONTROL = 1 << 1;
        const ALT = 1 << 2;
        const COMMAND = 1 << 3;
    }
}

/// A key reported by the native toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Escape,
    Tab,
    Backspace,
    Delete,
    Up,
    Down,
    Left,
    Right,
    /// Toolkit-specific key code with no portable equivalent.
    Other(u32),
}

/// Properties and hooks common to all widget backends.
pub trait WidgetBackend: Backend {
    fn native_handle(&self) -> NativeHandle;

    /// Install the sink that receives [`widget_events`].
    fn set_widget_sink(&self, sink: Arc<dyn WidgetEventSink>);

    fn set_visible(&self, visible: bool);
    fn is_visible(&self) -> bool;

    fn set_sensitive(&self, sensitive: bool);
    fn is_sensitive(&self) -> bool;

    fn set_tooltip(&self, tooltip: Option<&str>);
    fn tooltip(&self) -> Option<String>;

    /// Move keyboard focus to this widget.
    fn set_focus(&self);
}

/// Native-to-managed notifications common to all widgets.
pub trait WidgetEventSink: Send + Sync {
    fn on_got_focus(&self);
    fn on_lost_focus(&self);

    /// Returns `true` when the key press was handled and the backend should
    /// suppress its default processing.
    fn on_key_pressed(&self, key: Key, modifiers: Modifiers) -> bool;
}
