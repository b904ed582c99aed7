//! The pattern widgets.
//!
//! Each module pairs a capability trait and event-sink trait with the façade
//! built on them.

pub mod button;
pub mod container;
pub mod link_label;
pub mod slider;
pub mod text_entry;

pub use button::{Button, ButtonBackend, ButtonEventSink};
pub use container::{BoxBackend, VBox};
pub use link_label::{LinkLabel, LinkLabelBackend, LinkLabelEventSink};
pub use slider::{Slider, SliderBackend, SliderEventSink, ValueChangedEventArgs};
pub use text_entry::{TextEntry, TextEntryBackend, TextEntryEventSink};
