//! Native events are enabled exactly while someone listens.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use veneer::widgets::{Button, LinkLabel, TextEntry, button, link_label, text_entry};
use veneer::{Key, Modifiers, Toolkit, Widget, widget_events};
use veneer_test_utils::{MockState, MockToolkit};

fn mock_toolkit() -> (Toolkit, Arc<MockState>) {
    let mock = MockToolkit::new();
    let state = mock.state();
    (Toolkit::builder().with_family(mock).build(), state)
}

#[test]
fn test_unobserved_event_never_enabled() {
    let (toolkit, state) = mock_toolkit();
    let button = Button::with_toolkit(&toolkit);
    button.set_label("Quiet");
    button.label().unwrap();

    assert_eq!(state.count_enables(button::CLICKED), 0);
    assert!(!state.last_button().unwrap().click());
}

#[test]
fn test_enable_on_first_and_disable_on_last_listener() {
    let (toolkit, state) = mock_toolkit();
    let button = Button::with_toolkit(&toolkit);
    button.native_handle().unwrap();

    let first = button.connect_clicked(|| {});
    assert_eq!(state.count_enables(button::CLICKED), 1);

    let second = button.connect_clicked(|| {});
    assert_eq!(state.count_enables(button::CLICKED), 1);

    assert!(button.disconnect_clicked(first));
    assert_eq!(state.count_disables(button::CLICKED), 0);

    assert!(button.disconnect_clicked(second));
    assert_eq!(state.count_disables(button::CLICKED), 1);
    assert_eq!(state.count_enables(button::CLICKED), 1);
}

#[test]
fn test_listener_before_creation_enables_on_creation() {
    let (toolkit, state) = mock_toolkit();
    let entry = TextEntry::with_toolkit(&toolkit);

    entry.connect_changed(|| {});
    entry.connect_changed(|| {});
    assert_eq!(state.count_creates("TextEntry"), 0);
    assert_eq!(state.count_enables(text_entry::CHANGED), 0);

    entry.text().unwrap();
    assert_eq!(state.count_enables(text_entry::CHANGED), 1);
    assert_eq!(state.count_enables(text_entry::ACTIVATED), 0);
}

#[test]
fn test_listener_added_and_removed_before_creation_never_enables() {
    let (toolkit, state) = mock_toolkit();
    let button = Button::with_toolkit(&toolkit);

    let id = button.connect_clicked(|| {});
    button.disconnect_clicked(id);
    button.native_handle().unwrap();

    assert_eq!(state.count_enables(button::CLICKED), 0);
    assert_eq!(state.count_disables(button::CLICKED), 0);
}

#[test]
fn test_delivery_follows_subscription() {
    let (toolkit, state) = mock_toolkit();
    let button = Button::with_toolkit(&toolkit);
    let clicks = Arc::new(AtomicUsize::new(0));

    let counter = clicks.clone();
    let id = button.connect_clicked(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    button.native_handle().unwrap();
    let mock = state.last_button().unwrap();

    assert!(mock.click());
    button.disconnect_clicked(id);
    assert!(!mock.click());
    assert_eq!(clicks.load(Ordering::SeqCst), 1);
}

#[test]
fn test_disconnect_unknown_handler_is_noop() {
    let (toolkit, state) = mock_toolkit();
    let button = Button::with_toolkit(&toolkit);
    let id = button.connect_clicked(|| {});
    button.native_handle().unwrap();

    assert!(button.disconnect_clicked(id));
    assert!(!button.disconnect_clicked(id));
    assert_eq!(state.count_disables(button::CLICKED), 1);
}

#[test]
fn test_base_events_are_gated_too() {
    let (toolkit, state) = mock_toolkit();
    let entry = TextEntry::with_toolkit(&toolkit);
    entry.native_handle().unwrap();
    let mock = state.last_text_entry().unwrap();

    assert!(!mock.base().press_key(Key::Enter, Modifiers::empty()));
    assert_eq!(state.count_enables(widget_events::KEY_PRESSED), 0);

    let id = entry.connect_key_pressed(|args| args.handled = true);
    assert!(mock.base().press_key(Key::Enter, Modifiers::empty()));

    entry.disconnect_key_pressed(id);
    assert_eq!(state.count_disables(widget_events::KEY_PRESSED), 1);
}

#[test]
fn test_always_enabled_event_bypasses_gating() {
    let (toolkit, state) = mock_toolkit();
    let link = LinkLabel::with_toolkit(&toolkit);
    link.native_handle().unwrap();

    assert_eq!(state.count_enables(link_label::NAVIGATE_TO_URL), 1);

    let id = link.connect_navigate_to_url(|_| {});
    link.disconnect_navigate_to_url(id);

    assert_eq!(state.count_enables(link_label::NAVIGATE_TO_URL), 1);
    assert_eq!(state.count_disables(link_label::NAVIGATE_TO_URL), 0);
    assert!(
        state
            .last_link_label()
            .unwrap()
            .base()
            .is_enabled(link_label::NAVIGATE_TO_URL)
    );
}
