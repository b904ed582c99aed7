//! Test utilities for Veneer.
//!
//! [`MockToolkit`] is a backend family whose backends hold their properties
//! in memory and record every call the core makes into a shared
//! [`MockState`]. Tests drive native events through the mock backends
//! (`click()`, `navigate()`, ...) and assert on the recorded calls.
//!
//! # Example
//!
//! ```ignore
//! use veneer::{Toolkit, widgets::Button};
//! use veneer_test_utils::MockToolkit;
//!
//! let mock = MockToolkit::new();
//! let state = mock.state();
//! let toolkit = Toolkit::builder().with_family(mock).build();
//!
//! let button = Button::with_toolkit(&toolkit);
//! button.connect_clicked(|| println!("clicked"));
//! button.set_label("OK");
//! assert_eq!(state.count_creates("Button"), 0);
//!
//! assert_eq!(button.label().unwrap(), "OK");
//! state.last_button().unwrap().click();
//! ```
//!
//! Mock backends only deliver events the core has enabled, the same way a
//! native backend that disconnects its signals would.

pub mod calls;
pub mod toolkit;
pub mod widgets;

pub use calls::{BackendCall, MockState};
pub use toolkit::MockToolkit;
pub use widgets::{MockBox, MockButton, MockLinkLabel, MockSlider, MockTextEntry, MockWidget};
