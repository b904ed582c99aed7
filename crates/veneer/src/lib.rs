//! Veneer - platform-independent widgets over pluggable native backends.
//!
//! A [`Toolkit`] is built once from one or more backend families and picks
//! the one matching its configuration. Widgets created against it bind to a
//! backend lazily, on first access, through a [`BackendHost`]. Native events
//! are only enabled while a handler is connected.
//!
//! All widget state belongs to a single UI thread. Other threads reach it
//! through a [`SyncBridge`] (post or blocking send) or a [`UiTaskScheduler`]
//! (futures polled only on the UI thread). The embedding event loop provides
//! the single primitive these need, [`UiDispatcher`]; see [`HeadlessLoop`] and
//! the `veneer-winit` crate.
//!
//! # Quick Start
//!
//! ```ignore
//! use veneer::prelude::*;
//!
//! let ui_loop = HeadlessLoop::new()?;
//! let toolkit = ui_loop
//!     .bind(Toolkit::builder().with_family(MyToolkit))
//!     .build();
//! toolkit.set_current();
//!
//! let button = Button::new();
//! button.set_label("Save");
//! button.connect_clicked(|| tracing::info!("saved"));
//! ```

pub mod backend;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod headless;
pub mod host;
pub mod pool;
pub mod registry;
pub mod scheduler;
pub mod sync;
pub mod timer;
pub mod toolkit;
pub mod widget;
pub mod widgets;

pub use backend::{
    Backend, Capability, EventId, Key, Modifiers, NativeHandle, WidgetBackend, WidgetEventSink,
    widget_events,
};
pub use config::{ToolkitConfig, ToolkitType};
pub use dispatch::{UiDispatcher, Work};
pub use error::{ToolkitError, ToolkitResult};
pub use event::{EventGate, EventSlot, EventTable, HandlerId, KeyEventArgs, NavigateToUrlEventArgs};
pub use headless::{HeadlessDispatcher, HeadlessLoop};
pub use host::BackendHost;
pub use pool::TaskPool;
pub use registry::BackendRegistry;
pub use scheduler::{UiTask, UiTaskScheduler};
pub use sync::SyncBridge;
pub use timer::TimerHandle;
pub use toolkit::{Toolkit, ToolkitBackend, ToolkitBuilder};
pub use widget::{Widget, WidgetCore, WidgetId};

pub mod prelude {
    pub use crate::error::{ToolkitError, ToolkitResult};
    pub use crate::headless::HeadlessLoop;
    pub use crate::toolkit::{Toolkit, ToolkitBackend};
    pub use crate::widget::Widget;
    pub use crate::widgets::{Button, LinkLabel, Slider, TextEntry, VBox};
}
