//! Runs a Veneer toolkit on a `winit` event loop.
//!
//! The event loop's thread becomes the toolkit's UI thread. Work marshalled by
//! a [`SyncBridge`](veneer::SyncBridge) or
//! [`UiTaskScheduler`](veneer::UiTaskScheduler) arrives as a user event through
//! an `EventLoopProxy` and runs between window events, in posting order.

pub mod app;
pub mod dispatcher;

pub use app::{App, AppCtx, AppFactory, RunError, run_app};
pub use dispatcher::{UiEvent, WinitDispatcher};
pub use winit::window::WindowId;
