use std::thread;

use veneer::{Toolkit, ToolkitBuilder};
use winit::application::ApplicationHandler;
use winit::error::{EventLoopError, OsError};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::dispatcher::{UiEvent, WinitDispatcher};

/// Errors from [`run_app`].
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] EventLoopError),
}

pub struct AppCtx<'a> {
    event_loop: &'a ActiveEventLoop,
    toolkit: &'a Toolkit,
}

impl AppCtx<'_> {
    /// The toolkit running on this loop; also the current toolkit.
    pub fn toolkit(&self) -> &Toolkit {
        self.toolkit
    }

    pub fn create_window(&self, attributes: WindowAttributes) -> Result<Window, OsError> {
        self.event_loop.create_window(attributes)
    }

    pub fn exit(&self) {
        self.event_loop.exit();
    }
}

pub trait App {
    /// Called once the event loop is running and the toolkit is current.
    #[allow(unused_variables)]
    fn on_start(&mut self, ctx: &mut AppCtx) {}

    /// Called for every window event. The default exits on close.
    fn window_event(&mut self, ctx: &mut AppCtx, window_id: WindowId, event: WindowEvent) {
        if let WindowEvent::CloseRequested = event {
            tracing::info!("Close requested for window {:?}", window_id);
            ctx.exit();
        }
    }

    /// Called when the loop is exiting, before the toolkit is torn down.
    #[allow(unused_variables)]
    fn on_exit(&mut self, ctx: &mut AppCtx) {}
}

pub type AppFactory = fn(ctx: &mut AppCtx) -> Box<dyn App>;

struct AppProxy {
    factory: AppFactory,
    app: Option<Box<dyn App>>,
    toolkit: Toolkit,
}

impl ApplicationHandler<UiEvent> for AppProxy {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.app.is_some() {
            return;
        }

        let mut ctx = AppCtx {
            event_loop,
            toolkit: &self.toolkit,
        };
        let mut app = (self.factory)(&mut ctx);
        app.on_start(&mut ctx);
        self.app = Some(app);
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: UiEvent) {
        event.run(&self.toolkit);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(app) = self.app.as_mut() else {
            return;
        };
        let mut ctx = AppCtx {
            event_loop,
            toolkit: &self.toolkit,
        };
        app.window_event(&mut ctx, window_id, event);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        veneer_core::profiling::new_frame();
    }

    fn exiting(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(app) = self.app.as_mut() {
            let mut ctx = AppCtx {
                event_loop,
                toolkit: &self.toolkit,
            };
            app.on_exit(&mut ctx);
        }
        self.app = None;
        Toolkit::clear_current();
    }
}

/// Build the toolkit from `builder` with the calling thread as its UI thread,
/// make it current, and run the event loop until the app exits.
///
/// # Example
///
/// ```ignore
/// let builder = Toolkit::builder()
///     .with_config(ToolkitConfig::from_env()?)
///     .with_family(MyToolkit);
/// veneer_winit::run_app(builder, |ctx| Box::new(MyApp::new(ctx)))?;
/// ```
pub fn run_app(builder: ToolkitBuilder, factory: AppFactory) -> Result<(), RunError> {
    let event_loop = EventLoop::<UiEvent>::with_user_event().build()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let dispatcher = WinitDispatcher::new(event_loop.create_proxy());
    let toolkit = builder
        .with_dispatcher(std::sync::Arc::new(dispatcher))
        .with_ui_thread(thread::current().id())
        .build();
    toolkit.set_current();

    let mut proxy = AppProxy {
        factory,
        app: None,
        toolkit,
    };
    event_loop.run_app(&mut proxy)?;
    Ok(())
}
