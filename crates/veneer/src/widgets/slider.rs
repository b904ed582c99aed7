//! Horizontal value slider.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::backend::{Capability, EventId, WidgetBackend, widget_events};
use crate::error::{ToolkitError, ToolkitResult};
use crate::event::{EventSlot, EventTable, HandlerId};
use crate::host::BackendHost;
use crate::toolkit::Toolkit;
use crate::widget::{WidgetCore, WidgetSink, impl_widget};

pub const VALUE_CHANGED: EventId = EventId::new("Slider.ValueChanged");

/// Native slider.
///
/// Backends keep their value within the last range they were given.
pub trait SliderBackend: WidgetBackend {
    fn set_slider_sink(&self, sink: Arc<dyn SliderEventSink>);

    fn set_range(&self, min: f64, max: f64);

    fn set_value(&self, value: f64);
    fn value(&self) -> f64;

    /// Snap increment. Backends without stepping return
    /// [`ToolkitError::Unsupported`].
    fn set_step(&self, step: f64) -> ToolkitResult<()>;
    fn step(&self) -> ToolkitResult<f64>;
}

impl Capability for dyn SliderBackend {
    const NAME: &'static str = "SliderBackend";
}

pub trait SliderEventSink: Send + Sync {
    fn on_value_changed(&self, value: f64);
}

/// Arguments of [`VALUE_CHANGED`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueChangedEventArgs {
    pub value: f64,
}

pub struct Slider {
    shared: Arc<SliderShared>,
}

struct SliderShared {
    core: Arc<WidgetCore>,
    host: BackendHost<dyn SliderBackend>,
    /// Façade copy of the range so writes can be clamped without a backend.
    range: Mutex<(f64, f64)>,
    value_changed: EventSlot<ValueChangedEventArgs>,
}

impl SliderShared {
    fn backend(self: &Arc<Self>) -> ToolkitResult<Arc<dyn SliderBackend>> {
        self.host.backend_with(|backend| {
            let (min, max) = *self.range.lock();
            backend.set_range(min, max);
            backend.set_widget_sink(WidgetSink::new(&self.core));
            backend.set_slider_sink(Arc::new(SliderSink {
                shared: Arc::downgrade(self),
            }));
        })
    }

    fn on_value_changed(&self, value: f64) {
        self.value_changed
            .emit(&mut ValueChangedEventArgs { value });
    }

    fn dispose(&self) {
        self.host.dispose();
    }
}

struct SliderSink {
    shared: Weak<SliderShared>,
}

impl SliderEventSink for SliderSink {
    fn on_value_changed(&self, value: f64) {
        if let Some(shared) = self.shared.upgrade() {
            shared.on_value_changed(value);
        }
    }
}

impl Slider {
    pub const DEFAULT_RANGE: (f64, f64) = (0.0, 100.0);

    pub const EVENTS: EventTable = EventTable {
        kind: "Slider",
        events: &[
            widget_events::GOT_FOCUS,
            widget_events::LOST_FOCUS,
            widget_events::KEY_PRESSED,
            VALUE_CHANGED,
        ],
        always_enabled: &[],
    };

    pub fn new() -> Self {
        Self::build(None)
    }

    pub fn with_toolkit(toolkit: &Toolkit) -> Self {
        Self::build(Some(toolkit.clone()))
    }

    fn build(toolkit: Option<Toolkit>) -> Self {
        Self {
            shared: Arc::new(SliderShared {
                core: WidgetCore::new(Self::EVENTS.kind),
                host: BackendHost::new(toolkit, &Self::EVENTS),
                range: Mutex::new(Self::DEFAULT_RANGE),
                value_changed: EventSlot::new(VALUE_CHANGED),
            }),
        }
    }

    /// Set the allowed range. Fails if `min > max` or either bound is NaN.
    pub fn set_range(&self, min: f64, max: f64) -> ToolkitResult<()> {
        if min.is_nan() || max.is_nan() || min > max {
            return Err(ToolkitError::InvalidArgument(format!(
                "slider range {}..={} is empty",
                min, max
            )));
        }

        *self.shared.range.lock() = (min, max);
        if let Some(backend) = self.shared.host.try_backend() {
            backend.set_range(min, max);
        }
        Ok(())
    }

    pub fn range(&self) -> (f64, f64) {
        *self.shared.range.lock()
    }

    pub fn minimum(&self) -> f64 {
        self.range().0
    }

    pub fn maximum(&self) -> f64 {
        self.range().1
    }

    /// Set the value, clamped into the current range. Fails on NaN.
    pub fn set_value(&self, value: f64) -> ToolkitResult<()> {
        if value.is_nan() {
            return Err(ToolkitError::InvalidArgument(
                "slider value must be a number".to_string(),
            ));
        }

        let (min, max) = self.range();
        let value = value.clamp(min, max);
        self.shared
            .host
            .set_or_buffer(move |backend| backend.set_value(value));
        Ok(())
    }

    pub fn value(&self) -> ToolkitResult<f64> {
        Ok(self.shared.backend()?.value())
    }

    /// Creates the backend, since only it knows whether stepping is
    /// supported.
    pub fn set_step(&self, step: f64) -> ToolkitResult<()> {
        if step.is_nan() || step <= 0.0 {
            return Err(ToolkitError::InvalidArgument(format!(
                "slider step {} must be positive",
                step
            )));
        }
        self.shared.backend()?.set_step(step)
    }

    pub fn step(&self) -> ToolkitResult<f64> {
        self.shared.backend()?.step()
    }

    pub fn connect_value_changed(
        &self,
        handler: impl Fn(&mut ValueChangedEventArgs) + Send + Sync + 'static,
    ) -> HandlerId {
        self.shared
            .value_changed
            .connect(&self.shared.host, handler)
    }

    pub fn disconnect_value_changed(&self, id: HandlerId) -> bool {
        self.shared.value_changed.disconnect(&self.shared.host, id)
    }
}

impl Default for Slider {
    fn default() -> Self {
        Self::new()
    }
}

impl_widget!(Slider);
