//! The mock backend family.

use std::sync::Arc;

use veneer::widgets::{BoxBackend, ButtonBackend, LinkLabelBackend, SliderBackend, TextEntryBackend};
use veneer::{BackendRegistry, Capability, ToolkitBackend, ToolkitType};

use crate::calls::MockState;
use crate::widgets::{MockBox, MockButton, MockLinkLabel, MockSlider, MockTextEntry};

/// Backend family registering a recording mock for every widget capability.
///
/// # Example
///
/// ```ignore
/// // A family that can't make sliders.
/// let mock = MockToolkit::new().without::<dyn SliderBackend>();
/// ```
pub struct MockToolkit {
    state: Arc<MockState>,
    omitted: Vec<&'static str>,
}

impl MockToolkit {
    pub fn new() -> Self {
        Self {
            state: MockState::new(),
            omitted: Vec::new(),
        }
    }

    /// Shared recording state, also reachable after the family is handed to
    /// a toolkit builder.
    pub fn state(&self) -> Arc<MockState> {
        self.state.clone()
    }

    /// Leave capability `B` unregistered.
    pub fn without<B: ?Sized + Capability>(mut self) -> Self {
        self.omitted.push(B::NAME);
        self
    }

    /// Make slider backends report stepping as unsupported.
    pub fn without_slider_step(self) -> Self {
        self.state.set_slider_step_supported(false);
        self
    }

    fn offers<B: ?Sized + Capability>(&self) -> bool {
        !self.omitted.contains(&B::NAME)
    }
}

impl Default for MockToolkit {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolkitBackend for MockToolkit {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn toolkit_type(&self) -> ToolkitType {
        ToolkitType::Headless
    }

    fn register(&self, registry: &mut BackendRegistry) {
        if self.offers::<dyn ButtonBackend>() {
            let state = self.state.clone();
            registry.register::<dyn ButtonBackend>(move || MockButton::create(&state));
        }
        if self.offers::<dyn TextEntryBackend>() {
            let state = self.state.clone();
            registry.register::<dyn TextEntryBackend>(move || MockTextEntry::create(&state));
        }
        if self.offers::<dyn SliderBackend>() {
            let state = self.state.clone();
            registry.register::<dyn SliderBackend>(move || MockSlider::create(&state));
        }
        if self.offers::<dyn LinkLabelBackend>() {
            let state = self.state.clone();
            registry.register::<dyn LinkLabelBackend>(move || MockLinkLabel::create(&state));
        }
        if self.offers::<dyn BoxBackend>() {
            let state = self.state.clone();
            registry.register::<dyn BoxBackend>(move || MockBox::create(&state));
        }
    }
}
