//! Profiling utilities based on the `puffin` crate.
//!
//! With the `profiling` feature disabled the scope macros compile to nothing,
//! so call sites never need their own `cfg` gates.

#[cfg(feature = "profiling")]
pub use puffin::{profile_function, profile_scope};

#[cfg(not(feature = "profiling"))]
#[macro_export]
macro_rules! profile_function {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "profiling"))]
#[macro_export]
macro_rules! profile_scope {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "profiling"))]
pub use crate::{profile_function, profile_scope};

/// Turn scope collection on or off at runtime.
pub fn set_enabled(enabled: bool) {
    #[cfg(feature = "profiling")]
    puffin::set_scopes_on(enabled);
    #[cfg(not(feature = "profiling"))]
    let _ = enabled;
}

/// Mark the start of a new profiling frame.
///
/// UI loops call this once per drained batch of work items.
#[inline]
pub fn new_frame() {
    #[cfg(feature = "profiling")]
    puffin::GlobalProfiler::lock().new_frame();
}
