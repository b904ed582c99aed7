//! Veneer Core
//!
//! Ambient utilities shared by every Veneer crate: logging setup and
//! profiling scopes.

pub mod logging;
pub mod profiling;
