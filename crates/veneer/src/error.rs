//! Error types for the toolkit core.

/// Errors surfaced by widget, backend and dispatch operations.
///
/// Errors are `Clone` so a failed backend creation can be remembered by its
/// host and handed back on every later access.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolkitError {
    /// A backend was requested before any toolkit engine was configured.
    #[error("no toolkit engine has been initialized")]
    ToolkitNotInitialized,

    /// The active toolkit has no implementation for the requested capability.
    #[error("no backend registered for capability `{capability}` under toolkit `{toolkit}`")]
    BackendNotFound {
        /// Name of the capability interface.
        capability: &'static str,
        /// Name of the active toolkit.
        toolkit: String,
    },

    /// The backend declares the operation unimplemented.
    #[error("`{capability}` backend does not support `{operation}`")]
    Unsupported {
        /// Name of the capability interface.
        capability: &'static str,
        /// Name of the operation that was invoked.
        operation: &'static str,
    },

    /// The UI loop is gone, so work handed to it can never complete.
    #[error("the UI dispatcher has shut down")]
    DispatcherClosed,

    /// Configuration could not be parsed.
    #[error("invalid toolkit configuration: {0}")]
    InvalidConfig(String),

    /// A UI loop thread could not be started.
    #[error("failed to spawn UI thread: {0}")]
    ThreadSpawn(String),

    /// The widget was disposed, so it will never get a backend again.
    #[error("{0} widget has been disposed")]
    Disposed(&'static str),

    /// A widget property was given a value it can never hold.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl ToolkitError {
    /// Shorthand used by backends for operations they don't implement.
    pub const fn unsupported(capability: &'static str, operation: &'static str) -> Self {
        Self::Unsupported {
            capability,
            operation,
        }
    }
}

/// Result type for toolkit operations.
pub type ToolkitResult<T> = Result<T, ToolkitError>;
