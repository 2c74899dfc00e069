//! Error types for the Pharos framework.

use thiserror::Error;

use crate::beacon::CubeId;

pub use tower::BoxError;

/// Returned when a listener must not run for the current event.
///
/// Produced by a [`Matcher`](crate::matcher::Matcher) that did not match or
/// by an extractor that could not find its value. The bus recognises this
/// error and silently skips the listener; all other errors are treated as
/// genuine failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("listener skipped for this event")]
pub struct ListenerSkipped;

/// Errors that can occur during context extraction.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// The event type does not match the expected type.
    #[error("event type mismatch: expected '{expected}', got '{got}'")]
    EventTypeMismatch {
        /// Expected type name.
        expected: &'static str,
        /// Actual event name.
        got: &'static str,
    },

    /// Nothing in the context provides a value of this type.
    #[error("no value of type '{0}' in the dispatch context")]
    MissingValue(&'static str),

    /// Nothing in the context is bound to this name.
    #[error("no value named '{0}' in the dispatch context")]
    MissingName(&'static str),
}

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Errors raised by the module registry.
#[derive(Debug, Error)]
pub enum BeaconError {
    /// No module descriptor is registered under this name.
    #[error("module not found: '{0}'")]
    ModuleNotFound(String),

    /// A module's setup required a module that is still loading.
    #[error("circular require: module '{0}' is already loading")]
    CircularRequire(String),

    /// A listener, export or metadata was declared outside a module load.
    #[error("no active module context; declarations must run inside a module's setup")]
    NoActiveModuleContext,

    /// `require` was called with no module loading and no global beacon set.
    #[error("no beacon available; install one with Beacon::set_global")]
    NoBeacon,

    /// The module's setup function returned an error.
    #[error("setup of module '{module}' failed: {source}")]
    Setup {
        module: String,
        #[source]
        source: BoxError,
    },

    /// A behaviour refused to allocate one of the module's listeners.
    #[error("behaviour '{behaviour}' failed to allocate {cube} of module '{module}': {source}")]
    Allocate {
        module: String,
        behaviour: String,
        cube: CubeId,
        #[source]
        source: BoxError,
    },
}

impl BeaconError {
    pub(crate) fn setup(module: impl Into<String>, source: BoxError) -> Self {
        Self::Setup {
            module: module.into(),
            source,
        }
    }
}

/// Result type for module registry operations.
pub type BeaconResult<T> = Result<T, BeaconError>;

/// Errors raised by an [`EventBus`](crate::bus::EventBus).
#[derive(Debug, Clone, Error)]
pub enum BusError {
    /// The bus no longer accepts events.
    #[error("event bus is closed")]
    Closed,
}
