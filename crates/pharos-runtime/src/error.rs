//! Runtime error types.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while bootstrapping or running the application.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The webhook signing key could not be derived.
    #[error("Webhook signer: {0}")]
    Signature(#[from] pharos_webhook::SignatureError),

    /// Binding the webhook server failed.
    #[error("Failed to start webhook server on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The event bus refused an event.
    #[error(transparent)]
    Bus(#[from] pharos_framework::BusError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
