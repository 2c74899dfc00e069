//! Error types for webhook ingress.

use thiserror::Error;

use pharos_framework::BusError;

/// Errors from deriving or using the handshake key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// The bot secret cannot seed an Ed25519 key.
    #[error("bot secret is {len} bytes, at least {min} are required", min = crate::sign::SEED_LEN)]
    SecretTooShort { len: usize },

    /// A signature was not valid hex or had the wrong length.
    #[error("malformed signature: {0}")]
    Malformed(String),

    /// The signature does not match the message.
    #[error("signature verification failed")]
    Mismatch,
}

/// Errors while turning an envelope into an event.
///
/// None of these reach the platform; the handler logs them and still answers
/// `200`.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("invalid envelope: {0}")]
    Envelope(#[from] serde_json::Error),

    #[error("invalid timestamp: {0}")]
    Timestamp(String),

    #[error(transparent)]
    Publish(#[from] BusError),
}

/// Result type for webhook operations.
pub type WebhookResult<T> = Result<T, WebhookError>;
