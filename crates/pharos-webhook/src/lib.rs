//! # Pharos Webhook
//!
//! Receives the platform's webhook callbacks:
//!
//! - `op = 13` validation requests are answered with an Ed25519 signature
//!   made with a key derived from the bot secret ([`sign`])
//! - `op = 0` dispatches are parsed ([`payload`]), turned into typed events
//!   through [`EVENT_TABLE`](mapping::EVENT_TABLE) and published on an
//!   [`EventBus`](pharos_framework::EventBus)
//!
//! [`WebhookHandler`] does not depend on any HTTP stack. With the
//! `http-server` feature (default) [`server`] mounts it on an axum router.

pub mod error;
pub mod handler;
pub mod mapping;
pub mod payload;
#[cfg(feature = "http-server")]
pub mod server;
pub mod sign;

pub use error::{SignatureError, WebhookError, WebhookResult};
pub use handler::{WebhookDebugConfig, WebhookHandler, WebhookResponse};
pub use mapping::{EVENT_TABLE, EventFlow, EventRoute, route};
pub use payload::{Challenge, EventData, Payload};
#[cfg(feature = "http-server")]
pub use server::{ServerHandle, router, serve};
pub use sign::{ChallengeSigner, public_key, verify_challenge};
