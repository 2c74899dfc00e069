//! Pharos Runtime - bootstrap layer for the Pharos bot framework.
//!
//! This crate provides:
//! - Layered configuration (`PharosConfig`, `ConfigLoader`)
//! - Logging setup (`LoggingBuilder`)
//! - The application itself (`Pharos`): bus, module registry and webhook
//!   server wired from one configuration
//!
//! ```ignore
//! use pharos_runtime::Pharos;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let app = Pharos::builder().config_file("pharos.toml").build()?;
//!
//!     // Loads modules, serves the webhook, runs until Ctrl+C
//!     app.run().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Configuration Sources
//!
//! Later sources win:
//!
//! 1. Built-in defaults
//! 2. Values merged with [`PharosBuilder::merge`]
//! 3. `pharos.toml` (or the file given to [`PharosBuilder::config_file`])
//! 4. `pharos.{profile}.toml` from the same search path (searched files only)
//! 5. `PHAROS_*` environment variables, nested with `__`
//!    (`PHAROS_WEBHOOK__PORT=8080`)

pub mod app;
pub mod config;
pub mod error;
pub mod logging;

// Re-exports
pub use app::{Pharos, PharosBuilder, wait_for_shutdown};
pub use config::{
    BotConfig, ConfigError, ConfigLoader, ConfigResult, PharosConfig, WebhookServerConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};

pub use tracing;
