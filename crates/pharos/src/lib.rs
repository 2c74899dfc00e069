//! # Pharos
//!
//! A webhook-driven bot framework for the QQ bot open platform.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────┐     ┌──────────┐     ┌──────────────────────┐
//! │   Platform   │────▶│ Webhook handler  │────▶│ LocalBus │────▶│ Module "echo"        │
//! │ (HTTP POST)  │◀────│ (op 13 / op 0)   │     │          │────▶│ Module "robot"       │
//! └──────────────┘     └──────────────────┘     └──────────┘────▶│ Module ...           │
//!                                                                 └──────────────────────┘
//! ```
//!
//! - **Webhook**: answers the Ed25519 validation challenge and maps dispatch
//!   payloads to typed events
//! - **Bus**: delivers each event to matching listeners by priority
//! - **Beacon**: loads modules on demand; a module's listeners live and die
//!   with it
//! - **Runtime**: configuration, logging and the server lifecycle
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pharos::prelude::*;
//!
//! async fn ping() {
//!     tracing::info!("pong");
//! }
//!
//! fn setup() -> Result<(), BoxError> {
//!     listen([EventKind::C2CMessage])
//!         .matcher(Matcher::keyword("ping"))
//!         .handle(ping)?;
//!     Ok(())
//! }
//!
//! pharos::module!(PING, "ping", setup);
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Pharos::load()?.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: load `pharos.toml` (default)
//! - `yaml-config`: load `pharos.yaml`
//! - `json-log`: JSON log lines

pub use pharos_core as core;
pub use pharos_framework as framework;
pub use pharos_runtime as runtime;
pub use pharos_webhook as webhook;

pub use pharos_framework::module;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use pharos::prelude::*;
/// ```
pub mod prelude {
    // Application
    pub use pharos_runtime::{Pharos, PharosConfig};

    // Module authoring
    pub use pharos_framework::prelude::*;

    // Notice events not covered by the framework prelude
    pub use pharos_core::{
        C2CAllowBotProactiveMessage, C2CRejectBotProactiveMessage, FriendAdd, FriendDel,
        GroupAddRobot, GroupAllowBotProactiveMessage, GroupDelRobot,
        GroupRejectBotProactiveMessage,
    };
}
