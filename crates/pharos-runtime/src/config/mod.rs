//! Configuration for the Pharos runtime.
//!
//! Layered loading through figment ([`ConfigLoader`]), the schema rooted at
//! [`PharosConfig`] and [`validate_config`].

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    BotConfig, DebugConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig,
    PharosConfig, SpanEventConfig, WebhookServerConfig,
};
pub use validation::validate_config;
