//! Configuration validation utilities.

use std::collections::HashSet;

use pharos_webhook::sign::SEED_LEN;

use super::error::{ConfigError, ConfigResult};
use super::schema::{
    BotConfig, LogFormat, LogOutput, LoggingConfig, PharosConfig, WebhookServerConfig,
};

/// Validates the entire configuration.
pub fn validate_config(config: &PharosConfig) -> ConfigResult<()> {
    validate_bot_config(&config.bot)?;
    validate_webhook_config(&config.webhook)?;
    validate_logging_config(&config.logging)?;
    validate_modules(&config.modules)?;
    Ok(())
}

fn validate_bot_config(bot: &BotConfig) -> ConfigResult<()> {
    if bot.appid.is_empty() {
        return Err(ConfigError::missing_field("bot.appid"));
    }

    if bot.secret.is_empty() {
        return Err(ConfigError::missing_field("bot.secret"));
    }

    if bot.secret.len() < SEED_LEN {
        return Err(ConfigError::validation(format!(
            "bot.secret must be at least {SEED_LEN} bytes, got {}",
            bot.secret.len()
        )));
    }

    Ok(())
}

fn validate_webhook_config(webhook: &WebhookServerConfig) -> ConfigResult<()> {
    if webhook.host.is_empty() {
        return Err(ConfigError::missing_field("webhook.host"));
    }

    if !webhook.path.starts_with('/') {
        return Err(ConfigError::validation("webhook.path must start with '/'"));
    }

    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.format == LogFormat::Json && !cfg!(feature = "json-log") {
        return Err(ConfigError::validation(
            "logging.format = \"json\" requires the json-log feature",
        ));
    }

    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    Ok(())
}

fn validate_modules(modules: &[String]) -> ConfigResult<()> {
    let mut seen = HashSet::new();
    for module in modules {
        if module.trim().is_empty() {
            return Err(ConfigError::validation("Module names cannot be empty"));
        }
        if !seen.insert(module) {
            return Err(ConfigError::validation(format!(
                "Module listed twice: {module}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> PharosConfig {
        PharosConfig {
            bot: BotConfig {
                appid: "102000000".into(),
                secret: "0123456789abcdef0123456789abcdef".into(),
                sandbox: false,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_validate_missing_credentials() {
        let config = PharosConfig::default();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { field }) if field == "bot.appid"
        ));
    }

    #[test]
    fn test_validate_short_secret() {
        let mut config = valid();
        config.bot.secret = "short".into();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_validate_path_and_modules() {
        let mut config = valid();
        config.webhook.path = "postevent".into();
        assert!(validate_config(&config).is_err());

        let mut config = valid();
        config.modules = vec!["echo".into(), "echo".into()];
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_file_output_needs_path() {
        let mut config = valid();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());

        config.logging.file_path = Some("logs/pharos.log".into());
        assert!(validate_config(&config).is_ok());
    }
}
