//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{InteractionConfig, LogOutput, LoggingConfig, RouterConfig, SigilConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &SigilConfig) -> ConfigResult<()> {
    validate_router_config(&config.router)?;
    validate_interaction_config(&config.interaction)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

/// Validates the router section.
fn validate_router_config(router: &RouterConfig) -> ConfigResult<()> {
    if router.prefixes.is_empty() {
        return Err(ConfigError::missing_field("router.prefixes"));
    }

    if router.prefixes.iter().any(String::is_empty) {
        return Err(ConfigError::validation("Prefixes cannot be empty strings"));
    }

    if router.workers == 0 {
        return Err(ConfigError::validation("Worker count must be at least 1"));
    }

    if router.queue_capacity == 0 {
        return Err(ConfigError::validation(
            "Queue capacity must be greater than 0",
        ));
    }

    Ok(())
}

/// Validates the interaction section.
fn validate_interaction_config(interaction: &InteractionConfig) -> ConfigResult<()> {
    if interaction.max_entries == Some(0) {
        return Err(ConfigError::validation(
            "interaction.max_entries must be greater than 0 when set",
        ));
    }
    if interaction.ttl_secs == Some(0) {
        return Err(ConfigError::validation(
            "interaction.ttl_secs must be greater than 0 when set",
        ));
    }
    Ok(())
}

/// Validates the logging section.
fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    if let Some(module) = logging.filters.keys().find(|m| m.trim().is_empty()) {
        return Err(ConfigError::validation(format!(
            "Invalid log filter module name: {module:?}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&SigilConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_router() {
        let mut config = SigilConfig::default();
        config.router.prefixes.clear();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { .. })
        ));

        let mut config = SigilConfig::default();
        config.router.prefixes.push(String::new());
        assert!(validate_config(&config).is_err());

        let mut config = SigilConfig::default();
        config.router.workers = 0;
        assert!(validate_config(&config).is_err());

        let mut config = SigilConfig::default();
        config.router.queue_capacity = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_interaction() {
        let mut config = SigilConfig::default();
        config.interaction.max_entries = Some(0);
        assert!(validate_config(&config).is_err());

        let mut config = SigilConfig::default();
        config.interaction.ttl_secs = Some(0);
        assert!(validate_config(&config).is_err());

        config.interaction.ttl_secs = Some(300);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_file_output_needs_path() {
        let mut config = SigilConfig::default();
        config.logging.output = LogOutput::File;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { field }) if field == "logging.file_path"
        ));

        config.logging.file_path = Some("sigil.log".into());
        assert!(validate_config(&config).is_ok());
    }
}
