use crate::config::types::{BrokerConfig, Config, OrchestratorConfig, StoreConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_store_config(&config.store)?;
    validate_broker_config(&config.broker)?;
    validate_orchestrator_config(&config.orchestrator)?;
    Ok(())
}

/// Validates index store configuration
fn validate_store_config(config: &StoreConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "store database_path cannot be empty".to_string(),
        ));
    }

    validate_name("crawler_index", &config.crawler_index)?;
    validate_name("crawlstart_index", &config.crawlstart_index)?;

    if config.crawler_index == config.crawlstart_index {
        return Err(ConfigError::Validation(format!(
            "crawler_index and crawlstart_index must differ, both are '{}'",
            config.crawler_index
        )));
    }

    Ok(())
}

/// Validates broker configuration
fn validate_broker_config(config: &BrokerConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "broker database_path cannot be empty".to_string(),
        ));
    }

    validate_name("service", &config.service)?;
    config.sharding()?;

    if config.priority_dimensions.is_empty() {
        return Err(ConfigError::Validation(
            "priority_dimensions must list at least one band".to_string(),
        ));
    }

    if let Some(zero) = config.priority_dimensions.iter().position(|&d| d < 1) {
        return Err(ConfigError::Validation(format!(
            "priority_dimensions[{}] must be >= 1",
            zero
        )));
    }

    let total: u32 = config.priority_dimensions.iter().sum();
    let queues = config.queues();
    if queues.len() != total as usize {
        return Err(ConfigError::Validation(format!(
            "priority_dimensions add up to {} but {} source queues are configured",
            total,
            queues.len()
        )));
    }

    for queue in &queues {
        validate_name("source_queues entry", queue)?;
    }

    Ok(())
}

/// Validates orchestrator configuration
fn validate_orchestrator_config(config: &OrchestratorConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_seeds < 1 || config.max_concurrent_seeds > 64 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_seeds must be between 1 and 64, got {}",
            config.max_concurrent_seeds
        )));
    }

    if config.operation_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "operation_timeout_ms must be >= 100ms, got {}ms",
            config.operation_timeout_ms
        )));
    }

    Ok(())
}

/// Index, service and queue names: non-empty, alphanumeric plus `_` and `-`
fn validate_name(what: &str, name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", what)));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "{} must contain only alphanumeric characters, '_' and '-', got '{}'",
            what, name
        )));
    }

    Ok(())
}
