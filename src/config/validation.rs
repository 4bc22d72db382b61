use crate::config::types::{Config, DiscoveryConfig, PolitenessConfig, UserAgentConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_politeness_config(&config.politeness)?;
    validate_discovery_config(&config.discovery)?;
    validate_user_agent_config(&config.user_agent)?;
    Ok(())
}

/// Validates request pacing and backoff settings
fn validate_politeness_config(config: &PolitenessConfig) -> Result<(), ConfigError> {
    if !(config.rate.is_finite() && config.rate > 0.0) {
        return Err(ConfigError::Validation(format!(
            "rate must be a positive number of requests per second, got {}",
            config.rate
        )));
    }

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    if !(config.blocked_retry_multiplier.is_finite() && config.blocked_retry_multiplier >= 1.0) {
        return Err(ConfigError::Validation(format!(
            "blocked-retry-multiplier must be >= 1.0, got {}",
            config.blocked_retry_multiplier
        )));
    }

    if !(config.backoff_base_secs.is_finite() && config.backoff_base_secs > 0.0) {
        return Err(ConfigError::Validation(format!(
            "backoff-base-secs must be > 0, got {}",
            config.backoff_base_secs
        )));
    }

    if !config.backoff_cap_secs.is_finite() || config.backoff_cap_secs < config.backoff_base_secs
    {
        return Err(ConfigError::Validation(format!(
            "backoff-cap-secs ({}) must be >= backoff-base-secs ({})",
            config.backoff_cap_secs, config.backoff_base_secs
        )));
    }

    if config.session_cooldown_min_secs > config.session_cooldown_max_secs {
        return Err(ConfigError::Validation(format!(
            "session-cooldown-min-secs ({}) must be <= session-cooldown-max-secs ({})",
            config.session_cooldown_min_secs, config.session_cooldown_max_secs
        )));
    }

    if config.session_limit_secs == 0 {
        return Err(ConfigError::Validation(
            "session-limit-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates discovery settings
fn validate_discovery_config(config: &DiscoveryConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(
            "max-pages must be >= 1".to_string(),
        ));
    }

    if config.worker_pool_width < 1 || config.worker_pool_width > 64 {
        return Err(ConfigError::Validation(format!(
            "worker-pool-width must be between 1 and 64, got {}",
            config.worker_pool_width
        )));
    }

    if config.description_length < 1 {
        return Err(ConfigError::Validation(
            "description-length must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates the identity pool
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.identities.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent identities cannot be empty".to_string(),
        ));
    }

    if let Some(blank) = config.identities.iter().position(|id| id.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "user-agent identity #{} is blank",
            blank + 1
        )));
    }

    Ok(())
}
