// SPDX-FileCopyrightText: 2026 Belfry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that run after deserialization: constraints serde
//! cannot express, like the ordering between the two coalescing delays
//! or a channel capacity that must not be zero.

use crate::diagnostic::ConfigError;
use crate::model::BelfryConfig;

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Check every semantic constraint, collecting all failures rather than
/// stopping at the first.
pub fn validate_config(config: &BelfryConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // The remote-activity delay lengthens coalescing, so it must not be
    // shorter than the base delay.
    if config.engine.remote_activity_delay_ms < config.engine.coalesce_delay_ms {
        errors.push(ConfigError::Validation {
            message: format!(
                "engine.remote_activity_delay_ms ({}) must be at least engine.coalesce_delay_ms ({})",
                config.engine.remote_activity_delay_ms, config.engine.coalesce_delay_ms
            ),
        });
    }

    if config.engine.remote_activity_window_secs <= 0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "engine.remote_activity_window_secs must be positive, got {}",
                config.engine.remote_activity_window_secs
            ),
        });
    }

    if config.engine.max_grouped < 1 {
        errors.push(ConfigError::Validation {
            message: "engine.max_grouped must be at least 1".to_string(),
        });
    }

    if config.engine.preview_lines < 1 {
        errors.push(ConfigError::Validation {
            message: "engine.preview_lines must be at least 1".to_string(),
        });
    }

    if config.engine.channel_capacity == 0 {
        errors.push(ConfigError::Validation {
            message: "engine.channel_capacity must be positive".to_string(),
        });
    }

    // A zero alert cap disables throttling entirely, in which case the
    // window length is ignored and may be anything.
    if config.throttle.max_alerts_per_window > 0 && config.throttle.window_seconds <= 0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "throttle.window_seconds must be positive when throttling is enabled, got {}",
                config.throttle.window_seconds
            ),
        });
    }

    if !VALID_LOG_LEVELS.contains(&config.log.level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "log.level must be one of {}, got `{}`",
                VALID_LOG_LEVELS.join(", "),
                config.log.level
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = BelfryConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn remote_delay_shorter_than_coalesce_fails_validation() {
        let mut config = BelfryConfig::default();
        config.engine.coalesce_delay_ms = 2000;
        config.engine.remote_activity_delay_ms = 500;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("remote_activity_delay_ms"))));
    }

    #[test]
    fn zero_max_grouped_fails_validation() {
        let mut config = BelfryConfig::default();
        config.engine.max_grouped = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("max_grouped"))));
    }

    #[test]
    fn zero_channel_capacity_fails_validation() {
        let mut config = BelfryConfig::default();
        config.engine.channel_capacity = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("channel_capacity"))));
    }

    #[test]
    fn throttle_disabled_ignores_window() {
        let mut config = BelfryConfig::default();
        config.throttle.max_alerts_per_window = 0;
        config.throttle.window_seconds = 0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn throttle_enabled_requires_positive_window() {
        let mut config = BelfryConfig::default();
        config.throttle.max_alerts_per_window = 2;
        config.throttle.window_seconds = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("window_seconds"))));
    }

    #[test]
    fn bogus_log_level_fails_validation() {
        let mut config = BelfryConfig::default();
        config.log.level = "verbose".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("log.level"))));
    }

    #[test]
    fn multiple_errors_collected() {
        let mut config = BelfryConfig::default();
        config.engine.max_grouped = 0;
        config.engine.channel_capacity = 0;
        config.log.level = "loud".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
