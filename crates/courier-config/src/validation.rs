// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes. Collects all failures instead of failing fast.

use crate::diagnostic::ConfigError;
use crate::model::CourierConfig;

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &CourierConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("server.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if config.server.port == 0 {
        errors.push(ConfigError::Validation {
            message: "server.port must be non-zero".to_string(),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.sessions.data_dir.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "sessions.data_dir must not be empty".to_string(),
        });
    }

    if config.sessions.qr_ttl_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "sessions.qr_ttl_secs must be at least 1".to_string(),
        });
    }

    for (key, url) in [
        ("providers.whatsapp_bridge_url", &config.providers.whatsapp_bridge_url),
        ("providers.telegram_bridge_url", &config.providers.telegram_bridge_url),
    ] {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            errors.push(ConfigError::Validation {
                message: format!("{key} `{url}` must start with http:// or https://"),
            });
        }
    }

    for origin in &config.server.allowed_origins {
        if !origin.starts_with("http://") && !origin.starts_with("https://") {
            errors.push(ConfigError::Validation {
                message: format!(
                    "server.allowed_origins entry `{origin}` must start with http:// or https://"
                ),
            });
        }
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
        assert!(validate_config(&CourierConfig::default()).is_ok());
    }

    #[test]
    fn empty_host_is_rejected() {
        let mut config = CourierConfig::default();
        config.server.host = "  ".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.to_string().contains("server.host")));
    }

    #[test]
    fn zero_qr_ttl_is_rejected() {
        let mut config = CourierConfig::default();
        config.sessions.qr_ttl_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn bare_origin_is_rejected() {
        let mut config = CourierConfig::default();
        config.server.allowed_origins = vec!["dashboard.example.com".into()];
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn non_http_bridge_url_is_rejected() {
        let mut config = CourierConfig::default();
        config.providers.whatsapp_bridge_url = "localhost:3001".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.to_string().contains("whatsapp_bridge_url")));
    }

    #[test]
    fn collects_multiple_errors() {
        let mut config = CourierConfig::default();
        config.server.port = 0;
        config.storage.database_path = String::new();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
