use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;
use crate::webhook::WebhookEndpoint;

const SCHEMA_JSON: &str = include_str!("../../../../schema/config-v1.json");

/// Token variable consulted when the config names no token source.
pub const AUTH_TOKEN_ENV_VAR: &str = "WEBHOOK_AUTH_TOKEN";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

/// Applies the deployment environment on top of a loaded config:
/// `ANALYZE_WEBHOOK_URL` and friends replace the file's URLs, and
/// `WEBHOOK_AUTH_TOKEN` supplies the token when the file names no source.
pub fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
    apply_overrides_from(config, |name| std::env::var(name).ok())
}

fn apply_overrides_from<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    for endpoint in WebhookEndpoint::ALL {
        if let Some(url) = lookup(endpoint.env_var()).filter(|u| !u.trim().is_empty()) {
            log::debug!("{} set from {}", endpoint, endpoint.env_var());
            *config.webhooks.url_mut(endpoint) = Some(url.trim().to_string());
        }
    }

    if !config.webhooks.token.is_configured()
        && lookup(AUTH_TOKEN_ENV_VAR).is_some_and(|t| !t.trim().is_empty())
    {
        config.webhooks.token.auth_token_env_var = Some(AUTH_TOKEN_ENV_VAR.to_string());
    }

    validate_config(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    for endpoint in WebhookEndpoint::ALL {
        if let Some(url) = config.webhooks.url(endpoint) {
            validate_http_url(endpoint.as_str(), url)?;
        }
    }
    validate_http_url("publish.fallback_base_url", &config.publish.fallback_base_url)?;

    if config.webhooks.timeout_secs == 0 || config.webhooks.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation {
            message: "Webhook timeouts must be at least one second".to_string(),
        });
    }

    if config.recovery.stale_analysis_secs == Some(0) || config.recovery.sweep_interval_secs == 0 {
        return Err(ConfigError::Validation {
            message: "Recovery intervals must be at least one second".to_string(),
        });
    }

    Ok(())
}

fn validate_http_url(name: &str, url: &str) -> Result<(), ConfigError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| ConfigError::InvalidUrl {
        endpoint: name.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            endpoint: name.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    Ok(())
}
