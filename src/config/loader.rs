//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Env var whose presence turns on per-request upstream URL logging.
pub const WRITE_REQUEST_URI_ENV: &str = "write_request_uri";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GatewayConfig = toml::from_str(&content)?;
    finalize(config)
}

/// Apply environment overrides, then validate.
fn finalize(mut config: GatewayConfig) -> Result<GatewayConfig, ConfigError> {
    apply_env_overrides(&mut config, |name| std::env::var_os(name).is_some());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn apply_env_overrides(config: &mut GatewayConfig, is_set: impl Fn(&str) -> bool) {
    if is_set(WRITE_REQUEST_URI_ENV) {
        config.upstream.log_upstream_uri = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_request_uri_presence_enables_logging() {
        let mut config = GatewayConfig::default();
        apply_env_overrides(&mut config, |_| false);
        assert!(!config.upstream.log_upstream_uri);

        apply_env_overrides(&mut config, |name| name == WRITE_REQUEST_URI_ENV);
        assert!(config.upstream.log_upstream_uri);
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("faas-gateway-test-{}.toml", std::process::id()));
        fs::write(
            &path,
            r#"
            [listener]
            bind_address = "127.0.0.1:18080"

            [upstream]
            provider_url = "http://provider:8081"
            timeout_secs = 10

            [scaling]
            enabled = false
            "#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:18080");
        assert_eq!(config.upstream.timeout_secs, 10);
        assert!(!config.scaling.enabled);

        fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn test_validation_error_message() {
        let err = finalize(GatewayConfig::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: scaling.scaler_url: required when scaling is enabled"
        );
    }
}
