//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check cross-field requirements (scaler URL when scaling is on)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new("listener.bind_address", "not a socket address"));
    }

    check_http_url(&mut errors, "upstream.provider_url", &config.upstream.provider_url);

    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::new("upstream.timeout_secs", "must be greater than zero"));
    }
    if config.upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("upstream.connect_timeout_secs", "must be greater than zero"));
    }
    if config.upstream.direct_functions && config.upstream.function_port == 0 {
        errors.push(ValidationError::new("upstream.function_port", "must be set in direct mode"));
    }

    if config.scaling.enabled {
        match &config.scaling.scaler_url {
            Some(url) => check_http_url(&mut errors, "scaling.scaler_url", url),
            None => errors.push(ValidationError::new("scaling.scaler_url", "required when scaling is enabled")),
        }
        if config.scaling.timeout_secs == 0 {
            errors.push(ValidationError::new("scaling.timeout_secs", "must be greater than zero"));
        }
    }
    if config.scaling.default_namespace.is_empty() {
        errors.push(ValidationError::new("scaling.default_namespace", "must not be empty"));
    }

    if config.auth.basic_auth_user.is_some() != config.auth.basic_auth_password.is_some() {
        errors.push(ValidationError::new("auth", "basic_auth_user and basic_auth_password must be set together"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new("observability.metrics_address", "not a socket address"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_http_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    match Url::parse(value) {
        Ok(url) if url.scheme() == "http" && url.host_str().is_some() => {}
        Ok(url) => errors.push(ValidationError::new(field, format!("unsupported URL {}", url))),
        Err(e) => errors.push(ValidationError::new(field, e.to_string())),
    }
}
