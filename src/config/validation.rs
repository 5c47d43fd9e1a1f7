//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits, windows and timeouts > 0)
//! - Check that URLs parse and the signature tables are well formed
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatekeeperConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{BudgetConfig, GatekeeperConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration, collecting every error found.
pub fn validate_config(config: &GatekeeperConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    check_url(&mut errors, "downstream.site_url", &config.downstream.site_url);
    check_url(&mut errors, "auth.authority_url", &config.auth.authority_url);

    // The forwarding client speaks plain HTTP to the site on the private network.
    if config.downstream.site_url.starts_with("https:") {
        errors.push(ValidationError::new("downstream.site_url", "must use http"));
    }

    if !config.auth.refresh_path.starts_with('/') {
        errors.push(ValidationError::new("auth.refresh_path", "must start with '/'"));
    }
    if config.auth.jwt_secret.is_empty() {
        errors.push(ValidationError::new(
            "auth.jwt_secret",
            "must be set (or supplied via GATEKEEPER_AUTH__JWT_SECRET)",
        ));
    }
    if config.auth.access_cookie.is_empty() || config.auth.refresh_cookie.is_empty() {
        errors.push(ValidationError::new("auth", "cookie names must not be empty"));
    } else if config.auth.access_cookie == config.auth.refresh_cookie {
        errors.push(ValidationError::new("auth", "access and refresh cookie names must differ"));
    }
    if config.auth.refresh_timeout_secs == 0 {
        errors.push(ValidationError::new("auth.refresh_timeout_secs", "must be greater than 0"));
    }
    if config.auth.access_cookie_max_age_secs == 0 {
        errors.push(ValidationError::new(
            "auth.access_cookie_max_age_secs",
            "must be greater than 0",
        ));
    }

    check_budget(&mut errors, "rate_limit.anonymous", &config.rate_limit.anonymous);
    check_budget(&mut errors, "rate_limit.verified", &config.rate_limit.verified);

    if config.rate_limit.sweep_threshold == 0 {
        errors.push(ValidationError::new("rate_limit.sweep_threshold", "must be greater than 0"));
    }
    let ratio = config.rate_limit.warn_ratio;
    if !(ratio > 0.0 && ratio <= 1.0) {
        errors.push(ValidationError::new("rate_limit.warn_ratio", "must be in (0, 1]"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    for ext in &config.policy.static_extensions {
        if !ext.starts_with('.') || ext.len() < 2 {
            errors.push(ValidationError::new(
                "policy.static_extensions",
                format!("'{}' must look like '.ext'", ext),
            ));
        }
    }

    for prefix in &config.policy.bypass_prefixes {
        if !prefix.starts_with('/') || prefix.len() < 2 {
            errors.push(ValidationError::new(
                "policy.bypass_prefixes",
                format!("'{}' must look like '/segment'", prefix),
            ));
        }
    }

    check_signatures(&mut errors, "policy.blocked_signatures", &config.policy.blocked_signatures);
    check_signatures(&mut errors, "policy.verified_signatures", &config.policy.verified_signatures);

    let blocked: HashSet<&str> = config.policy.blocked_signatures.iter().map(String::as_str).collect();
    for sig in &config.policy.verified_signatures {
        if blocked.contains(sig.as_str()) {
            errors.push(ValidationError::new(
                "policy.verified_signatures",
                format!("'{}' is also a blocked signature", sig),
            ));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("'{}': {}", value, e))),
    }
}

fn check_budget(errors: &mut Vec<ValidationError>, field: &str, budget: &BudgetConfig) {
    if budget.limit == 0 {
        errors.push(ValidationError::new(format!("{}.limit", field), "must be greater than 0"));
    }
    if budget.window_secs == 0 {
        errors.push(ValidationError::new(
            format!("{}.window_secs", field),
            "must be greater than 0",
        ));
    }
}

fn check_signatures(errors: &mut Vec<ValidationError>, field: &str, signatures: &[String]) {
    for sig in signatures {
        if sig.is_empty() {
            errors.push(ValidationError::new(field, "empty signature matches every user agent"));
        } else if sig.chars().any(|c| c.is_uppercase()) {
            errors.push(ValidationError::new(field, format!("'{}' must be lower-case", sig)));
        }
    }
}
