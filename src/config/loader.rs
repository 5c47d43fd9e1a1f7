//! Configuration loading from disk and environment.
//!
//! Layers, lowest priority first:
//! 1. built-in defaults (`#[serde(default)]` plus the per-class budgets)
//! 2. the TOML file, when one is given
//! 3. `GATEKEEPER_*` environment variables
//!
//! Environment keys map onto the schema with `__` between sections, e.g.
//! `GATEKEEPER_MODE`, `GATEKEEPER_AUTH__JWT_SECRET`,
//! `GATEKEEPER_RATE_LIMIT__ANONYMOUS__LIMIT`. List values come from the file.

use std::path::Path;

use ::config::builder::DefaultState;
use ::config::{ConfigBuilder, Environment, File, FileFormat, Map};
use thiserror::Error;

use crate::config::schema::{GatekeeperConfig, RateLimitConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Prefix of every environment override.
pub const ENV_PREFIX: &str = "GATEKEEPER";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration source error: {0}")]
    Source(#[from] ::config::ConfigError),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load a TOML file, overlay the process environment, and validate.
pub fn load_config(path: &Path) -> Result<GatekeeperConfig, ConfigError> {
    assemble(Some(path), environment(None))
}

/// Defaults plus the process environment, validated. Used when no file is given.
pub fn load_from_env() -> Result<GatekeeperConfig, ConfigError> {
    assemble(None, environment(None))
}

/// Environment source for `GATEKEEPER_*` keys. `vars` replaces the process
/// environment when given.
pub fn environment(vars: Option<Map<String, String>>) -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .source(vars)
}

fn assemble(path: Option<&Path>, env: Environment) -> Result<GatekeeperConfig, ConfigError> {
    let mut builder = budget_defaults(::config::Config::builder())?;
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
    }

    let config: GatekeeperConfig = builder.add_source(env).build()?.try_deserialize()?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Budgets have no per-field serde default (the two classes differ), so a
/// partial override such as `GATEKEEPER_RATE_LIMIT__ANONYMOUS__LIMIT` needs
/// the other field seeded here.
fn budget_defaults(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ::config::ConfigError> {
    let defaults = RateLimitConfig::default();
    builder
        .set_default("rate_limit.anonymous.limit", i64::from(defaults.anonymous.limit))?
        .set_default("rate_limit.anonymous.window_secs", defaults.anonymous.window_secs as i64)?
        .set_default("rate_limit.verified.limit", i64::from(defaults.verified.limit))?
        .set_default("rate_limit.verified.window_secs", defaults.verified.window_secs as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RuntimeMode;
    use std::fs;
    use std::path::PathBuf;

    fn env(pairs: &[(&str, &str)]) -> Environment {
        let vars: Map<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        environment(Some(vars))
    }

    struct TempToml(PathBuf);

    impl TempToml {
        fn new(content: &str) -> Self {
            let path =
                std::env::temp_dir().join(format!("gatekeeper-{}.toml", uuid::Uuid::new_v4()));
            fs::write(&path, content).unwrap();
            Self(path)
        }
    }

    impl Drop for TempToml {
        fn drop(&mut self) {
            let _ = fs::remove_file(&self.0);
        }
    }

    #[test]
    fn test_env_overrides_any_field() {
        let config = assemble(
            None,
            env(&[
                ("GATEKEEPER_MODE", "development"),
                ("GATEKEEPER_AUTH__JWT_SECRET", "from-env"),
                ("GATEKEEPER_AUTH__AUTHORITY_URL", "https://api.example.com"),
                ("GATEKEEPER_RATE_LIMIT__ANONYMOUS__LIMIT", "5"),
                ("GATEKEEPER_RATE_LIMIT__ENFORCE_IN_DEVELOPMENT", "true"),
                ("GATEKEEPER_RATE_LIMIT__WARN_RATIO", "0.8"),
            ]),
        )
        .unwrap();

        assert_eq!(config.mode, RuntimeMode::Development);
        assert_eq!(config.auth.jwt_secret, "from-env");
        assert_eq!(config.auth.authority_url, "https://api.example.com");
        assert_eq!(config.rate_limit.anonymous.limit, 5);
        assert_eq!(config.rate_limit.anonymous.window_secs, 60);
        assert_eq!(config.rate_limit.verified.limit, 100);
        assert!(config.rate_limit.enforce_in_development);
        assert_eq!(config.rate_limit.warn_ratio, 0.8);
        assert_eq!(config.downstream.site_url, "http://127.0.0.1:3000");
    }

    #[test]
    fn test_env_wins_over_file() {
        let file = TempToml::new(
            "mode = \"development\"\n[auth]\njwt_secret = \"from-file\"\n[rate_limit.verified]\nlimit = 7\n",
        );

        let config = assemble(
            Some(&file.0),
            env(&[("GATEKEEPER_AUTH__JWT_SECRET", "from-env")]),
        )
        .unwrap();

        assert_eq!(config.mode, RuntimeMode::Development);
        assert_eq!(config.auth.jwt_secret, "from-env");
        assert_eq!(config.rate_limit.verified.limit, 7);
        assert_eq!(config.rate_limit.verified.window_secs, 60);
    }

    #[test]
    fn test_bad_mode_rejected() {
        let result = assemble(
            None,
            env(&[("GATEKEEPER_MODE", "staging"), ("GATEKEEPER_AUTH__JWT_SECRET", "s")]),
        );
        assert!(matches!(result, Err(ConfigError::Source(_))));
    }

    #[test]
    fn test_load_reports_validation() {
        let file = TempToml::new("[rate_limit.anonymous]\nlimit = 0\nwindow_secs = 60\n");

        match assemble(Some(&file.0), env(&[])) {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.field == "rate_limit.anonymous.limit"));
                assert!(errors.iter().any(|e| e.field == "auth.jwt_secret"));
            }
            other => panic!("expected validation error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_missing_file_is_source_error() {
        let result = assemble(Some(Path::new("/definitely/not/here.toml")), env(&[]));
        assert!(matches!(result, Err(ConfigError::Source(_))));
    }
}
