//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gatekeeper.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gatekeeper.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatekeeperConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Runtime mode. Rate limiting and the `Secure` cookie flag depend on it.
    pub mode: RuntimeMode,

    /// Site origin that receives admitted requests.
    pub downstream: DownstreamConfig,

    /// Static-asset and bot signature tables.
    pub policy: PolicyConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Credential verification and refresh settings.
    pub auth: AuthConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Deployment mode of the running process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    #[default]
    #[serde(alias = "prod")]
    Production,
    #[serde(alias = "dev")]
    Development,
}

impl RuntimeMode {
    pub fn is_production(self) -> bool {
        self == RuntimeMode::Production
    }
}

/// Downstream site configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DownstreamConfig {
    /// Origin of the content site (e.g., "http://127.0.0.1:3000").
    pub site_url: String,
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            site_url: "http://127.0.0.1:3000".to_string(),
        }
    }
}

/// Request classification policy table.
///
/// Signatures are matched as substrings of the lower-cased `User-Agent`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Path suffixes that skip rate limiting and credential checks.
    pub static_extensions: Vec<String>,

    /// Path prefixes never seen by the gatekeeper (API routes, framework assets).
    /// Matched as plain string prefixes, so "/api" also covers "/apiary".
    pub bypass_prefixes: Vec<String>,

    /// Scrapers, AI crawlers and generic HTTP clients. Always rejected.
    pub blocked_signatures: Vec<String>,

    /// Search engines and social-preview fetchers with their own budget.
    pub verified_signatures: Vec<String>,

    /// User agents shorter than this are rejected as suspicious.
    pub min_user_agent_len: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            static_extensions: to_strings(&[
                ".js", ".css", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".ico", ".woff", ".woff2",
                ".ttf", ".eot", ".webp", ".mp4", ".webm",
            ]),
            bypass_prefixes: to_strings(&["/api", "/_next", "/_vercel"]),
            blocked_signatures: to_strings(&[
                "amazonbot",
                "ahrefsbot",
                "semrushbot",
                "dotbot",
                "mj12bot",
                "blexbot",
                "serpstatbot",
                "python-requests",
                "curl/",
                "wget",
                "scrapy",
                "go-http-client",
                "axios/",
                "postman",
                "petalbot",
                "yandexbot",
                "baiduspider",
                "bytespider",
                "claudebot",
                "gptbot",
                "anthropic-ai",
                "cohere-ai",
                "bytedance",
                "meta-externalagent",
                "applebot-extended",
                "ccbot",
                "omgili",
                "dataforseo",
                "zoominfobot",
            ]),
            verified_signatures: to_strings(&[
                "googlebot",
                "bingbot",
                "slurp",
                "duckduckbot",
                "facebookexternalhit",
                "twitterbot",
                "linkedinbot",
            ]),
            min_user_agent_len: 10,
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// A fixed-window budget: `limit` requests per `window_secs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct BudgetConfig {
    pub limit: u32,
    pub window_secs: u64,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Budget for anonymous and unclassified traffic.
    pub anonymous: BudgetConfig,

    /// Budget for verified crawlers.
    pub verified: BudgetConfig,

    /// Distinct-key count above which stale records are swept.
    pub sweep_threshold: usize,

    /// Fraction of the limit at which a single warning is logged per window.
    pub warn_ratio: f64,

    /// Also enforce limits in development mode.
    pub enforce_in_development: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            anonymous: BudgetConfig {
                limit: 60,
                window_secs: 60,
            },
            verified: BudgetConfig {
                limit: 100,
                window_secs: 60,
            },
            sweep_threshold: 1000,
            warn_ratio: 0.9,
            enforce_in_development: false,
        }
    }
}

/// Credential gatekeeper configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Base URL of the token authority (e.g., "https://api.example.com").
    pub authority_url: String,

    /// Path of the refresh endpoint on the authority.
    pub refresh_path: String,

    /// Shared HMAC secret used to verify access tokens.
    pub jwt_secret: String,

    /// Cookie carrying the access token.
    pub access_cookie: String,

    /// Cookie carrying the refresh token.
    pub refresh_cookie: String,

    /// Max-Age of an access cookie minted by the gatekeeper.
    pub access_cookie_max_age_secs: u64,

    /// Deadline for the whole refresh exchange.
    pub refresh_timeout_secs: u64,

    /// Clock skew tolerance when checking `exp`.
    pub leeway_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            authority_url: "http://127.0.0.1:4000".to_string(),
            refresh_path: "/auth/refresh".to_string(),
            jwt_secret: String::new(),
            access_cookie: "accessToken".to_string(),
            refresh_cookie: "refreshToken".to_string(),
            access_cookie_max_age_secs: 15 * 60,
            refresh_timeout_secs: 5,
            leeway_secs: 0,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: GatekeeperConfig = toml::from_str(
            r#"
            mode = "development"

            [auth]
            jwt_secret = "s3cret"
            "#,
        )
        .unwrap();

        assert_eq!(config.mode, RuntimeMode::Development);
        assert_eq!(config.auth.jwt_secret, "s3cret");
        assert_eq!(config.auth.access_cookie, "accessToken");
        assert_eq!(config.rate_limit.anonymous.limit, 60);
        assert_eq!(config.rate_limit.sweep_threshold, 1000);
        assert_eq!(config.policy.min_user_agent_len, 10);
    }

    #[test]
    fn test_budget_override() {
        let config: GatekeeperConfig = toml::from_str(
            r#"
            [rate_limit.verified]
            limit = 30
            window_secs = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.rate_limit.verified, BudgetConfig { limit: 30, window_secs: 10 });
        assert_eq!(config.rate_limit.anonymous.limit, 60);
    }

    #[test]
    fn test_mode_aliases() {
        let config: GatekeeperConfig = toml::from_str(r#"mode = "dev""#).unwrap();
        assert_eq!(config.mode, RuntimeMode::Development);
        assert!(toml::from_str::<GatekeeperConfig>(r#"mode = "staging""#).is_err());
    }
}
