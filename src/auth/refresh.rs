//! Refresh exchange against the token authority.
//!
//! One `POST <authority><refresh_path>` per call, carrying only the refresh
//! cookie. Never retried. Every failure, including a timeout, is folded into a
//! [`RefreshOutcome`] so the caller only has to enumerate three cases.

use std::time::Duration;

use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderValue, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::auth::cookies;
use crate::config::{AuthConfig, RuntimeMode};

/// New credentials to hand back to the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Renewal {
    /// `Set-Cookie` values for the outgoing response, in order.
    pub set_cookies: Vec<HeaderValue>,
    /// The new access token, when it could be learned.
    pub access_token: Option<String>,
}

/// Result of one refresh attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Renewed(Renewal),
    Denied,
    UpstreamUnavailable,
}

impl RefreshOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RefreshOutcome::Renewed(_) => "renewed",
            RefreshOutcome::Denied => "denied",
            RefreshOutcome::UpstreamUnavailable => "unavailable",
        }
    }
}

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("authority unreachable: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("authority did not answer within {0:?}")]
    Timeout(Duration),

    #[error("authority rejected refresh with {0}")]
    Rejected(StatusCode),

    #[error("authority response unreadable: {0}")]
    Body(#[source] reqwest::Error),

    #[error("authority response carried no access token")]
    MissingToken,

    #[error("access token is not a valid cookie value")]
    InvalidCookie,
}

impl RefreshError {
    fn outcome(&self) -> RefreshOutcome {
        match self {
            RefreshError::Transport(_) | RefreshError::Timeout(_) => {
                RefreshOutcome::UpstreamUnavailable
            }
            RefreshError::Rejected(_)
            | RefreshError::Body(_)
            | RefreshError::MissingToken
            | RefreshError::InvalidCookie => RefreshOutcome::Denied,
        }
    }
}

#[derive(Debug, Error)]
pub enum RefreshClientError {
    #[error("invalid refresh endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct RefreshBody {
    #[serde(rename = "accessToken")]
    access_token: Option<String>,
}

/// HTTP client for the authority's refresh endpoint.
#[derive(Clone)]
pub struct RefreshClient {
    http: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
    access_cookie: String,
    refresh_cookie: String,
    access_max_age_secs: u64,
    secure_cookies: bool,
}

impl RefreshClient {
    pub fn new(config: &AuthConfig, mode: RuntimeMode) -> Result<Self, RefreshClientError> {
        let endpoint = Url::parse(&format!(
            "{}{}",
            config.authority_url.trim_end_matches('/'),
            config.refresh_path
        ))?;
        let timeout = Duration::from_secs(config.refresh_timeout_secs);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .no_proxy()
            .build()?;

        Ok(Self {
            http,
            endpoint,
            timeout,
            access_cookie: config.access_cookie.clone(),
            refresh_cookie: config.refresh_cookie.clone(),
            access_max_age_secs: config.access_cookie_max_age_secs,
            secure_cookies: mode.is_production(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Attempt exactly one refresh. Never fails; see [`RefreshOutcome`].
    pub async fn exchange(&self, refresh_token: &str) -> RefreshOutcome {
        let result = match tokio::time::timeout(self.timeout, self.try_exchange(refresh_token)).await {
            Ok(result) => result,
            Err(_) => Err(RefreshError::Timeout(self.timeout)),
        };

        match result {
            Ok(renewal) => {
                tracing::debug!(
                    cookies = renewal.set_cookies.len(),
                    "Access token renewed"
                );
                RefreshOutcome::Renewed(renewal)
            }
            Err(e) => {
                let outcome = e.outcome();
                tracing::info!(error = %e, outcome = outcome.label(), "Token refresh failed");
                outcome
            }
        }
    }

    async fn try_exchange(&self, refresh_token: &str) -> Result<Renewal, RefreshError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(COOKIE, format!("{}={}", self.refresh_cookie, refresh_token))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RefreshError::Timeout(self.timeout)
                } else {
                    RefreshError::Transport(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RefreshError::Rejected(status));
        }

        let set_cookies: Vec<HeaderValue> =
            response.headers().get_all(SET_COOKIE).iter().cloned().collect();
        if !set_cookies.is_empty() {
            // The authority owns the cookie attributes; forward verbatim.
            let access_token = set_cookies
                .iter()
                .find_map(|v| cookies::value_from_set_cookie(v, &self.access_cookie));
            return Ok(Renewal {
                set_cookies,
                access_token,
            });
        }

        let body: RefreshBody = response.json().await.map_err(|e| {
            if e.is_timeout() {
                RefreshError::Timeout(self.timeout)
            } else {
                RefreshError::Body(e)
            }
        })?;
        let token = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(RefreshError::MissingToken)?;
        let cookie = cookies::access_cookie(
            &self.access_cookie,
            &token,
            self.access_max_age_secs,
            self.secure_cookies,
        )
        .map_err(|_| RefreshError::InvalidCookie)?;

        Ok(Renewal {
            set_cookies: vec![cookie],
            access_token: Some(token),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_path() {
        let mut config = AuthConfig::default();
        config.authority_url = "https://api.example.com/v1/".into();
        let client = RefreshClient::new(&config, RuntimeMode::Production).unwrap();
        assert_eq!(client.endpoint().as_str(), "https://api.example.com/v1/auth/refresh");
    }

    #[test]
    fn test_error_classification() {
        assert_eq!(
            RefreshError::Timeout(Duration::from_secs(1)).outcome(),
            RefreshOutcome::UpstreamUnavailable
        );
        assert_eq!(
            RefreshError::Rejected(StatusCode::UNAUTHORIZED).outcome(),
            RefreshOutcome::Denied
        );
        assert_eq!(RefreshError::MissingToken.outcome(), RefreshOutcome::Denied);
    }
}
