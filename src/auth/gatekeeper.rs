//! Credential gatekeeper.
//!
//! Keeps the access cookie valid across requests without ever failing the
//! request itself. The state is computed per request and never persisted.
//!
//! ```text
//! NoCredentials                   → proceed, no mutation (no access cookie)
//! AccessValid                     → proceed, no mutation
//! AccessInvalidRefreshAbsent      → proceed anonymous, no mutation
//! AccessInvalidRefreshPresent     → one refresh exchange
//!     Renewed                     → set new cookie(s), proceed
//!     Denied | UpstreamUnavailable → clear both cookies, proceed anonymous
//! ```

use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue};

use crate::auth::cookies;
use crate::auth::refresh::{RefreshClient, RefreshClientError, RefreshOutcome};
use crate::auth::token::{AccessClaims, TokenError, TokenVerifier};
use crate::config::{AuthConfig, RuntimeMode};
use crate::observability::metrics;

/// Where a request's credentials stand before any refresh.
#[derive(Debug, Clone, PartialEq)]
pub enum CredentialState {
    NoCredentials,
    AccessValid(AccessClaims),
    AccessInvalidRefreshAbsent,
    AccessInvalidRefreshPresent { refresh_token: String },
}

/// Authentication state handed to the downstream router.
#[derive(Debug, Clone, PartialEq)]
pub enum Session {
    Authenticated(AccessClaims),
    Anonymous,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated(_))
    }
}

/// `Set-Cookie` changes to attach to the outgoing response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieRewrite {
    Keep,
    Renewed(Vec<HeaderValue>),
    Cleared(Vec<HeaderValue>),
}

impl CookieRewrite {
    /// Append to the response; cookies set by the downstream handler survive.
    pub fn apply(&self, headers: &mut HeaderMap) {
        let values = match self {
            CookieRewrite::Keep => return,
            CookieRewrite::Renewed(values) | CookieRewrite::Cleared(values) => values,
        };
        for value in values {
            headers.append(SET_COOKIE, value.clone());
        }
    }
}

/// What the gatekeeper decided for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub session: Session,
    pub rewrite: CookieRewrite,
}

pub struct CredentialGate {
    verifier: TokenVerifier,
    refresher: RefreshClient,
    access_cookie: String,
    refresh_cookie: String,
    clear_cookies: Vec<HeaderValue>,
}

impl CredentialGate {
    pub fn new(config: &AuthConfig, mode: RuntimeMode) -> Result<Self, RefreshClientError> {
        // Cookie names are validated config, so these cannot fail in practice.
        let clear_cookies = [&config.access_cookie, &config.refresh_cookie]
            .into_iter()
            .filter_map(|name| cookies::expired_cookie(name).ok())
            .collect();

        Ok(Self {
            verifier: TokenVerifier::new(&config.jwt_secret, config.leeway_secs),
            refresher: RefreshClient::new(config, mode)?,
            access_cookie: config.access_cookie.clone(),
            refresh_cookie: config.refresh_cookie.clone(),
            clear_cookies,
        })
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    /// Classify the inbound cookies without touching the network.
    ///
    /// Only a present but unusable access cookie can lead to a refresh; a lone
    /// refresh cookie is never exchanged or cleared.
    pub fn inspect(&self, headers: &HeaderMap) -> CredentialState {
        let Some(access) = cookies::read_cookie(headers, &self.access_cookie) else {
            return CredentialState::NoCredentials;
        };

        match self.verifier.verify(&access) {
            Ok(claims) => return CredentialState::AccessValid(claims),
            Err(TokenError::Expired) => tracing::debug!("Access token expired"),
            Err(TokenError::Invalid(reason)) => tracing::debug!(%reason, "Access token rejected"),
        }

        match cookies::read_cookie(headers, &self.refresh_cookie) {
            None => CredentialState::AccessInvalidRefreshAbsent,
            Some(refresh_token) => CredentialState::AccessInvalidRefreshPresent { refresh_token },
        }
    }

    /// Run the state machine, refreshing at most once.
    ///
    /// `request_headers` is rewritten so the downstream handler sees the new
    /// cookie set rather than the inbound one.
    pub async fn resolve(&self, request_headers: &mut HeaderMap) -> Resolution {
        let refresh_token = match self.inspect(request_headers) {
            CredentialState::NoCredentials | CredentialState::AccessInvalidRefreshAbsent => {
                return Resolution {
                    session: Session::Anonymous,
                    rewrite: CookieRewrite::Keep,
                };
            }
            CredentialState::AccessValid(claims) => {
                return Resolution {
                    session: Session::Authenticated(claims),
                    rewrite: CookieRewrite::Keep,
                };
            }
            CredentialState::AccessInvalidRefreshPresent { refresh_token } => refresh_token,
        };

        let outcome = self.refresher.exchange(&refresh_token).await;
        metrics::record_refresh(outcome.label());

        match outcome {
            RefreshOutcome::Renewed(renewal) => {
                let session = match renewal.access_token.as_deref() {
                    Some(token) => {
                        cookies::rewrite_request_cookies(
                            request_headers,
                            &[(self.access_cookie.as_str(), token)],
                            &[],
                        );
                        self.verifier
                            .verify(token)
                            .map(Session::Authenticated)
                            .unwrap_or(Session::Anonymous)
                    }
                    None => Session::Anonymous,
                };
                Resolution {
                    session,
                    rewrite: CookieRewrite::Renewed(renewal.set_cookies),
                }
            }
            RefreshOutcome::Denied | RefreshOutcome::UpstreamUnavailable => {
                cookies::rewrite_request_cookies(
                    request_headers,
                    &[],
                    &[self.access_cookie.as_str(), self.refresh_cookie.as_str()],
                );
                Resolution {
                    session: Session::Anonymous,
                    rewrite: CookieRewrite::Cleared(self.clear_cookies.clone()),
                }
            }
        }
    }
}
