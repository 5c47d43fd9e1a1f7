//! The three-stage request pipeline as one shareable component.
//!
//! ```text
//! classifier ──▶ rate limiter ──▶ credential gatekeeper ──▶ downstream
//!     │               │
//!     └─ 403          └─ 429
//! ```
//!
//! One `Gatekeeper` is created at startup and shared through `Arc` by every
//! in-flight request. Its rate-limit store is the only mutable state in the
//! pipeline and is never persisted.

use crate::auth::{CredentialGate, RefreshClientError};
use crate::config::GatekeeperConfig;
use crate::security::{Classifier, RateLimiter};

pub struct Gatekeeper {
    classifier: Classifier,
    limiter: RateLimiter,
    credentials: CredentialGate,
}

impl Gatekeeper {
    pub fn from_config(config: &GatekeeperConfig) -> Result<Self, RefreshClientError> {
        Ok(Self {
            classifier: Classifier::new(&config.policy),
            limiter: RateLimiter::from_config(&config.rate_limit, config.mode),
            credentials: CredentialGate::new(&config.auth, config.mode)?,
        })
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn credentials(&self) -> &CredentialGate {
        &self.credentials
    }
}
