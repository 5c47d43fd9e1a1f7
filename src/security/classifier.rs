//! First-pass request classification.
//!
//! Runs before any stateful work. Decides whether a request is a static asset
//! (bypass), a disallowed client (reject) or a candidate for normal handling,
//! and resolves the identity bucket used by the rate limiter.
//!
//! The minimum user-agent length rule is a heuristic, not a security boundary:
//! any client can send a long fake string.

use std::fmt;
use std::net::IpAddr;

use serde::Serialize;

use crate::config::PolicyConfig;

/// Rate-limit bucket identity derived from the caller's resolved IP.
///
/// Shared NATs and proxies collapse many humans into one key; that imprecision
/// is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ClientKey(String);

impl ClientKey {
    /// First hop of `X-Forwarded-For`, else the transport peer, else `"unknown"`.
    pub fn resolve(forwarded_for: Option<&str>, peer: Option<IpAddr>) -> Self {
        let first_hop = forwarded_for
            .and_then(|chain| chain.split(',').next())
            .map(str::trim)
            .filter(|hop| !hop.is_empty());

        match (first_hop, peer) {
            (Some(hop), _) => ClientKey(hop.to_string()),
            (None, Some(ip)) => ClientKey(ip.to_string()),
            (None, None) => ClientKey("unknown".to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClientKey {
    fn from(s: &str) -> Self {
        ClientKey(s.to_string())
    }
}

impl fmt::Display for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of matching a user agent against the signature tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BotClassification {
    Blocked,
    Verified,
    /// Ordinary anonymous traffic.
    Unclassified,
}

/// Identity handed to the rate limiter and inserted into request extensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientIdentity {
    pub key: ClientKey,
    pub class: BotClassification,
}

/// Why a request was refused with 403.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    BlockedBot,
    SuspiciousUserAgent,
}

impl RejectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RejectReason::BlockedBot => "blocked_bot",
            RejectReason::SuspiciousUserAgent => "suspicious_user_agent",
        }
    }
}

/// Classifier outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// Static asset or bypass prefix: skip every check.
    Bypass,
    Reject {
        reason: RejectReason,
        key: ClientKey,
    },
    Admit(ClientIdentity),
}

/// Inputs the classifier looks at.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestFacts<'a> {
    pub path: &'a str,
    pub user_agent: Option<&'a str>,
    pub forwarded_for: Option<&'a str>,
    pub peer: Option<IpAddr>,
}

/// Data-driven classifier built from the policy table.
#[derive(Debug, Clone)]
pub struct Classifier {
    static_extensions: Vec<String>,
    bypass_prefixes: Vec<String>,
    blocked: Vec<String>,
    verified: Vec<String>,
    min_user_agent_len: usize,
}

impl Classifier {
    pub fn new(policy: &PolicyConfig) -> Self {
        let lower = |list: &[String]| -> Vec<String> {
            list.iter().map(|s| s.to_lowercase()).collect()
        };
        Self {
            static_extensions: policy.static_extensions.clone(),
            bypass_prefixes: policy.bypass_prefixes.clone(),
            blocked: lower(&policy.blocked_signatures),
            verified: lower(&policy.verified_signatures),
            min_user_agent_len: policy.min_user_agent_len,
        }
    }

    pub fn is_static_asset(&self, path: &str) -> bool {
        self.static_extensions.iter().any(|ext| path.ends_with(ext.as_str()))
    }

    /// Static assets plus anything under a bypass prefix.
    pub fn is_bypassed(&self, path: &str) -> bool {
        self.bypass_prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
            || self.is_static_asset(path)
    }

    /// Match a user agent against both tables. Blocked wins over verified.
    pub fn bot_class(&self, user_agent: &str) -> BotClassification {
        let ua = user_agent.to_lowercase();
        if self.blocked.iter().any(|sig| ua.contains(sig.as_str())) {
            BotClassification::Blocked
        } else if self.verified.iter().any(|sig| ua.contains(sig.as_str())) {
            BotClassification::Verified
        } else {
            BotClassification::Unclassified
        }
    }

    pub fn classify(&self, facts: RequestFacts<'_>) -> Verdict {
        if self.is_bypassed(facts.path) {
            return Verdict::Bypass;
        }

        let key = ClientKey::resolve(facts.forwarded_for, facts.peer);
        let user_agent = facts.user_agent.unwrap_or("");

        let class = self.bot_class(user_agent);
        if class == BotClassification::Blocked {
            return Verdict::Reject {
                reason: RejectReason::BlockedBot,
                key,
            };
        }

        if user_agent.chars().count() < self.min_user_agent_len {
            return Verdict::Reject {
                reason: RejectReason::SuspiciousUserAgent,
                key,
            };
        }

        Verdict::Admit(ClientIdentity { key, class })
    }
}
