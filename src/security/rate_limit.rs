//! Fixed-window rate limiting keyed by client identity.
//!
//! Counts live in process memory only. A restart resets every client's budget,
//! which is acceptable for a best-effort abuse deterrent. Nothing is shared
//! between processes, so N replicas allow up to N times the configured limit.
//!
//! The window is fixed, not sliding: a client can spend its full budget at the
//! end of one window and again at the start of the next.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::config::{BudgetConfig, RateLimitConfig, RuntimeMode};
use crate::observability::metrics;
use crate::security::classifier::{BotClassification, ClientIdentity, ClientKey};

/// `limit` requests per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    pub limit: u32,
    pub window: Duration,
}

impl From<BudgetConfig> for Budget {
    fn from(config: BudgetConfig) -> Self {
        Self {
            limit: config.limit,
            window: Duration::from_secs(config.window_secs),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct WindowRecord {
    count: u32,
    reset_at: Instant,
}

/// Outcome of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { count: u32, limit: u32 },
    Limited { count: u32, limit: u32, retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }

    /// Whole seconds until the window resets, rounded up, at least 1.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            RateDecision::Allowed { .. } => None,
            RateDecision::Limited { retry_after, .. } => {
                let millis = retry_after.as_millis() as u64;
                Some(millis.div_ceil(1000).max(1))
            }
        }
    }
}

/// Concurrency-safe fixed-window counter store.
///
/// Each key's record is updated under its DashMap shard lock, so concurrent
/// requests from one client never lose increments.
pub struct FixedWindowLimiter {
    records: DashMap<ClientKey, WindowRecord>,
    sweep_threshold: usize,
    warn_ratio: f64,
    warnings: AtomicU64,
}

impl FixedWindowLimiter {
    pub fn new(sweep_threshold: usize, warn_ratio: f64) -> Self {
        Self {
            records: DashMap::new(),
            sweep_threshold,
            warn_ratio,
            warnings: AtomicU64::new(0),
        }
    }

    pub fn check(&self, key: &ClientKey, budget: Budget) -> RateDecision {
        self.check_at(key, budget, Instant::now())
    }

    /// Count a request for `key` as of `now`.
    pub fn check_at(&self, key: &ClientKey, budget: Budget, now: Instant) -> RateDecision {
        let mut inserted = false;

        // The shard guard must be released before a sweep touches every shard.
        let decision = match self.records.entry(key.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(WindowRecord {
                    count: 1,
                    reset_at: now + budget.window,
                });
                inserted = true;
                RateDecision::Allowed { count: 1, limit: budget.limit }
            }
            Entry::Occupied(mut slot) => {
                let record = slot.get_mut();
                if now > record.reset_at {
                    record.count = 1;
                    record.reset_at = now + budget.window;
                    RateDecision::Allowed { count: 1, limit: budget.limit }
                } else {
                    record.count = record.count.saturating_add(1);
                    let count = record.count;
                    if count > budget.limit {
                        RateDecision::Limited {
                            count,
                            limit: budget.limit,
                            retry_after: record.reset_at.saturating_duration_since(now),
                        }
                    } else {
                        if count == self.warn_at(budget.limit) {
                            self.warnings.fetch_add(1, Ordering::Relaxed);
                            metrics::record_limiter_warning();
                            tracing::warn!(
                                client = %key,
                                count,
                                limit = budget.limit,
                                "Client approaching rate limit"
                            );
                        }
                        RateDecision::Allowed { count, limit: budget.limit }
                    }
                }
            }
        };

        if inserted && self.records.len() > self.sweep_threshold {
            self.sweep(now, budget.window);
        }

        decision
    }

    /// Count at which the near-limit warning fires. Never 1: the first
    /// request of a window takes the insert/reset path.
    fn warn_at(&self, limit: u32) -> u32 {
        let threshold = (f64::from(limit) * self.warn_ratio - 1e-9).ceil() as u32;
        threshold.max(2)
    }

    /// Near-limit warnings issued since startup.
    pub fn warnings_issued(&self) -> u64 {
        self.warnings.load(Ordering::Relaxed)
    }

    /// Drop records whose window ended more than `window` before `now`.
    /// Returns the number of evicted records.
    pub fn sweep(&self, now: Instant, window: Duration) -> usize {
        let Some(cutoff) = now.checked_sub(window) else {
            return 0;
        };

        let before = self.records.len();
        self.records.retain(|_, record| record.reset_at >= cutoff);
        let after = self.records.len();
        let evicted = before.saturating_sub(after);

        tracing::debug!(evicted, remaining = after, "Swept stale rate limit records");
        metrics::set_limiter_keys(after);
        evicted
    }

    /// Number of distinct keys currently tracked.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Per-class budgets on top of the shared counter store.
///
/// One instance lives for the whole process and is shared through `Arc`.
pub struct RateLimiter {
    store: FixedWindowLimiter,
    anonymous: Budget,
    verified: Budget,
    enforced: bool,
}

impl RateLimiter {
    pub fn from_config(config: &RateLimitConfig, mode: RuntimeMode) -> Self {
        Self {
            store: FixedWindowLimiter::new(config.sweep_threshold, config.warn_ratio),
            anonymous: config.anonymous.into(),
            verified: config.verified.into(),
            enforced: mode.is_production() || config.enforce_in_development,
        }
    }

    /// Limits apply only in production unless explicitly enabled.
    pub fn is_enforced(&self) -> bool {
        self.enforced
    }

    pub fn budget_for(&self, class: BotClassification) -> Budget {
        match class {
            BotClassification::Verified => self.verified,
            BotClassification::Blocked | BotClassification::Unclassified => self.anonymous,
        }
    }

    pub fn check(&self, identity: &ClientIdentity) -> RateDecision {
        self.store.check(&identity.key, self.budget_for(identity.class))
    }

    pub fn store(&self) -> &FixedWindowLimiter {
        &self.store
    }
}
