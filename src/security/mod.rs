//! Traffic filtering subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → classifier.rs (static bypass, bot signatures, client key)
//!     → rate_limit.rs (fixed-window budget per client key)
//!     → Pass to credential gatekeeper
//! ```
//!
//! # Design Decisions
//! - Cheapest checks first: rejected bots never consume counter capacity
//! - Signature tables are configuration, not code
//! - Limiter state is process-local and resets on restart

pub mod classifier;
pub mod rate_limit;

pub use classifier::{
    BotClassification, Classifier, ClientIdentity, ClientKey, RejectReason, RequestFacts, Verdict,
};
pub use rate_limit::{Budget, FixedWindowLimiter, RateDecision, RateLimiter};
