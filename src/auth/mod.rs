//! Credential subsystem.
//!
//! # Data Flow
//! ```text
//! Admitted request:
//!     → cookies.rs (read accessToken / refreshToken)
//!     → token.rs (verify access token locally with the shared secret)
//!     → refresh.rs (one exchange with the authority when needed)
//!     → gatekeeper.rs (decide session, rewrite request and response cookies)
//! ```
//!
//! # Design Decisions
//! - Fail open: an unreachable or refusing authority degrades the caller to
//!   anonymous and clears both cookies; the request itself never fails here
//! - The refresh exchange has an explicit deadline and is never retried
//! - Refresh token rotation by the authority is passed through untouched

pub mod cookies;
pub mod gatekeeper;
pub mod refresh;
pub mod token;

pub use gatekeeper::{CookieRewrite, CredentialGate, CredentialState, Resolution, Session};
pub use refresh::{RefreshClient, RefreshClientError, RefreshOutcome, Renewal};
pub use token::{AccessClaims, TokenError, TokenVerifier};
