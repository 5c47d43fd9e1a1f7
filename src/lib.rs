//! Edge request gatekeeper library.
//!
//! Runs in front of every page request of a content site:
//! rejects bots, bounds per-client throughput in memory, and keeps the access
//! cookie fresh without ever surfacing an auth failure to the browser.

pub mod auth;
pub mod config;
pub mod gate;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::GatekeeperConfig;
pub use gate::Gatekeeper;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
