//! Edge Request Gatekeeper
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌───────────────────────────────────────────────────────┐
//!                     │                      GATEKEEPER                        │
//!   Client Request    │  ┌────────────┐   ┌────────────┐   ┌───────────────┐  │
//!   ──────────────────┼─▶│ classifier │──▶│rate limiter│──▶│  credentials  │──┼──▶ Content Site
//!                     │  └─────┬──────┘   └─────┬──────┘   └───────┬───────┘  │
//!                     │        │ 403            │ 429              │ refresh  │
//!   ◀─────────────────┼────────┴────────────────┘                  ▼          │
//!                     │                                    ┌───────────────┐  │
//!                     │                                    │   authority   │  │
//!                     │                                    │ /auth/refresh │  │
//!                     │                                    └───────────────┘  │
//!                     └───────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use edge_gatekeeper::config;
use edge_gatekeeper::lifecycle::startup;

#[derive(Parser)]
#[command(name = "edge-gatekeeper")]
#[command(about = "Edge request gatekeeper for the content site", long_about = None)]
struct Args {
    /// TOML configuration file. Defaults plus environment overrides when omitted.
    #[arg(short, long, env = "GATEKEEPER_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => config::load_from_env()?,
    };

    startup::start(config).await?;
    Ok(())
}
