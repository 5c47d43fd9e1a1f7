use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use edge_gatekeeper::auth::TokenVerifier;
use edge_gatekeeper::config::{self, GatekeeperConfig};
use edge_gatekeeper::security::{Classifier, RequestFacts};

#[derive(Parser)]
#[command(name = "gatekeeper-cli")]
#[command(about = "Offline policy and token checks for the edge gatekeeper", long_about = None)]
struct Cli {
    /// Configuration file to take the policy tables and secret from.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show how a request would be classified
    Classify {
        #[arg(long)]
        user_agent: Option<String>,
        #[arg(long, default_value = "/")]
        path: String,
        #[arg(long)]
        forwarded_for: Option<String>,
    },
    /// Verify an access token against the shared secret
    Verify {
        #[arg(long)]
        token: String,
        /// Overrides the configured secret.
        #[arg(long, env = "GATEKEEPER_AUTH__JWT_SECRET")]
        secret: Option<String>,
    },
    /// Load and validate a configuration file
    CheckConfig { path: PathBuf },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Parsed without validation so policy checks work before a secret exists.
    let base: GatekeeperConfig = match &cli.config {
        Some(path) => toml::from_str(&std::fs::read_to_string(path)?)?,
        None => GatekeeperConfig::default(),
    };

    let output = match cli.command {
        Commands::Classify {
            user_agent,
            path,
            forwarded_for,
        } => {
            let classifier = Classifier::new(&base.policy);
            let verdict = classifier.classify(RequestFacts {
                path: &path,
                user_agent: user_agent.as_deref(),
                forwarded_for: forwarded_for.as_deref(),
                peer: None,
            });
            serde_json::to_value(verdict)?
        }
        Commands::Verify { token, secret } => {
            let secret = secret.unwrap_or(base.auth.jwt_secret);
            if secret.is_empty() {
                return Err("no secret given (--secret, GATEKEEPER_AUTH__JWT_SECRET or config)".into());
            }
            let verifier = TokenVerifier::new(&secret, base.auth.leeway_secs);
            match verifier.verify(&token) {
                Ok(claims) => json!({ "valid": true, "claims": claims }),
                Err(e) => json!({ "valid": false, "error": e.to_string() }),
            }
        }
        Commands::CheckConfig { path } => match config::load_config(&path) {
            Ok(loaded) => json!({ "valid": true, "mode": loaded.mode }),
            Err(e) => json!({ "valid": false, "error": e.to_string() }),
        },
    };

    print_json(&output)
}

fn print_json(value: &Value) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
