// src/main.rs

//! # Badge Issuer - Main Entry Point
//!
//! Issues digital badge credentials into a JSON registry and writes one
//! standalone document per badge. Badges can optionally be signed with
//! HMAC-SHA256 over their critical fields.
//!
//! ## Architecture Overview
//! 1. **Models**: `Badge` and `Registry` documents
//! 2. **Storage Layer**: `RegistryStore` for the registry directory
//! 3. **Services Layer**: issuance pipeline and verification
//! 4. **Cryptography**: signing keys and badge signatures
//!
//! ## Environment Variables
//! - `SITE_BASE`: (Optional) verification site base URL
//! - `BADGE_HMAC_SECRET`: (Optional) signing secret, at least 16 characters
//! - `BADGE_REGISTRY_DIR`: (Optional) registry directory (default: `registry`)
//! - `RUST_LOG`: (Optional) log filter (default: `info`)

use crate::config::IssuerConfig;
use crate::error::{BadgeError, EXIT_FAILURE};
use crate::models::badge::Badge;
use crate::services::badge_issuer::{BadgeIssuer, BadgeRequest};
use crate::services::verifier::{SignatureStatus, Verifier};
use crate::storage::registry_store::LoadOutcome;
use crate::utils::serialization::to_pretty_json;
use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use log::{debug, error};
use std::path::PathBuf;
use std::process::ExitCode;

// Module declarations (organized by functional domain)
mod config;        // Environment-derived settings
mod error;         // Error taxonomy and exit codes
mod models;        // Data structures
mod services;      // Issuance and verification
mod storage;       // Registry files on disk
mod utils;         // Helper functions

/// Issue and verify digital badges
#[derive(Parser, Debug)]
#[command(name = "badge-issuer")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Registry directory (overrides BADGE_REGISTRY_DIR)
    #[arg(long, global = true)]
    registry_dir: Option<PathBuf>,

    /// Verification site base URL (overrides SITE_BASE)
    #[arg(long, global = true)]
    site_base: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Issue a badge and update the registry
    Issue {
        /// Badge display name
        badge_name: String,
        /// Recipient full name
        recipient_name: String,
        /// Recipient email, or '-' for none
        recipient_email_or_dash: String,
        /// Image path relative to the site (e.g. assets/badges/sample.png)
        image_rel_path: String,
        /// Comma-separated skills (e.g. 'Figma, Colour theory')
        skills_csv: String,
        /// Optional description
        description: Option<String>,
        /// Override issuer name (else use the registry's issuer)
        #[arg(long)]
        issuer_name: Option<String>,
        /// Override issuer website (else use the registry's issuer)
        #[arg(long)]
        issuer_website: Option<String>,
    },

    /// Look up a badge by id and check its signature
    Verify {
        /// Badge id
        id: String,
    },

    /// List issued badges, newest first
    #[command(alias = "ls")]
    List,

    /// Find badges by id, recipient name or recipient email
    Search {
        /// Case-insensitive text to look for
        query: String,
    },
}

fn main() -> ExitCode {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            let (code, message) = failure(&err);
            // Printed directly as well so it survives RUST_LOG=off.
            eprintln!("{}", message);
            error!("{:#}", err);
            ExitCode::from(code)
        }
    }
}

/// Exit code and one-line diagnostic for a failed run.
fn failure(err: &anyhow::Error) -> (u8, String) {
    let code = err
        .downcast_ref::<BadgeError>()
        .map_or(EXIT_FAILURE, BadgeError::exit_code);
    (code, format!("error: {:#}", err))
}

fn print_row(badge: &Badge) {
    println!(
        "{}  {}  {}  {}",
        badge.id, badge.issued_on, badge.name, badge.recipient.name
    );
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = IssuerConfig::from_env()?;
    if let Some(dir) = cli.registry_dir {
        config.registry_dir = dir;
    }
    if let Some(base) = cli.site_base {
        config.site_base = base;
    }
    debug!(
        "Registry at {}, site base {}, signing {}",
        config.registry_dir.display(),
        config.site_base,
        if config.signing_enabled() { "enabled" } else { "disabled" }
    );

    match cli.command {
        Commands::Issue {
            badge_name,
            recipient_name,
            recipient_email_or_dash,
            image_rel_path,
            skills_csv,
            description,
            issuer_name,
            issuer_website,
        } => {
            let request = BadgeRequest {
                name: badge_name,
                recipient_name,
                recipient_email: recipient_email_or_dash,
                image: image_rel_path,
                skills_csv,
                description,
                issuer_name,
                issuer_website,
            };
            let report = BadgeIssuer::new(config)
                .issue(&request)
                .context("failed to issue badge")?;

            println!("Issued badge {}", report.id());
            println!("Wrote: {}", report.badge_path.display());
            println!("Wrote: {}", report.registry_path.display());
            println!("Verify at: {}", report.verify_url());
            if let LoadOutcome::Recovered { backup: Some(path), .. } = &report.load_outcome {
                println!("Backup: {}", path.display());
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Verify { id } => {
            let verification = Verifier::new(config).verify(&id)?;
            println!("{}", to_pretty_json(&verification.badge)?.trim_end());
            println!("Signature: {}", verification.signature);
            if verification.signature == SignatureStatus::Invalid {
                Ok(ExitCode::from(EXIT_FAILURE))
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
        Commands::List => {
            for badge in Verifier::new(config).list()? {
                print_row(&badge);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Search { query } => {
            let found = Verifier::new(config).search(&query)?;
            if found.is_empty() {
                println!("No results for \"{}\"", query.trim());
            }
            for badge in &found {
                print_row(badge);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
