// src/services/badge_issuer.rs
//! Badge Issuer Service
//!
//! Runs one issuance as a linear pipeline:
//! Load → Construct → Sign (optional) → Upsert → Save → Report.
//!
//! A failure at any step stops the pipeline. Earlier writes are not rolled
//! back: if the registry was saved and the standalone badge file then fails,
//! the registry keeps the new badge.

use crate::config::IssuerConfig;
use crate::error::Result;
use crate::models::badge::{Badge, Issuer, Recipient};
use crate::storage::registry_store::{LoadOutcome, RegistryStore};
use crate::utils::crypto::sign_badge;
use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info};
use std::path::PathBuf;
use uuid::Uuid;

/// Value that stands for "no email" on the command line.
pub const NO_EMAIL_SENTINEL: &str = "-";

/// Caller-supplied fields for a new badge.
#[derive(Debug, Clone, Default)]
pub struct BadgeRequest {
    pub name: String,
    pub recipient_name: String,
    /// Email address, or `-` for none.
    pub recipient_email: String,
    /// Image path relative to the site; not checked for existence.
    pub image: String,
    /// Comma-separated skills, e.g. `"Figma, Colour theory"`.
    pub skills_csv: String,
    pub description: Option<String>,
    pub issuer_name: Option<String>,
    pub issuer_website: Option<String>,
}

/// Result of a successful issuance.
#[derive(Debug, Clone)]
pub struct IssueReport {
    pub badge: Badge,
    pub badge_path: PathBuf,
    pub registry_path: PathBuf,
    /// How the registry was loaded before the badge was added.
    pub load_outcome: LoadOutcome,
}

impl IssueReport {
    pub fn id(&self) -> &str {
        &self.badge.id
    }

    pub fn verify_url(&self) -> &str {
        &self.badge.verify_url
    }
}

/// Issues badges into a file-backed registry.
pub struct BadgeIssuer {
    config: IssuerConfig,
    store: RegistryStore,
}

impl BadgeIssuer {
    pub fn new(config: IssuerConfig) -> Self {
        let store = RegistryStore::new(config.registry_dir.clone());
        Self { config, store }
    }

    /// Builds an unsigned badge with a fresh id and the current UTC time.
    pub fn construct(&self, request: &BadgeRequest, registry_issuer: &Issuer) -> Badge {
        self.construct_with(
            request,
            registry_issuer,
            Uuid::new_v4().to_string(),
            Utc::now(),
        )
    }

    /// Builds an unsigned badge with the given id and issuance time.
    pub fn construct_with(
        &self,
        request: &BadgeRequest,
        registry_issuer: &Issuer,
        id: String,
        issued_on: DateTime<Utc>,
    ) -> Badge {
        let verify_url = verify_url(&self.config.site_base, &id);
        Badge {
            name: request.name.clone(),
            description: request.description.clone().unwrap_or_default(),
            recipient: Recipient {
                name: request.recipient_name.clone(),
                email: normalize_email(&request.recipient_email),
                ..Default::default()
            },
            issuer: resolve_issuer(request, registry_issuer),
            issued_on: format_timestamp(issued_on),
            skills: parse_skills(&request.skills_csv),
            image: request.image.clone(),
            verify_url,
            id,
            ..Default::default()
        }
    }

    /// Issues one badge and persists it to the registry and its own file.
    ///
    /// # Errors
    /// Storage and serialization failures. A corrupt registry is not an
    /// error; it shows up as `LoadOutcome::Recovered` in the report.
    pub fn issue(&self, request: &BadgeRequest) -> Result<IssueReport> {
        let (mut registry, load_outcome) = self.store.load()?;
        debug!("Loaded registry ({:?}) from {}", load_outcome, self.store.dir().display());

        let mut badge = self.construct(request, &registry.issuer);
        if let Some(key) = &self.config.signing_key {
            sign_badge(&mut badge, key);
            debug!("Signed badge {}", badge.id);
        }

        registry.issuer = badge.issuer.clone();
        registry.upsert_newest_first(&badge)?;

        let registry_path = self.store.save(&registry)?;
        let badge_path = self.store.write_badge(&badge)?;
        info!("Issued badge {} to {}", badge.id, badge.recipient.name);

        Ok(IssueReport {
            badge,
            badge_path,
            registry_path,
            load_outcome,
        })
    }
}

/// Overrides win; otherwise the registry's current issuer is used.
///
/// Extra issuer keys stored in the registry are carried over.
pub fn resolve_issuer(request: &BadgeRequest, registry_issuer: &Issuer) -> Issuer {
    let mut issuer = registry_issuer.clone();
    if let Some(name) = &request.issuer_name {
        issuer.name = name.clone();
    }
    if let Some(website) = &request.issuer_website {
        issuer.website = website.clone();
    }
    issuer
}

/// Maps the `-` sentinel (and an empty string) to no email.
pub fn normalize_email(raw: &str) -> Option<String> {
    if raw == NO_EMAIL_SENTINEL || raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

/// Splits on commas, trims, drops blanks. Order and duplicates are kept.
pub fn parse_skills(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|skill| !skill.is_empty())
        .map(String::from)
        .collect()
}

/// `<base without trailing slash>#id=<id>`.
pub fn verify_url(site_base: &str, id: &str) -> String {
    format!("{}#id={}", site_base.trim_end_matches('/'), id)
}

/// RFC 3339, microsecond precision, explicit `+00:00` offset.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, false)
}
