// src/services/verifier.rs
//! Badge lookup and signature verification.
//!
//! Reads the registry without recovering or rewriting it: a corrupt registry
//! simply contains no badges from the verifier's point of view.

use crate::config::IssuerConfig;
use crate::error::{BadgeError, Result};
use crate::models::badge::Badge;
use crate::models::registry::{record_id, Registry};
use crate::storage::registry_store::{LoadOutcome, RegistryStore};
use crate::utils::crypto::verify_signature;
use log::warn;
use serde_json::Value;
use std::fmt;

/// Maximum number of badges returned by [`Verifier::search`].
pub const SEARCH_LIMIT: usize = 30;

/// Outcome of checking a badge's signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureStatus {
    Valid,
    Invalid,
    /// The badge carries no signature.
    Unsigned,
    /// No secret is configured, so the signature could not be checked.
    Unchecked,
}

impl fmt::Display for SignatureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SignatureStatus::Valid => "valid",
            SignatureStatus::Invalid => "INVALID",
            SignatureStatus::Unsigned => "unsigned",
            SignatureStatus::Unchecked => "not checked (no secret configured)",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone)]
pub struct Verification {
    pub badge: Badge,
    pub signature: SignatureStatus,
}

pub struct Verifier {
    config: IssuerConfig,
    store: RegistryStore,
}

impl Verifier {
    pub fn new(config: IssuerConfig) -> Self {
        let store = RegistryStore::new(config.registry_dir.clone());
        Self { config, store }
    }

    fn registry(&self) -> Result<Registry> {
        let (registry, outcome) = self.store.read()?;
        if let LoadOutcome::Recovered { reason, .. } = outcome {
            warn!("registry is unreadable ({}); treating it as empty", reason);
        }
        Ok(registry)
    }

    /// All badges in registry order (newest first).
    ///
    /// Records that do not describe a badge are skipped with a warning.
    pub fn list(&self) -> Result<Vec<Badge>> {
        Ok(self.registry()?.badges.into_iter().filter_map(parse_record).collect())
    }

    /// Badges whose id, recipient name or recipient email contains `query`.
    ///
    /// Matching ignores case and surrounding whitespace. A blank query matches
    /// nothing. At most [`SEARCH_LIMIT`] badges are returned, in registry order.
    pub fn search(&self, query: &str) -> Result<Vec<Badge>> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .registry()?
            .badges
            .into_iter()
            .filter(|record| matches_query(record, &query))
            .filter_map(parse_record)
            .take(SEARCH_LIMIT)
            .collect())
    }

    /// Looks up badge `id` and checks its signature.
    ///
    /// # Errors
    /// `BadgeError::NotFound` if no badge has this id.
    pub fn verify(&self, id: &str) -> Result<Verification> {
        let record = self
            .registry()?
            .find(id)
            .cloned()
            .ok_or_else(|| BadgeError::NotFound(id.to_string()))?;
        let badge: Badge = serde_json::from_value(record)?;
        let signature = self.check(&badge);
        Ok(Verification { badge, signature })
    }

    pub fn check(&self, badge: &Badge) -> SignatureStatus {
        if badge.signature.is_none() {
            return SignatureStatus::Unsigned;
        }
        match &self.config.signing_key {
            None => SignatureStatus::Unchecked,
            Some(key) if verify_signature(badge, key) => SignatureStatus::Valid,
            Some(_) => SignatureStatus::Invalid,
        }
    }
}

fn parse_record(record: Value) -> Option<Badge> {
    let id = record_id(&record).map(str::to_owned);
    match serde_json::from_value(record) {
        Ok(badge) => Some(badge),
        Err(e) => {
            warn!("skipping unreadable badge record {:?}: {}", id, e);
            None
        }
    }
}

fn matches_query(record: &Value, query: &str) -> bool {
    let field = |value: Option<&Value>| {
        value
            .and_then(Value::as_str)
            .map_or(false, |text| text.to_lowercase().contains(query))
    };
    let recipient = record.get("recipient");
    field(record.get("id"))
        || field(recipient.and_then(|r| r.get("name")))
        || field(recipient.and_then(|r| r.get("email")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::badge_issuer::{BadgeIssuer, BadgeRequest};
    use crate::storage::registry_store::REGISTRY_FILE;
    use std::fs;
    use tempfile::TempDir;

    const SECRET: &str = "correct horse battery staple";

    fn config(dir: &TempDir, secret: &str) -> IssuerConfig {
        IssuerConfig::new("https://badges.example.org", secret, dir.path()).unwrap()
    }

    fn issue(dir: &TempDir, secret: &str) -> Badge {
        issue_to(dir, secret, "Linus", "linus@example.org")
    }

    fn issue_to(dir: &TempDir, secret: &str, name: &str, email: &str) -> Badge {
        let request = BadgeRequest {
            name: "Night Owl".into(),
            recipient_name: name.into(),
            recipient_email: email.into(),
            image: "assets/badges/owl.png".into(),
            skills_csv: "C, Git".into(),
            ..Default::default()
        };
        BadgeIssuer::new(config(dir, secret))
            .issue(&request)
            .unwrap()
            .badge
    }

    fn ids(badges: &[Badge]) -> Vec<&str> {
        badges.iter().map(|b| b.id.as_str()).collect()
    }

    #[test]
    fn test_valid_signature() {
        let dir = TempDir::new().unwrap();
        let badge = issue(&dir, SECRET);
        let verification = Verifier::new(config(&dir, SECRET)).verify(&badge.id).unwrap();
        assert_eq!(verification.badge, badge);
        assert_eq!(verification.signature, SignatureStatus::Valid);
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let dir = TempDir::new().unwrap();
        let badge = issue(&dir, SECRET);
        let verifier = Verifier::new(config(&dir, "a different secret value"));
        assert_eq!(verifier.verify(&badge.id).unwrap().signature, SignatureStatus::Invalid);
    }

    #[test]
    fn test_tampered_critical_field_is_invalid() {
        let dir = TempDir::new().unwrap();
        let badge = issue(&dir, SECRET);
        let path = dir.path().join(REGISTRY_FILE);
        let text = fs::read_to_string(&path).unwrap().replace("Linus", "Mallory");
        fs::write(&path, text).unwrap();

        let verification = Verifier::new(config(&dir, SECRET)).verify(&badge.id).unwrap();
        assert_eq!(verification.badge.recipient.name, "Mallory");
        assert_eq!(verification.signature, SignatureStatus::Invalid);
    }

    #[test]
    fn test_unsigned_and_unchecked() {
        let dir = TempDir::new().unwrap();
        let unsigned = issue(&dir, "");
        let signed = issue(&dir, SECRET);

        let with_key = Verifier::new(config(&dir, SECRET));
        assert_eq!(with_key.verify(&unsigned.id).unwrap().signature, SignatureStatus::Unsigned);

        let without_key = Verifier::new(config(&dir, ""));
        assert_eq!(without_key.verify(&signed.id).unwrap().signature, SignatureStatus::Unchecked);
    }

    #[test]
    fn test_unknown_id() {
        let dir = TempDir::new().unwrap();
        issue(&dir, "");
        let err = Verifier::new(config(&dir, "")).verify("nope").unwrap_err();
        assert!(matches!(err, BadgeError::NotFound(id) if id == "nope"));
    }

    #[test]
    fn test_corrupt_registry_reads_empty_and_is_left_alone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(REGISTRY_FILE);
        fs::write(&path, "not json").unwrap();
        let verifier = Verifier::new(config(&dir, ""));
        assert!(verifier.list().unwrap().is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "not json");
    }

    #[test]
    fn test_list_skips_records_that_are_not_badges() {
        let dir = TempDir::new().unwrap();
        let raw = serde_json::json!({
            "badges": [
                {"id": "legacy-1", "name": "Early Bird", "recipient": {"name": "Grace"}},
                "junk",
                {"id": "bad-skills", "skills": [1, 2]}
            ]
        });
        fs::write(dir.path().join(REGISTRY_FILE), raw.to_string()).unwrap();
        let badges = Verifier::new(config(&dir, "")).list().unwrap();
        assert_eq!(ids(&badges), vec!["legacy-1"]);
        assert_eq!(badges[0].recipient.name, "Grace");
    }

    #[test]
    fn test_search_matches_id_name_and_email() {
        let dir = TempDir::new().unwrap();
        let ada = issue_to(&dir, "", "Ada Lovelace", "ada@engine.org");
        let grace = issue_to(&dir, "", "Grace Hopper", "-");
        let verifier = Verifier::new(config(&dir, ""));

        assert_eq!(ids(&verifier.search("  LOVELACE ").unwrap()), vec![ada.id.as_str()]);
        assert_eq!(ids(&verifier.search("Engine.ORG").unwrap()), vec![ada.id.as_str()]);
        let prefix = grace.id[..8].to_uppercase();
        assert!(ids(&verifier.search(&prefix).unwrap()).contains(&grace.id.as_str()));
        assert!(verifier.search("nobody").unwrap().is_empty());
    }

    #[test]
    fn test_blank_search_matches_nothing() {
        let dir = TempDir::new().unwrap();
        issue(&dir, "");
        let verifier = Verifier::new(config(&dir, ""));
        assert!(verifier.search("").unwrap().is_empty());
        assert!(verifier.search("   ").unwrap().is_empty());
    }

    #[test]
    fn test_search_is_capped_in_registry_order() {
        let dir = TempDir::new().unwrap();
        let records: Vec<_> = (0..SEARCH_LIMIT + 5)
            .map(|i| serde_json::json!({"id": format!("b-{i}"), "recipient": {"name": "Twin"}}))
            .collect();
        let raw = serde_json::json!({ "badges": records });
        fs::write(dir.path().join(REGISTRY_FILE), raw.to_string()).unwrap();

        let found = Verifier::new(config(&dir, "")).search("twin").unwrap();
        assert_eq!(found.len(), SEARCH_LIMIT);
        assert_eq!(found[0].id, "b-0");
        assert_eq!(found[SEARCH_LIMIT - 1].id, format!("b-{}", SEARCH_LIMIT - 1));
    }
}
