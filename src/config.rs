// src/config.rs
//! Issuer configuration.
//!
//! The entry point builds one [`IssuerConfig`] and hands it to the services;
//! nothing else reads the process environment.
//!
//! ## Environment Variables
//! - `SITE_BASE`: base URL of the verification site
//! - `BADGE_HMAC_SECRET`: (Optional) signing secret, at least 16 characters
//! - `BADGE_REGISTRY_DIR`: (Optional) registry directory (default: `registry`)

use crate::error::Result;
use crate::utils::crypto::SigningKey;
use config::{Config, Environment};
use std::path::PathBuf;

pub const DEFAULT_SITE_BASE: &str = "https://anu1209823.github.io/digital-badge-system/site/";
pub const DEFAULT_REGISTRY_DIR: &str = "registry";

/// Resolved settings for issuing and verifying badges.
#[derive(Debug, Clone)]
pub struct IssuerConfig {
    /// Verification site base URL, trailing slash allowed.
    pub site_base: String,
    /// `None` disables signing.
    pub signing_key: Option<SigningKey>,
    pub registry_dir: PathBuf,
}

impl IssuerConfig {
    /// Builds a configuration from raw values.
    ///
    /// An empty secret means signing is disabled.
    ///
    /// # Errors
    /// `BadgeError::WeakSecret` if a non-empty secret is shorter than 16 characters.
    pub fn new(
        site_base: impl Into<String>,
        secret: &str,
        registry_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let signing_key = if secret.is_empty() {
            None
        } else {
            Some(SigningKey::new(secret)?)
        };
        Ok(Self {
            site_base: site_base.into(),
            signing_key,
            registry_dir: registry_dir.into(),
        })
    }

    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_source(Environment::default())
    }

    fn from_source(env: Environment) -> Result<Self> {
        let settings = Config::builder()
            .set_default("site_base", DEFAULT_SITE_BASE)?
            .set_default("badge_hmac_secret", "")?
            .set_default("badge_registry_dir", DEFAULT_REGISTRY_DIR)?
            .add_source(env)
            .build()?;

        Self::new(
            settings.get_string("site_base")?,
            &settings.get_string("badge_hmac_secret")?,
            settings.get_string("badge_registry_dir")?,
        )
    }

    pub fn signing_enabled(&self) -> bool {
        self.signing_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BadgeError;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::default().source(Some(map))
    }

    #[test]
    fn test_defaults() {
        let config = IssuerConfig::from_source(env(&[])).unwrap();
        assert_eq!(config.site_base, DEFAULT_SITE_BASE);
        assert_eq!(config.registry_dir, PathBuf::from("registry"));
        assert!(!config.signing_enabled());
    }

    #[test]
    fn test_environment_overrides() {
        let config = IssuerConfig::from_source(env(&[
            ("SITE_BASE", "https://badges.example.org/"),
            ("BADGE_HMAC_SECRET", "0123456789abcdef"),
            ("BADGE_REGISTRY_DIR", "/tmp/reg"),
        ]))
        .unwrap();
        assert_eq!(config.site_base, "https://badges.example.org/");
        assert_eq!(config.registry_dir, PathBuf::from("/tmp/reg"));
        assert!(config.signing_enabled());
    }

    #[test]
    fn test_short_secret_is_rejected() {
        let err = IssuerConfig::from_source(env(&[("BADGE_HMAC_SECRET", "0123456789abcde")]))
            .unwrap_err();
        assert!(matches!(err, BadgeError::WeakSecret { len: 15, .. }));
    }

    #[test]
    fn test_empty_secret_disables_signing() {
        let config = IssuerConfig::new("https://x.test", "", "registry").unwrap();
        assert!(config.signing_key.is_none());
    }
}
