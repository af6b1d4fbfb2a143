// src/models/badge.rs
//! Badge credential data model.
//!
//! A badge is written once at issuance and never mutated afterwards. It is
//! persisted twice: embedded in the registry and as a standalone document.
//! Field names on the wire are camelCase (`issuedOn`, `verifyUrl`).
//!
//! Every record type keeps keys it does not know about in `extra`, so
//! documents written by other tools survive a read/write cycle unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Issuer name used when neither an override nor the registry provides one.
pub const DEFAULT_ISSUER_NAME: &str = "BugBox";

/// Entity credited with granting a badge.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Issuer {
    #[serde(default = "default_issuer_name")]
    pub name: String,
    #[serde(default)]
    pub website: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_issuer_name() -> String {
    DEFAULT_ISSUER_NAME.to_string()
}

impl Default for Issuer {
    fn default() -> Self {
        Issuer {
            name: default_issuer_name(),
            website: String::new(),
            extra: Map::new(),
        }
    }
}

/// Person the badge was granted to.
///
/// `email` is omitted from the JSON entirely when absent, never written as
/// `null` or `""`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Recipient {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Keyed integrity tag over the badge's critical fields.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Algorithm identifier, always `HS256` for badges this tool signs.
    pub alg: String,
    /// Lowercase hex MAC.
    pub value: String,
}

/// A single issued badge.
///
/// Missing fields read as their defaults, so older partial records still
/// load into a typed value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Badge {
    /// Random UUID (v4), fresh per issuance.
    pub id: String,
    pub name: String,
    pub description: String,
    pub recipient: Recipient,
    /// Snapshot of the issuer identity at issuance time.
    pub issuer: Issuer,
    /// RFC 3339 UTC timestamp with explicit `+00:00` offset.
    pub issued_on: String,
    pub skills: Vec<String>,
    pub image: String,
    pub verify_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
