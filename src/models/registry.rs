// src/models/registry.rs
//! Registry document: default issuer identity plus every issued badge.
//!
//! Badge records are held as raw JSON values. Records written by older or
//! foreign tools may miss fields or carry extra ones; they are kept exactly
//! as found and only the new badge is written in typed form.

use crate::models::badge::{Badge, Issuer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The shared registry document.
///
/// Both keys are backfilled with defaults on deserialization, so a document
/// missing `issuer` or `badges` still loads into a complete value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Registry {
    #[serde(default)]
    pub issuer: Issuer,
    /// Badge records, newest first, unique by `id`.
    #[serde(default)]
    pub badges: Vec<Value>,
    /// Unrecognised top-level keys, carried through load/save untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `id` of a raw badge record, if it has a string one.
pub fn record_id(record: &Value) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

impl Registry {
    /// Inserts `badge` at the front, dropping any earlier record with the same id.
    pub fn upsert_newest_first(&mut self, badge: &Badge) -> Result<(), serde_json::Error> {
        let record = serde_json::to_value(badge)?;
        self.badges
            .retain(|existing| record_id(existing) != Some(badge.id.as_str()));
        self.badges.insert(0, record);
        Ok(())
    }

    pub fn find(&self, id: &str) -> Option<&Value> {
        self.badges.iter().find(|record| record_id(record) == Some(id))
    }
}
