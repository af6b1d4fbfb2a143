// src/utils/crypto.rs
//! Keyed integrity signatures for badges.
//!
//! Badges are tagged with HMAC-SHA256 (via `ring`) over their critical fields
//! only: `id`, `name`, `recipient.name` and `issuedOn`, pipe-joined in that
//! order. Everything else (skills, image, description, ...) is not covered.

use crate::error::{BadgeError, Result};
use crate::models::badge::{Badge, Signature};
use ring::hmac;
use std::fmt;

/// Algorithm tag stored alongside every signature.
pub const SIGNATURE_ALG: &str = "HS256";

/// Minimum accepted secret length, in characters.
pub const MIN_SECRET_CHARS: usize = 16;

/// A validated HMAC secret.
///
/// Can only be built through [`SigningKey::new`], which enforces the minimum
/// length, so holding one means signing is allowed.
#[derive(Clone)]
pub struct SigningKey {
    secret: Vec<u8>,
}

impl SigningKey {
    /// Validates `secret` and wraps it.
    ///
    /// # Errors
    /// `BadgeError::WeakSecret` if the secret has fewer than 16 characters.
    pub fn new(secret: &str) -> Result<Self> {
        let len = secret.chars().count();
        if len < MIN_SECRET_CHARS {
            return Err(BadgeError::WeakSecret {
                len,
                min: MIN_SECRET_CHARS,
            });
        }
        Ok(Self {
            secret: secret.as_bytes().to_vec(),
        })
    }

    fn key(&self) -> hmac::Key {
        hmac::Key::new(hmac::HMAC_SHA256, &self.secret)
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

/// Builds the byte string the signature covers.
pub fn critical_payload(badge: &Badge) -> String {
    format!(
        "{}|{}|{}|{}",
        badge.id, badge.name, badge.recipient.name, badge.issued_on
    )
}

/// Computes the signature for `badge` without modifying it.
pub fn compute_signature(badge: &Badge, key: &SigningKey) -> Signature {
    let tag = hmac::sign(&key.key(), critical_payload(badge).as_bytes());
    Signature {
        alg: SIGNATURE_ALG.to_string(),
        value: hex::encode(tag.as_ref()),
    }
}

/// Attaches a fresh signature to `badge`, replacing any existing one.
pub fn sign_badge(badge: &mut Badge, key: &SigningKey) {
    badge.signature = Some(compute_signature(badge, key));
}

/// Checks a stored signature in constant time.
///
/// Returns `false` for an unsigned badge, an unknown `alg` or a value that is
/// not valid hex.
pub fn verify_signature(badge: &Badge, key: &SigningKey) -> bool {
    let Some(signature) = badge.signature.as_ref() else {
        return false;
    };
    if signature.alg != SIGNATURE_ALG {
        return false;
    }
    let Ok(tag) = hex::decode(&signature.value) else {
        return false;
    };
    hmac::verify(&key.key(), critical_payload(badge).as_bytes(), &tag).is_ok()
}
