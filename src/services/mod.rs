// src/services/mod.rs
pub mod badge_issuer;
pub mod verifier;
