// src/error.rs
//! Error taxonomy for badge issuance.
//!
//! Configuration problems are kept apart from storage and data problems so the
//! entry point can map them to distinct process exit codes.

use std::path::PathBuf;
use thiserror::Error;

/// Exit code used when the configuration is rejected (e.g. a weak secret).
pub const EXIT_CONFIG: u8 = 2;

/// Exit code for every other failure.
pub const EXIT_FAILURE: u8 = 1;

#[derive(Debug, Error)]
pub enum BadgeError {
    /// A signing secret is configured but shorter than the allowed minimum.
    #[error("BADGE_HMAC_SECRET is too short ({len} chars); please set a longer secret (>={min} chars)")]
    WeakSecret { len: usize, min: usize },

    /// The configuration source could not be read.
    #[error("invalid configuration: {0}")]
    Config(#[from] config::ConfigError),

    /// Reading or writing a file failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No badge with the requested id exists in the registry.
    #[error("badge not found: {0}")]
    NotFound(String),
}

impl BadgeError {
    /// Wraps an I/O error together with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BadgeError::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            BadgeError::WeakSecret { .. } | BadgeError::Config(_) => EXIT_CONFIG,
            _ => EXIT_FAILURE,
        }
    }
}

pub type Result<T> = std::result::Result<T, BadgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weak_secret_is_config_exit() {
        let err = BadgeError::WeakSecret { len: 15, min: 16 };
        assert_eq!(err.exit_code(), EXIT_CONFIG);
        assert!(err.to_string().contains(">=16"));
    }

    #[test]
    fn test_storage_errors_are_generic_failures() {
        let err = BadgeError::io(
            "registry/registry.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.exit_code(), EXIT_FAILURE);
        assert!(err.to_string().contains("registry/registry.json"));
        assert_eq!(BadgeError::NotFound("x".into()).exit_code(), EXIT_FAILURE);
    }
}
