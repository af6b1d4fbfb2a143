// src/storage/registry_store.rs
//! File-backed registry storage.
//!
//! Layout inside the registry directory:
//! - `registry.json`: the shared [`Registry`] document
//! - `<id>.json`: one standalone document per issued badge
//!
//! There is no locking between processes. Two concurrent issuers race on the
//! load-modify-save of `registry.json` and the last writer wins.

use crate::error::{BadgeError, Result};
use crate::models::badge::Badge;
use crate::models::registry::Registry;
use crate::utils::serialization::{from_json, to_pretty_json};
use log::{info, warn};
use serde::Serialize;
use std::fs;
use std::io::{ErrorKind, Write};
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

pub const REGISTRY_FILE: &str = "registry.json";
pub const BACKUP_FILE: &str = "registry.json.bak";

/// Mode for newly created registry and badge documents.
#[cfg(unix)]
const DOCUMENT_MODE: u32 = 0o644;

/// How the registry document was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The file existed and parsed.
    Clean,
    /// No file yet; a default document was synthesized.
    Missing,
    /// The file was unreadable and replaced with a default document.
    ///
    /// `backup` is where the bad content was moved, or `None` if the backup
    /// itself failed.
    Recovered {
        backup: Option<PathBuf>,
        reason: String,
    },
}

/// Registry directory handle.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    dir: PathBuf,
}

impl RegistryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn registry_path(&self) -> PathBuf {
        self.dir.join(REGISTRY_FILE)
    }

    pub fn backup_path(&self) -> PathBuf {
        self.dir.join(BACKUP_FILE)
    }

    /// Path of the standalone document for badge `id`.
    pub fn badge_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Reads the registry without modifying anything on disk.
    ///
    /// Missing or unreadable content yields a default document; the reason is
    /// returned in the outcome but nothing is backed up.
    pub fn read(&self) -> Result<(Registry, LoadOutcome)> {
        let path = self.registry_path();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok((Registry::default(), LoadOutcome::Missing));
            }
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Ok((
                    Registry::default(),
                    LoadOutcome::Recovered {
                        backup: None,
                        reason: e.to_string(),
                    },
                ));
            }
            Err(e) => return Err(BadgeError::io(&path, e)),
        };

        match from_json::<Registry>(&text) {
            Ok(registry) => Ok((registry, LoadOutcome::Clean)),
            Err(e) => Ok((
                Registry::default(),
                LoadOutcome::Recovered {
                    backup: None,
                    reason: e.to_string(),
                },
            )),
        }
    }

    /// Loads the registry for an issuance run.
    ///
    /// Creates the registry directory if needed. Unreadable content is moved
    /// to `registry.json.bak` (best-effort) and replaced by a default document.
    ///
    /// # Errors
    /// Only for I/O failures other than a missing or unparseable file.
    pub fn load(&self) -> Result<(Registry, LoadOutcome)> {
        fs::create_dir_all(&self.dir).map_err(|e| BadgeError::io(&self.dir, e))?;

        let (registry, outcome) = self.read()?;
        let reason = match outcome {
            LoadOutcome::Recovered { reason, .. } => reason,
            other => return Ok((registry, other)),
        };

        let backup = self.backup_path();
        let backup = match fs::rename(self.registry_path(), &backup) {
            Ok(()) => {
                warn!(
                    "{} was invalid ({}); backed up to {}",
                    REGISTRY_FILE,
                    reason,
                    backup.display()
                );
                Some(backup)
            }
            Err(e) => {
                warn!(
                    "failed to back up invalid {} ({}); continuing with a fresh file",
                    REGISTRY_FILE, e
                );
                None
            }
        };
        Ok((registry, LoadOutcome::Recovered { backup, reason }))
    }

    /// Writes the full registry document, replacing the previous one.
    pub fn save(&self, registry: &Registry) -> Result<PathBuf> {
        let path = self.registry_path();
        write_json_atomic(&path, registry)?;
        info!(
            "Saved registry with {} badge(s) to {}",
            registry.badges.len(),
            path.display()
        );
        Ok(path)
    }

    /// Writes the standalone `<id>.json` document for `badge`.
    pub fn write_badge(&self, badge: &Badge) -> Result<PathBuf> {
        let path = self.badge_path(&badge.id);
        write_json_atomic(&path, badge)?;
        info!("Wrote badge document {}", path.display());
        Ok(path)
    }
}

/// Serializes `value` and swaps it into place via a temp file + rename.
///
/// The replacement keeps the permissions of the file it overwrites; new files
/// get `0o644` so the verification site can read them.
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = to_pretty_json(value)?;
    let parent = path.parent().unwrap_or_else(|| Path::new("."));

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(|e| BadgeError::io(parent, e))?;
    #[cfg(unix)]
    {
        let permissions = match fs::metadata(path) {
            Ok(meta) => meta.permissions(),
            Err(_) => fs::Permissions::from_mode(DOCUMENT_MODE),
        };
        temp.as_file()
            .set_permissions(permissions)
            .map_err(|e| BadgeError::io(temp.path(), e))?;
    }
    temp.write_all(text.as_bytes())
        .map_err(|e| BadgeError::io(temp.path(), e))?;
    temp.persist(path)
        .map_err(|e| BadgeError::io(path, e.error))?;
    Ok(())
}
