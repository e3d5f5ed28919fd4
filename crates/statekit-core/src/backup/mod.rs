//! Pre-move backups
//!
//! Before a state is rewritten, the exact bytes read at load time are copied
//! to a backup file. A backup never replaces an existing file.

use chrono::{DateTime, Utc};
use statekit_fs::io::{write_atomic, write_new};
use statekit_fs::{Error as FsError, NormalizedPath, compute_checksum};

/// Suffix of derived backup names
pub const DEFAULT_BACKUP_SUFFIX: &str = ".backup";

/// Attempts at finding a free derived name before giving up
const MAX_DERIVED_ATTEMPTS: u32 = 1000;

/// Where, if anywhere, a state's backup is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupPolicy {
    /// Write no backup
    Disabled,
    /// Write the backup to this exact path, replacing any file there
    Explicit(NormalizedPath),
    /// Write `<state path>.<unix seconds><suffix>` beside the state
    Derived { suffix: String },
}

impl Default for BackupPolicy {
    fn default() -> Self {
        Self::Derived {
            suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
        }
    }
}

/// A backup that was written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRecord {
    pub path: NormalizedPath,
    /// Checksum of the backed up bytes
    pub checksum: String,
    pub created: DateTime<Utc>,
}

impl BackupPolicy {
    /// Back up `content`, the current bytes of the state at `state_path`.
    ///
    /// Returns `None` when backups are disabled.
    pub fn write(
        &self,
        state_path: &NormalizedPath,
        content: &[u8],
    ) -> statekit_fs::Result<Option<BackupRecord>> {
        let created = Utc::now();
        let path = match self {
            Self::Disabled => return Ok(None),
            Self::Explicit(path) => {
                write_atomic(path, content)?;
                path.clone()
            }
            Self::Derived { suffix } => write_derived(state_path, suffix, created, content)?,
        };

        tracing::info!(state = %state_path, backup = %path, "wrote state backup");
        Ok(Some(BackupRecord {
            path,
            checksum: compute_checksum(content),
            created,
        }))
    }
}

fn write_derived(
    state_path: &NormalizedPath,
    suffix: &str,
    created: DateTime<Utc>,
    content: &[u8],
) -> statekit_fs::Result<NormalizedPath> {
    let stem = state_path.with_suffix(&format!(".{}", created.timestamp()));

    let mut candidate = stem.with_suffix(suffix);
    for attempt in 1..=MAX_DERIVED_ATTEMPTS {
        match write_new(&candidate, content) {
            Ok(()) => return Ok(candidate),
            Err(FsError::AlreadyExists { .. }) => {
                tracing::debug!(path = %candidate, "backup name taken, trying the next one");
                candidate = stem.with_suffix(&format!(".{attempt}{suffix}"));
            }
            Err(e) => return Err(e),
        }
    }
    Err(FsError::AlreadyExists {
        path: candidate.to_native(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn disabled_writes_nothing() {
        let dir = tempdir().unwrap();
        let state = NormalizedPath::new(dir.path().join("terraform.tfstate"));

        let record = BackupPolicy::Disabled.write(&state, b"{}").unwrap();

        assert!(record.is_none());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn explicit_writes_named_file() {
        let dir = tempdir().unwrap();
        let state = NormalizedPath::new(dir.path().join("terraform.tfstate"));
        let target = NormalizedPath::new(dir.path().join("saved.json"));

        let record = BackupPolicy::Explicit(target.clone())
            .write(&state, b"original")
            .unwrap()
            .unwrap();

        assert_eq!(record.path, target);
        assert_eq!(record.checksum, compute_checksum(b"original"));
        assert_eq!(fs::read(target.to_native()).unwrap(), b"original");
    }

    #[test]
    fn derived_name_sits_beside_state() {
        let dir = tempdir().unwrap();
        let state = NormalizedPath::new(dir.path().join("terraform.tfstate"));

        let record = BackupPolicy::default().write(&state, b"v1").unwrap().unwrap();

        let name = record.path.file_name().unwrap();
        assert!(name.starts_with("terraform.tfstate."), "got {name}");
        assert!(name.ends_with(".backup"), "got {name}");
        assert_eq!(record.path.parent(), state.parent());
    }

    #[test]
    fn derived_backups_never_overwrite_each_other() {
        let dir = tempdir().unwrap();
        let state = NormalizedPath::new(dir.path().join("terraform.tfstate"));
        let policy = BackupPolicy::default();

        let first = policy.write(&state, b"first").unwrap().unwrap();
        let second = policy.write(&state, b"second").unwrap().unwrap();

        assert_ne!(first.path, second.path);
        assert_eq!(fs::read(first.path.to_native()).unwrap(), b"first");
        assert_eq!(fs::read(second.path.to_native()).unwrap(), b"second");
    }
}
