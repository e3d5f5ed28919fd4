//! State files on the local filesystem

use statekit_fs::NormalizedPath;
use statekit_fs::io::{read_locked, write_atomic};

use super::StateBackend;
use crate::backup::{BackupPolicy, BackupRecord};

/// A state stored in a single local file.
///
/// Reads hold a shared lock; commits go through a locked temp file that is
/// renamed over the state.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    path: NormalizedPath,
    backup: BackupPolicy,
}

impl LocalBackend {
    /// A backend for `path` with derived backups.
    pub fn new(path: impl Into<NormalizedPath>) -> Self {
        Self {
            path: path.into(),
            backup: BackupPolicy::default(),
        }
    }

    pub fn with_backup(mut self, backup: BackupPolicy) -> Self {
        self.backup = backup;
        self
    }
}

impl StateBackend for LocalBackend {
    fn location(&self) -> &NormalizedPath {
        &self.path
    }

    fn read(&self) -> statekit_fs::Result<Option<Vec<u8>>> {
        match read_locked(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write_backup(&self, content: &[u8]) -> statekit_fs::Result<Option<BackupRecord>> {
        self.backup.write(&self.path, content)
    }

    fn commit(&self, content: &[u8]) -> statekit_fs::Result<()> {
        write_atomic(&self.path, content)?;
        tracing::info!(path = %self.path, bytes = content.len(), "committed state");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn read_missing_file_is_none() {
        let dir = tempdir().unwrap();
        let backend = LocalBackend::new(dir.path().join("terraform.tfstate"));

        assert_eq!(backend.read().unwrap(), None);
    }

    #[test]
    fn commit_then_read() {
        let dir = tempdir().unwrap();
        let backend = LocalBackend::new(dir.path().join("nested").join("out.tfstate"));

        backend.commit(b"{\"version\": 4}\n").unwrap();

        assert!(backend.location().is_file());
        assert_eq!(backend.read().unwrap().unwrap(), b"{\"version\": 4}\n");
    }

    #[test]
    fn backup_follows_policy() {
        let dir = tempdir().unwrap();
        let backend = LocalBackend::new(dir.path().join("terraform.tfstate"))
            .with_backup(BackupPolicy::Disabled);

        assert!(backend.write_backup(b"{}").unwrap().is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
