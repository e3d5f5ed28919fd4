//! Persistence gateway
//!
//! A [`StateBackend`] owns the physical representation of one state: it reads
//! the stored bytes, writes the pre-move backup and commits the new bytes.
//! The move engine never touches storage itself.

mod local;

pub use local::LocalBackend;

use statekit_fs::NormalizedPath;

use crate::backup::BackupRecord;

/// Storage for one state.
pub trait StateBackend: Send + Sync {
    /// Where the state lives, for diagnostics and same-store detection.
    fn location(&self) -> &NormalizedPath;

    /// Read the stored bytes, or `None` when nothing is stored yet.
    fn read(&self) -> statekit_fs::Result<Option<Vec<u8>>>;

    /// Back up `content`, the bytes previously returned by [`read`](Self::read).
    ///
    /// Returns `None` when this backend is configured without backups.
    fn write_backup(&self, content: &[u8]) -> statekit_fs::Result<Option<BackupRecord>>;

    /// Replace the stored state with `content`.
    ///
    /// Either the new content becomes visible in full or the old content
    /// stays in place.
    fn commit(&self, content: &[u8]) -> statekit_fs::Result<()>;
}
