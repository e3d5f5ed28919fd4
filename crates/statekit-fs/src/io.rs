//! Atomic I/O operations with file locking

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::Path;

use fs2::FileExt;

use crate::{Error, NormalizedPath, Result};

/// Write content atomically to a file with locking.
///
/// Uses write-to-temp-then-rename strategy to prevent partial writes.
/// Acquires an advisory lock to prevent concurrent access.
pub fn write_atomic(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    let native_path = path.to_native();

    if let Some(parent) = native_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    // Temp file lives beside the target so the rename stays on one filesystem
    let temp_name = format!(
        ".{}.{}.tmp",
        native_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = native_path.with_file_name(&temp_name);

    let temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    if let Err(e) = fill_and_rename(temp_file, &temp_path, &native_path, content) {
        if let Err(cleanup) = fs::remove_file(&temp_path) {
            tracing::warn!(path = %temp_path.display(), error = %cleanup, "could not remove temp file");
        }
        return Err(e);
    }

    tracing::trace!(path = %path, bytes = content.len(), "wrote file atomically");
    Ok(())
}

/// Write, sync and unlock the temp file, then move it over `target`.
///
/// The temp file handle is closed before returning.
fn fill_and_rename(
    mut temp_file: File,
    temp_path: &Path,
    target: &Path,
    content: &[u8],
) -> Result<()> {
    temp_file.lock_exclusive().map_err(|_| Error::LockFailed {
        path: target.to_path_buf(),
    })?;

    temp_file
        .write_all(content)
        .map_err(|e| Error::io(temp_path, e))?;
    temp_file.sync_all().map_err(|e| Error::io(temp_path, e))?;

    temp_file.unlock().map_err(|_| Error::LockFailed {
        path: target.to_path_buf(),
    })?;
    drop(temp_file);

    fs::rename(temp_path, target).map_err(|e| Error::io(target, e))
}

/// Write content to a path that must not exist yet.
///
/// Fails with [`Error::AlreadyExists`] instead of replacing an existing file.
pub fn write_new(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    let native_path = path.to_native();

    if let Some(parent) = native_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let mut file = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&native_path)
    {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            return Err(Error::AlreadyExists { path: native_path });
        }
        Err(e) => return Err(Error::io(&native_path, e)),
    };

    file.lock_exclusive().map_err(|_| Error::LockFailed {
        path: native_path.clone(),
    })?;
    file.write_all(content)
        .map_err(|e| Error::io(&native_path, e))?;
    file.sync_all().map_err(|e| Error::io(&native_path, e))?;

    Ok(())
}

/// Read the full contents of a file while holding a shared lock.
///
/// Reads through the locked handle so a concurrent atomic writer cannot
/// interleave with the read.
pub fn read_locked(path: &NormalizedPath) -> Result<Vec<u8>> {
    let native_path = path.to_native();
    let file = File::open(&native_path).map_err(|e| Error::io(&native_path, e))?;

    file.lock_shared().map_err(|_| Error::LockFailed {
        path: native_path.clone(),
    })?;

    let mut content = Vec::new();
    (&file)
        .read_to_end(&mut content)
        .map_err(|e| Error::io(&native_path, e))?;

    // Lock released when file is dropped
    Ok(content)
}

/// Whether two paths name the same file on disk.
///
/// Paths that do not exist are compared by their normalized text.
pub fn same_file(a: &NormalizedPath, b: &NormalizedPath) -> bool {
    if a == b {
        return true;
    }
    match (dunce::canonicalize(a.to_native()), dunce::canonicalize(b.to_native())) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
