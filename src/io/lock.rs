//! Lock file management for single-instance enforcement.
//!
//! The daemon holds an exclusive advisory lock on a file in the runtime
//! directory for its whole lifetime. The kernel drops the lock when the process
//! dies, so a leftover file from a crash never blocks the next start.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::constants::LOCK_FILE_NAME;

/// An acquired instance lock. Unlocked and removed on drop.
pub struct LockFile {
    file: File,
    path: PathBuf,
}

impl LockFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Default lock location: `$XDG_RUNTIME_DIR/sundim.lock`, falling back to `/tmp`.
pub fn default_lock_path() -> PathBuf {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(runtime_dir).join(LOCK_FILE_NAME)
}

/// Try to take the instance lock at `lock_path`.
///
/// # Returns
/// - `Ok(Some(lock))` if the lock was acquired; the file now holds our PID
/// - `Ok(None)` if another live process holds it
/// - `Err(_)` if the lock file could not be opened or written
pub fn acquire_lock(lock_path: &Path) -> Result<Option<LockFile>> {
    // Open without truncating so a running holder's PID stays readable
    let mut file = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)
        .with_context(|| format!("Failed to open lock file {}", lock_path.display()))?;

    if file.try_lock_exclusive().is_err() {
        return Ok(None);
    }

    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    writeln!(file, "{}", std::process::id())?;
    file.flush()?;

    Ok(Some(LockFile {
        file,
        path: lock_path.to_path_buf(),
    }))
}

/// PID recorded by the current lock holder, if readable.
pub fn read_lock_pid(lock_path: &Path) -> Option<u32> {
    std::fs::read_to_string(lock_path)
        .ok()?
        .lines()
        .next()?
        .trim()
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_second_acquire_is_refused_while_held() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(LOCK_FILE_NAME);

        let first = acquire_lock(&path).unwrap();
        assert!(first.is_some());
        assert_eq!(read_lock_pid(&path), Some(std::process::id()));

        assert!(acquire_lock(&path).unwrap().is_none());
    }

    #[test]
    fn test_lock_is_released_and_removed_on_drop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(LOCK_FILE_NAME);

        drop(acquire_lock(&path).unwrap());
        assert!(!path.exists());

        assert!(acquire_lock(&path).unwrap().is_some());
    }
}
