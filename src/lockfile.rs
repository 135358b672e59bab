//! Atomic index updates via a sibling `.lock` file. Grounded on
//! cNameHitch-gitr's `LockFile::acquire`/`commit` (git-index/src/write.rs):
//! exclusively create the lock, write the new content into it, then rename
//! it over the target to commit. Any failure before `commit()` unlinks the
//! lock rather than leaving it behind.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::DircacheError;

pub struct LockFile {
    lock_path: PathBuf,
    target_path: PathBuf,
    file: Option<File>,
    committed: bool,
}

impl LockFile {
    /// Exclusively create `<target>.lock`. Fails with `LockHeld` if another
    /// writer already holds it.
    pub fn acquire(target_path: impl Into<PathBuf>) -> Result<Self, DircacheError> {
        let target_path = target_path.into();
        let mut lock_path = target_path.clone().into_os_string();
        lock_path.push(".lock");
        let lock_path = PathBuf::from(lock_path);

        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent).map_err(|e| DircacheError::io(parent, e))?;
        }

        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::AlreadyExists {
                    DircacheError::LockHeld
                } else {
                    DircacheError::io(&lock_path, e)
                }
            })?;

        Ok(LockFile {
            lock_path,
            target_path,
            file: Some(file),
            committed: false,
        })
    }

    pub fn write_all(&mut self, data: &[u8]) -> Result<(), DircacheError> {
        let file = self
            .file
            .as_mut()
            .expect("write_all called after commit");
        file.write_all(data).map_err(|e| DircacheError::io(&self.lock_path, e))
    }

    /// Flush, close, and rename the lock file into place over the target.
    pub fn commit(mut self) -> Result<(), DircacheError> {
        let file = self.file.take().expect("commit called twice");
        file.sync_all().map_err(|e| DircacheError::io(&self.lock_path, e))?;
        drop(file);
        fs::rename(&self.lock_path, &self.target_path)
            .map_err(|e| DircacheError::io(&self.target_path, e))?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.lock_path);
        }
    }
}

/// Whether a lock is currently held for `target_path`, without attempting
/// to acquire it.
pub fn is_locked(target_path: &Path) -> bool {
    let mut lock_path = target_path.as_os_str().to_owned();
    lock_path.push(".lock");
    Path::new(&lock_path).exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_renames_lock_over_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("index");

        let mut lock = LockFile::acquire(&target).unwrap();
        lock.write_all(b"hello").unwrap();
        lock.commit().unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"hello");
        assert!(!target.with_extension("lock").exists());
    }

    #[test]
    fn second_acquire_fails_while_first_is_held() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("index");

        let _lock = LockFile::acquire(&target).unwrap();
        assert!(matches!(
            LockFile::acquire(&target),
            Err(DircacheError::LockHeld)
        ));
    }

    #[test]
    fn dropping_without_commit_removes_lock() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("index");
        let lock_path = {
            let mut p = target.as_os_str().to_owned();
            p.push(".lock");
            PathBuf::from(p)
        };

        {
            let _lock = LockFile::acquire(&target).unwrap();
            assert!(lock_path.exists());
        }

        assert!(!lock_path.exists());
    }

    #[test]
    fn is_locked_reflects_outstanding_lock() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("index");
        assert!(!is_locked(&target));
        let _lock = LockFile::acquire(&target).unwrap();
        assert!(is_locked(&target));
    }
}
