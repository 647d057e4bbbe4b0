// backuptool/src/utils/lock.rs
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::errors::{BackupError, Result};

const LOCK_FILE_NAME: &str = ".backup.lock";

/// Guard against overlapping runs.
///
/// The scheduler and a manual trigger can fire at the same time; whichever run
/// creates `<backup_root>/.backup.lock` first wins, the other is denied. The
/// lock file is removed when the guard drops. A lock left behind by a crashed
/// run has to be removed by the operator.
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    pub fn acquire(backup_root: &Path) -> Result<Self> {
        fs::create_dir_all(backup_root)?;
        let path = backup_root.join(LOCK_FILE_NAME);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                let _ = writeln!(file, "pid {}", std::process::id());
                Ok(RunLock { path })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(BackupError::Config(format!(
                "Another backup run appears to be in progress (lock file {} exists). \
                 Remove it manually if the previous run crashed.",
                path.display()
            ))),
            Err(e) => Err(BackupError::Io(e)),
        }
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_second_acquire_is_denied_while_held() -> Result<()> {
        let dir = TempDir::new()?;
        let _held = RunLock::acquire(dir.path())?;
        assert!(RunLock::acquire(dir.path()).is_err());
        Ok(())
    }

    #[test]
    fn test_lock_is_released_on_drop() -> Result<()> {
        let dir = TempDir::new()?;
        let lock_path = dir.path().join(LOCK_FILE_NAME);
        {
            let _held = RunLock::acquire(dir.path())?;
            assert!(lock_path.exists());
        }
        assert!(!lock_path.exists());
        // and a fresh acquire succeeds again
        let _relock = RunLock::acquire(dir.path())?;
        Ok(())
    }

    #[test]
    fn test_acquire_creates_backup_root() -> Result<()> {
        let dir = TempDir::new()?;
        let root = dir.path().join("backups");
        let _held = RunLock::acquire(&root)?;
        assert!(root.is_dir());
        Ok(())
    }
}
