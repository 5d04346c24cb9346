use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::error::{Result, SyncError};

/// Exclusive advisory lock on one repository, held until dropped.
#[derive(Debug)]
pub struct RepoLock {
    file: File,
    path: PathBuf,
}

impl RepoLock {
    /// Take the lock for `repo_root` without waiting.
    ///
    /// Fails with [`SyncError::Busy`] while another holder exists.
    pub fn acquire(lock_dir: &Path, repo_root: &Path) -> Result<Self> {
        fs::create_dir_all(lock_dir).map_err(|source| SyncError::Lock {
            path: lock_dir.to_path_buf(),
            source,
        })?;

        let path = Self::lock_path(lock_dir, repo_root);
        let lock_error = |source| SyncError::Lock {
            path: path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(lock_error)?;

        if let Err(e) = FileExt::try_lock_exclusive(&file) {
            if is_contended(&e) {
                return Err(SyncError::Busy(repo_root.to_path_buf()));
            }
            return Err(lock_error(e));
        }

        // Record the owner for anyone inspecting the lock directory.
        file.set_len(0)
            .and_then(|()| writeln!(file, "{}", repo_root.display()))
            .map_err(lock_error)?;

        debug!(path = %path.display(), repo = %repo_root.display(), "repository lock acquired");
        Ok(Self { file, path })
    }

    /// Lock file for a repository: `<lock_dir>/<sha256 of root>.lock`.
    pub fn lock_path(lock_dir: &Path, repo_root: &Path) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(repo_root.to_string_lossy().as_bytes());
        lock_dir.join(format!("{:x}.lock", hasher.finalize()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

impl Drop for RepoLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        debug!(path = %self.path.display(), "repository lock released");
    }
}
