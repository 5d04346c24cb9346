//! Hands the secret to git's credential helper through a short-lived file.

use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use super::error::{Result, SyncError};
use crate::infra::git::{GitRepo, GitRunner};

/// Where the secret file goes and how git is pointed at it.
#[derive(Debug, Clone)]
pub struct SecretBridge {
    path: PathBuf,
    env_var: String,
    credential_store: String,
}

impl SecretBridge {
    pub fn new(
        path: impl Into<PathBuf>,
        env_var: impl Into<String>,
        credential_store: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            env_var: env_var.into(),
            credential_store: credential_store.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove a file left behind by an interrupted push.
    ///
    /// Only call this while holding the lock for [`path`](Self::path);
    /// otherwise the file may belong to a push still in progress.
    pub fn clear_stale(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                warn!(path = %self.path.display(), "removed secret file left by an interrupted push");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(SyncError::EphemeralFile {
                path: self.path.clone(),
                action: "removed",
                source,
            }),
        }
    }

    /// Write `secret` to the configured path and select the credential store.
    ///
    /// The file is created fresh with owner-only permissions. An existing
    /// file at the path is never reused or overwritten.
    pub fn materialize<R: GitRunner + ?Sized>(
        &self,
        git: &GitRepo<'_, R>,
        secret: &str,
    ) -> Result<EphemeralSecretFile> {
        git.config_set_local("credential.credentialStore", &self.credential_store)?;
        write_secret(&self.path, secret)?;
        info!(path = %self.path.display(), "secret file created");

        Ok(EphemeralSecretFile {
            path: self.path.clone(),
            env_var: self.env_var.clone(),
            state: ReleaseState::Held,
        })
    }
}

fn write_secret(path: &Path, secret: &str) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).map_err(|source| SyncError::EphemeralFile {
        path: path.to_path_buf(),
        action: "created",
        source,
    })?;

    if let Err(source) = file.write_all(secret.as_bytes()).and_then(|()| file.sync_all()) {
        drop(file);
        let _ = fs::remove_file(path);
        return Err(SyncError::EphemeralFile {
            path: path.to_path_buf(),
            action: "written",
            source,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReleaseState {
    Held,
    Released,
    /// Removal was attempted and failed; already reported.
    Failed,
}

/// The secret on disk. Removed by [`release`](Self::release) or on drop.
#[derive(Debug)]
pub struct EphemeralSecretFile {
    path: PathBuf,
    env_var: String,
    state: ReleaseState,
}

impl EphemeralSecretFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Environment pair for the push child only.
    pub fn env(&self) -> (String, OsString) {
        (self.env_var.clone(), self.path.clone().into_os_string())
    }

    /// Delete the file. Calling this again after success is a no-op.
    pub fn release(&mut self) -> Result<()> {
        if self.state == ReleaseState::Released {
            return Ok(());
        }

        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                self.state = ReleaseState::Failed;
                return Err(SyncError::EphemeralFile {
                    path: self.path.clone(),
                    action: "removed",
                    source,
                });
            }
        }

        self.state = ReleaseState::Released;
        debug!(path = %self.path.display(), "secret file removed");
        Ok(())
    }
}

impl Drop for EphemeralSecretFile {
    fn drop(&mut self) {
        if self.state != ReleaseState::Held {
            return;
        }
        if let Err(e) = self.release() {
            report_release_failure(&self.path, &e);
        }
    }
}

/// Log a failed removal and warn the user on stderr.
pub fn report_release_failure(path: &Path, err: &SyncError) {
    error!(path = %path.display(), error = %err, "failed to remove secret file");
    eprintln!(
        "WARNING: the token file {} could not be deleted ({err}). Delete it manually.",
        path.display()
    );
}
