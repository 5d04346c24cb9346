use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::infra::credential::CredentialError;
use crate::infra::git::GitError;
use crate::infra::pty::SessionError;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Not a git repository: {path}\n{diagnostic}")]
    NotARepository { path: PathBuf, diagnostic: String },

    #[error("No token stored for {0}\nRun `gsync token set` or set GITSYNC_TOKEN")]
    CredentialNotFound(String),

    #[error("Tokens do not match")]
    CredentialMismatch,

    #[error("Secret file {path} could not be {action}: {source}")]
    EphemeralFile {
        path: PathBuf,
        action: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("Push rejected by the remote:\n{transcript}")]
    PushRejected { transcript: String },

    #[error("{0}")]
    ToolInvocation(String),

    #[error("Timed out after {after:?} waiting for {waiting_for}")]
    Timeout {
        waiting_for: &'static str,
        after: Duration,
    },

    #[error("No git identity: user.email is not set")]
    MissingIdentity,

    #[error("Another push cycle is already running for {0}")]
    Busy(PathBuf),

    #[error("Lock file {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Credential(CredentialError),
}

pub type Result<T> = std::result::Result<T, SyncError>;

impl From<GitError> for SyncError {
    fn from(err: GitError) -> Self {
        match err {
            GitError::NotARepository { path, diagnostic } => {
                Self::NotARepository { path, diagnostic }
            }
            other => Self::ToolInvocation(other.to_string()),
        }
    }
}

impl From<SessionError> for SyncError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Timeout { waiting_for, after } => Self::Timeout { waiting_for, after },
            other => Self::ToolInvocation(other.to_string()),
        }
    }
}

impl From<CredentialError> for SyncError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::NotFound(identity) => Self::CredentialNotFound(identity),
            other => Self::Credential(other),
        }
    }
}
