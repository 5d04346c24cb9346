//! Git error types.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GitError {
    #[error("Not a git repository: {path}\n{diagnostic}")]
    NotARepository { path: PathBuf, diagnostic: String },

    #[error("git {command} failed: {diagnostic}")]
    CommandFailed { command: String, diagnostic: String },

    #[error("IO error while running git: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GitError>;
