//! Git access.
//!
//! Working-tree operations go through the git CLI ([`GitRunner`]) because
//! status parsing and the credential manager bridge depend on it.
//! Repository discovery uses git2 (libgit2).

mod error;
mod repo;
mod runner;
pub mod status;
#[cfg(test)]
pub mod test_utils;

pub use error::GitError;
pub use repo::resolve_repo_root;
pub use runner::{GitRepo, GitRunner, RealGitRunner};
pub use status::{RepositoryState, StatusFormat};
