//! Repository discovery.

use std::path::{Path, PathBuf};

use git2::{Repository, RepositoryOpenFlags};

use super::error::{GitError, Result};

/// Open the repository containing `path`, searching parent directories.
pub fn open_repo_at(path: &Path) -> Result<Repository> {
    Repository::open_ext(path, RepositoryOpenFlags::empty(), std::iter::empty::<&Path>()).map_err(
        |e| GitError::NotARepository {
            path: path.to_path_buf(),
            diagnostic: e.message().to_string(),
        },
    )
}

/// Resolve the working tree root for `path`.
///
/// Used as the identity of a repository (for locking), so the result is
/// canonicalized and free of a trailing separator.
pub fn resolve_repo_root(path: &Path) -> Result<PathBuf> {
    let repo = open_repo_at(path)?;

    let workdir = repo.workdir().ok_or_else(|| GitError::NotARepository {
        path: path.to_path_buf(),
        diagnostic: "bare repositories have no working tree".to_string(),
    })?;

    Ok(workdir.canonicalize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::git::test_utils::TempRepo;

    #[test]
    fn resolve_repo_root_from_subdirectory() {
        let temp = TempRepo::new("main");
        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let root = resolve_repo_root(&nested).unwrap();

        assert_eq!(root, temp.path());
    }

    #[test]
    fn resolve_repo_root_outside_repository_fails() {
        let dir = tempfile::tempdir().unwrap();

        let err = resolve_repo_root(dir.path()).unwrap_err();

        assert!(matches!(err, GitError::NotARepository { .. }));
    }

    #[test]
    fn resolve_repo_root_rejects_bare_repository() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init_bare(dir.path()).unwrap();

        let err = resolve_repo_root(dir.path()).unwrap_err();

        assert!(matches!(err, GitError::NotARepository { .. }));
    }
}
