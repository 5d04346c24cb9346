pub mod config;
pub mod sync;
pub mod token;

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::infra::credential::KeyringStore;
use crate::infra::git::{RealGitRunner, resolve_repo_root};
use crate::shared::command::find_command_path;
use crate::shared::config::{Config, load_config};
use crate::shared::env_var::EnvVars;
use crate::sync::{SecretBridge, SyncError, SyncSettings};

/// Everything a command needs from the environment.
pub struct Context {
    pub config: Config,
    pub env: EnvVars,
    pub git: RealGitRunner,
}

impl Context {
    pub fn load() -> anyhow::Result<Self> {
        let config = load_config()?;
        Self::new(config, EnvVars::load())
    }

    fn new(config: Config, env: EnvVars) -> anyhow::Result<Self> {
        if find_command_path(&config.git.program).is_none() {
            return Err(SyncError::ToolInvocation(format!(
                "git executable not found: {}",
                config.git.program
            ))
            .into());
        }
        let git = RealGitRunner::new(&config.git.program);
        Ok(Self { config, env, git })
    }

    /// Working tree root containing `path` (default: current directory).
    pub fn repo_root(&self, path: Option<&Path>) -> anyhow::Result<PathBuf> {
        let path = path.unwrap_or(Path::new("."));
        Ok(resolve_repo_root(path).map_err(SyncError::from)?)
    }

    pub fn store(&self) -> KeyringStore {
        KeyringStore::new(&self.config.credential.service)
    }

    pub fn bridge(&self) -> anyhow::Result<SecretBridge> {
        let secret_file = &self.config.secret_file;
        let path = secret_file
            .resolved_path()
            .context("Cannot determine the secret file path: HOME is not set")?;
        Ok(SecretBridge::new(
            path,
            &secret_file.env_var,
            &secret_file.credential_store,
        ))
    }

    pub fn settings(&self) -> anyhow::Result<SyncSettings> {
        let lock_dir = self
            .config
            .lock
            .resolved_dir()
            .context("Cannot determine the lock directory: HOME is not set")?;
        Ok(SyncSettings {
            status_format: self.config.git.status_format,
            default_message: self.config.commit.default_message.clone(),
            lock_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::git::test_utils::TempRepo;
    use std::fs;

    fn env() -> EnvVars {
        EnvVars {
            token: None,
            log: None,
        }
    }

    #[test]
    fn missing_git_program_is_a_tool_invocation_error() {
        let mut config = Config::default();
        config.git.program = "/nonexistent/bin/git".to_string();

        let err = Context::new(config, env()).err().unwrap();

        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::ToolInvocation(msg)) if msg.contains("/nonexistent/bin/git")
        ));
    }

    #[test]
    fn repo_root_resolves_from_subdirectory() {
        let temp = TempRepo::new("main");
        let sub = temp.path().join("src");
        fs::create_dir(&sub).unwrap();
        let ctx = Context::new(Config::default(), env()).unwrap();

        assert_eq!(ctx.repo_root(Some(&sub)).unwrap(), temp.path());
    }

    #[test]
    fn repo_root_outside_repository_is_not_a_repository() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::new(Config::default(), env()).unwrap();

        let err = ctx.repo_root(Some(dir.path())).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::NotARepository { .. })
        ));
    }

    #[test]
    fn settings_follow_config() {
        let mut config = Config::default();
        config.lock.dir = Some(PathBuf::from("/tmp/gsync-locks"));
        config.commit.default_message = "wip".to_string();
        let ctx = Context::new(config, env()).unwrap();

        let settings = ctx.settings().unwrap();

        assert_eq!(settings.lock_dir, PathBuf::from("/tmp/gsync-locks"));
        assert_eq!(settings.default_message, "wip");
    }
}
