//! Non-interactive git subcommands.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::debug;

use super::error::{GitError, Result};
use super::status::{RepositoryState, StatusFormat};

/// Trait for executing git subcommands.
/// Enables dependency injection for testing without spawning git.
pub trait GitRunner {
    /// Run `git <args>` with `cwd` as the working directory.
    fn run_git(&self, cwd: &Path, args: &[&str]) -> io::Result<Output>;

    /// Program name or path used for git, also used for the interactive push.
    fn program(&self) -> &str;
}

/// Production implementation that executes the real git binary.
#[derive(Debug, Clone)]
pub struct RealGitRunner {
    program: String,
}

impl RealGitRunner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for RealGitRunner {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitRunner for RealGitRunner {
    fn run_git(&self, cwd: &Path, args: &[&str]) -> io::Result<Output> {
        debug!(program = %self.program, ?args, cwd = %cwd.display(), "running git");
        // Status parsing relies on git's English wording.
        Command::new(&self.program)
            .current_dir(cwd)
            .env("LC_ALL", "C")
            .args(args)
            .output()
    }

    fn program(&self) -> &str {
        &self.program
    }
}

/// A working tree operated on through a [`GitRunner`].
pub struct GitRepo<'a, R: GitRunner + ?Sized> {
    runner: &'a R,
    path: PathBuf,
}

impl<'a, R: GitRunner + ?Sized> GitRepo<'a, R> {
    pub fn new(runner: &'a R, path: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn runner(&self) -> &'a R {
        self.runner
    }

    /// Run the status query and return its raw stdout.
    ///
    /// A failing query or empty output means the path is not a repository.
    pub fn status_text(&self, format: StatusFormat) -> Result<String> {
        let output = self.runner.run_git(&self.path, format.args())?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

        if !output.status.success() || stdout.trim().is_empty() {
            return Err(GitError::NotARepository {
                path: self.path.clone(),
                diagnostic: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(stdout)
    }

    /// Query status and parse it on top of `prior`.
    pub fn query_status(
        &self,
        format: StatusFormat,
        prior: &RepositoryState,
    ) -> Result<RepositoryState> {
        let raw = self.status_text(format)?;
        Ok(format.parse(&raw, prior))
    }

    /// Stage every change in the working tree (`git add .`).
    pub fn add_all(&self) -> Result<()> {
        self.run_checked(&["add", "."]).map(|_| ())
    }

    /// Create a commit and return git's summary output.
    pub fn commit(&self, message: &str) -> Result<String> {
        self.run_checked(&["commit", "-m", message])
    }

    /// Read a config value; `None` when the key is unset.
    pub fn config_get(&self, key: &str) -> Result<Option<String>> {
        let output = self.runner.run_git(&self.path, &["config", "--get", key])?;

        // git config exits with 1 when the key does not exist.
        if output.status.code() == Some(1) {
            return Ok(None);
        }
        if !output.status.success() {
            return Err(command_failed("config --get", &output));
        }

        let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(Some(value).filter(|v| !v.is_empty()))
    }

    /// Set a repository-local config value.
    pub fn config_set_local(&self, key: &str, value: &str) -> Result<()> {
        self.run_checked(&["config", "--local", key, value])
            .map(|_| ())
    }

    fn run_checked(&self, args: &[&str]) -> Result<String> {
        let output = self.runner.run_git(&self.path, args)?;
        if !output.status.success() {
            return Err(command_failed(args.first().copied().unwrap_or(""), &output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

fn command_failed(command: &str, output: &Output) -> GitError {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let diagnostic = if stderr.is_empty() {
        // git commit reports "nothing to commit" on stdout.
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    } else {
        stderr
    };
    GitError::CommandFailed {
        command: command.to_string(),
        diagnostic,
    }
}
