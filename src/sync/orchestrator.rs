use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::error::{Result, SyncError};
use super::identity::Identity;
use super::lock::RepoLock;
use super::secret_file::{SecretBridge, report_release_failure};
use crate::infra::credential::CredentialStore;
use crate::infra::git::{GitRepo, GitRunner, RepositoryState, StatusFormat};
use crate::infra::pty::{AuthSession, PushRequest, Transcript};

/// Output markers git prints when the remote refuses an update.
const REJECTION_MARKERS: [&str; 3] = ["[rejected]", "[remote rejected]", "failed to push some refs"];

/// Where a repository stands relative to its remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Clean,
    CommitPending,
    PushPending,
    CommitAndPushPending,
}

impl SyncState {
    pub fn of(state: &RepositoryState) -> Self {
        match (state.commit_needed, state.push_needed) {
            (false, false) => Self::Clean,
            (true, false) => Self::CommitPending,
            (false, true) => Self::PushPending,
            (true, true) => Self::CommitAndPushPending,
        }
    }

    pub fn needs_commit(self) -> bool {
        matches!(self, Self::CommitPending | Self::CommitAndPushPending)
    }

    /// A new commit always leaves something to push.
    pub fn after_commit(self) -> Self {
        match self {
            Self::CommitPending | Self::CommitAndPushPending => Self::PushPending,
            other => other,
        }
    }
}

#[derive(Debug)]
pub enum PushOutcome {
    /// Nothing to commit or push; no secret was touched.
    AlreadyClean(RepositoryState),
    Pushed {
        state: RepositoryState,
        /// Summary printed by `git commit`, when a commit was made.
        committed: Option<String>,
        transcript: Transcript,
        /// Set when the secret file outlived the push.
        release_warning: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub status_format: StatusFormat,
    pub default_message: String,
    pub lock_dir: PathBuf,
}

/// Per-invocation inputs of a push cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct PushOptions<'a> {
    pub message: Option<&'a str>,
    /// Stored under the identity before use.
    pub inline_secret: Option<&'a str>,
}

/// Drives status, staging, committing and the authenticated push.
pub struct SyncOrchestrator<'a, G, C, S>
where
    G: GitRunner + ?Sized,
    C: CredentialStore + ?Sized,
    S: AuthSession + ?Sized,
{
    git: &'a G,
    store: &'a C,
    session: &'a S,
    bridge: &'a SecretBridge,
    settings: SyncSettings,
}

impl<'a, G, C, S> SyncOrchestrator<'a, G, C, S>
where
    G: GitRunner + ?Sized,
    C: CredentialStore + ?Sized,
    S: AuthSession + ?Sized,
{
    pub fn new(
        git: &'a G,
        store: &'a C,
        session: &'a S,
        bridge: &'a SecretBridge,
        settings: SyncSettings,
    ) -> Self {
        Self {
            git,
            store,
            session,
            bridge,
            settings,
        }
    }

    pub fn repo(&self, path: &Path) -> GitRepo<'a, G> {
        GitRepo::new(self.git, path)
    }

    pub fn status(&self, path: &Path) -> Result<RepositoryState> {
        let state = self
            .repo(path)
            .query_status(self.settings.status_format, &RepositoryState::initial())?;
        info!(
            branch = %state.branch,
            commit_needed = state.commit_needed,
            push_needed = state.push_needed,
            "repository status"
        );
        Ok(state)
    }

    pub fn add(&self, path: &Path) -> Result<()> {
        self.repo(path).add_all()?;
        debug!(repo = %path.display(), "staged all changes");
        Ok(())
    }

    /// Stage everything and commit; returns git's summary.
    pub fn commit(&self, path: &Path, message: Option<&str>) -> Result<String> {
        let git = self.repo(path);
        git.add_all()?;
        let message = message.unwrap_or(&self.settings.default_message);
        let summary = git.commit(message)?;
        info!(repo = %path.display(), message, "committed");
        Ok(summary)
    }

    /// Bring the repository in sync with its remote.
    ///
    /// `identity` is only called when there is work to do, so a clean
    /// repository never prompts.
    pub fn push<F>(&self, path: &Path, options: PushOptions<'_>, identity: F) -> Result<PushOutcome>
    where
        F: FnOnce(&GitRepo<'a, G>) -> Result<Identity>,
    {
        let _lock = RepoLock::acquire(&self.settings.lock_dir, path)?;

        let git = self.repo(path);
        let mut state = git.query_status(self.settings.status_format, &RepositoryState::initial())?;
        let mut sync_state = SyncState::of(&state);
        info!(repo = %path.display(), ?sync_state, "push cycle started");

        if sync_state == SyncState::Clean {
            return Ok(PushOutcome::AlreadyClean(state));
        }

        let identity = identity(&git)?;
        identity.validate()?;

        let mut committed = None;
        if sync_state.needs_commit() {
            let message = options.message.unwrap_or(&self.settings.default_message);
            git.add_all()?;
            committed = Some(git.commit(message)?);
            sync_state = sync_state.after_commit();
            state.commit_needed = false;
            state.push_needed = true;
            debug!(?sync_state, "commit created");
        }

        let secret = self.resolve_secret(&identity, options.inline_secret)?;
        let (transcript, release_warning) = self.push_with_secret(&git, &identity, &secret)?;
        let transcript = check_transcript(transcript)?;

        state.push_needed = false;
        info!(repo = %path.display(), "push completed");
        Ok(PushOutcome::Pushed {
            state,
            committed,
            transcript,
            release_warning,
        })
    }

    fn resolve_secret(&self, identity: &Identity, inline: Option<&str>) -> Result<String> {
        if let Some(secret) = inline.filter(|s| !s.is_empty()) {
            self.store.put(&identity.email, secret)?;
            info!(identity = %identity.email, "stored supplied token");
            return Ok(secret.to_string());
        }
        Ok(self.store.get(&identity.email)?)
    }

    /// Run the interactive push with the secret file in place.
    ///
    /// The file is removed before the session result is inspected.
    fn push_with_secret(
        &self,
        git: &GitRepo<'a, G>,
        identity: &Identity,
        secret: &str,
    ) -> Result<(Transcript, Option<String>)> {
        // One secret file serves every repository; guard it across cycles.
        let _bridge_lock = RepoLock::acquire(&self.settings.lock_dir, self.bridge.path())?;
        self.bridge.clear_stale()?;
        let mut secret_file = self.bridge.materialize(git, secret)?;

        let request = PushRequest {
            program: self.git.program(),
            args: vec!["push".to_string()],
            cwd: git.path(),
            // Rejection markers are matched in git's untranslated wording.
            env: vec![
                secret_file.env(),
                ("LC_ALL".to_string(), OsString::from("C")),
            ],
            identity: &identity.email,
            secret,
        };
        let result = self.session.run(&request);

        let release_warning = match secret_file.release() {
            Ok(()) => None,
            Err(e) => {
                report_release_failure(secret_file.path(), &e);
                Some(e.to_string())
            }
        };

        Ok((result?, release_warning))
    }
}

/// Map a finished push to success, rejection or tool failure.
pub fn check_transcript(transcript: Transcript) -> Result<Transcript> {
    if REJECTION_MARKERS
        .iter()
        .any(|marker| transcript.output.contains(marker))
    {
        warn!(exit_code = transcript.exit_code, "push rejected by remote");
        return Err(SyncError::PushRejected {
            transcript: transcript.output,
        });
    }
    if !transcript.success {
        return Err(SyncError::ToolInvocation(format!(
            "git push exited with status {}:\n{}",
            transcript.exit_code,
            transcript.output.trim()
        )));
    }
    Ok(transcript)
}
