use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use super::Context;
use crate::infra::credential::KeyringStore;
use crate::infra::git::{RealGitRunner, RepositoryState};
use crate::infra::pty::PtyAuthSession;
use crate::shared::prompt;
use crate::sync::{Identity, PushOptions, PushOutcome, SyncOrchestrator};

#[derive(Args, Clone, PartialEq, Eq)]
pub struct StatusArgs {
    /// Repository path (default: current directory)
    pub path: Option<PathBuf>,

    /// Print the state as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone, PartialEq, Eq)]
pub struct AddArgs {
    /// Repository path (default: current directory)
    pub path: Option<PathBuf>,
}

#[derive(Args, Clone, PartialEq, Eq)]
pub struct CommitArgs {
    /// Repository path (default: current directory)
    pub path: Option<PathBuf>,

    /// Commit message (default: commit.default_message from config)
    #[arg(short, long)]
    pub message: Option<String>,
}

#[derive(Args, Clone, PartialEq, Eq)]
pub struct PushArgs {
    /// Repository path (default: current directory)
    pub path: Option<PathBuf>,

    /// Message for the commit created when the tree is dirty
    #[arg(short, long)]
    pub message: Option<String>,
}

impl StatusArgs {
    pub fn run(&self) -> anyhow::Result<()> {
        let ctx = Context::load()?;
        let root = ctx.repo_root(self.path.as_deref())?;
        let state = with_orchestrator(&ctx, |o| Ok(o.status(&root)?))?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&state)?);
        } else {
            print!("{}", format_state(&state));
        }
        Ok(())
    }
}

impl AddArgs {
    pub fn run(&self) -> anyhow::Result<()> {
        let ctx = Context::load()?;
        let root = ctx.repo_root(self.path.as_deref())?;
        with_orchestrator(&ctx, |o| Ok(o.add(&root)?))
    }
}

impl CommitArgs {
    pub fn run(&self) -> anyhow::Result<()> {
        let ctx = Context::load()?;
        let root = ctx.repo_root(self.path.as_deref())?;
        let summary = with_orchestrator(&ctx, |o| {
            Identity::resolve(&o.repo(&root), prompt::prompt_line)?;
            Ok(o.commit(&root, self.message.as_deref())?)
        })?;
        println!("{summary}");
        Ok(())
    }
}

impl PushArgs {
    pub fn run(&self) -> anyhow::Result<()> {
        let ctx = Context::load()?;
        let root = ctx.repo_root(self.path.as_deref())?;
        let options = PushOptions {
            message: self.message.as_deref(),
            inline_secret: ctx.env.token.as_deref(),
        };

        let spinner = spinner("Syncing with remote...");
        let outcome = with_orchestrator(&ctx, |o| {
            Ok(o.push(&root, options, |git| {
                spinner.suspend(|| Identity::resolve(git, prompt::prompt_line))
            })?)
        });
        spinner.finish_and_clear();

        match outcome? {
            PushOutcome::AlreadyClean(state) => {
                println!("Nothing to commit or push on {}", state.branch);
            }
            PushOutcome::Pushed {
                state,
                committed,
                transcript,
                ..
            } => {
                if let Some(summary) = committed {
                    println!("{summary}");
                }
                let output = transcript.output.trim();
                if !output.is_empty() {
                    eprintln!("{output}");
                }
                println!("Pushed {} to {}", state.branch, state.remote_name);
            }
        }
        Ok(())
    }
}

/// Build an orchestrator from the loaded config and hand it to `f`.
fn with_orchestrator<T>(
    ctx: &Context,
    f: impl FnOnce(&SyncOrchestrator<'_, RealGitRunner, KeyringStore, PtyAuthSession>) -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    let store = ctx.store();
    let session = PtyAuthSession::from_config(&ctx.config.session)?;
    let bridge = ctx.bridge()?;
    let orchestrator = SyncOrchestrator::new(&ctx.git, &store, &session, &bridge, ctx.settings()?);
    f(&orchestrator)
}

fn spinner(message: &'static str) -> ProgressBar {
    if !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let s = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // static template string
    s.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("{spinner} {msg}")
            .expect("valid template"),
    );
    s.set_message(message);
    s.enable_steady_tick(Duration::from_millis(80));
    s
}

fn format_state(state: &RepositoryState) -> String {
    let yes_no = |flag: bool| if flag { "yes" } else { "no" };
    format!(
        "Branch: {} (remote: {})\nCommit needed: {}\nPush needed: {}\n",
        state.branch,
        state.remote_name,
        yes_no(state.commit_needed),
        yes_no(state.push_needed),
    )
}
