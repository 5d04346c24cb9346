use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{Args, Subcommand};

use super::Context;
use crate::infra::credential::{CredentialError, CredentialStore};
use crate::infra::git::GitRepo;
use crate::shared::prompt;
use crate::sync::{Identity, SyncError};

/// Manage the stored push token.
#[derive(Subcommand, Clone, PartialEq, Eq)]
pub enum TokenCommands {
    /// Store a token for the repository's identity
    Set(TokenArgs),

    /// Remove the stored token
    Clear(TokenArgs),
}

#[derive(Args, Clone, PartialEq, Eq)]
pub struct TokenArgs {
    /// Repository whose user.email selects the identity (default: current directory)
    pub path: Option<PathBuf>,

    /// Identity to use instead of the repository's user.email
    #[arg(long)]
    pub email: Option<String>,
}

impl TokenCommands {
    pub fn run(&self) -> anyhow::Result<()> {
        let ctx = Context::load()?;
        let store = ctx.store();
        match self {
            Self::Set(args) => {
                let email = args.email(&ctx)?;
                let secret = match ctx.env.token.clone() {
                    Some(token) => token,
                    None => capture_secret(io::stdin().is_terminal(), prompt::read_secret)?,
                };
                set_token(&store, &email, &secret)?;
                println!("Token stored for {email}");
            }
            Self::Clear(args) => {
                let email = args.email(&ctx)?;
                if clear_token(&store, &email)? {
                    println!("Token removed for {email}");
                } else {
                    println!("No token stored for {email}");
                }
            }
        }
        Ok(())
    }
}

impl TokenArgs {
    fn email(&self, ctx: &Context) -> anyhow::Result<String> {
        if let Some(email) = &self.email {
            let identity = Identity::new(email.trim(), "");
            identity.validate()?;
            return Ok(identity.email);
        }
        let root = ctx.repo_root(self.path.as_deref())?;
        let identity = Identity::resolve(&GitRepo::new(&ctx.git, root), prompt::prompt_line)?;
        Ok(identity.email)
    }
}

/// Read a token, asking twice when a person is typing it.
fn capture_secret<F>(interactive: bool, mut read: F) -> Result<String, SyncError>
where
    F: FnMut(&str) -> io::Result<String>,
{
    let read_err = |e: io::Error| SyncError::ToolInvocation(format!("Failed to read token: {e}"));

    let secret = read("Enter token: ").map_err(read_err)?;
    if interactive {
        let confirmation = read("Confirm token: ").map_err(read_err)?;
        if confirmation != secret {
            return Err(SyncError::CredentialMismatch);
        }
    }
    Ok(secret.trim().to_string())
}

fn set_token<C: CredentialStore + ?Sized>(
    store: &C,
    email: &str,
    secret: &str,
) -> Result<(), SyncError> {
    store.put(email, secret)?;
    tracing::info!(identity = email, "token stored");
    Ok(())
}

/// Returns whether a token was present.
fn clear_token<C: CredentialStore + ?Sized>(store: &C, email: &str) -> Result<bool, SyncError> {
    match store.delete(email) {
        Ok(()) => Ok(true),
        Err(CredentialError::NotFound(_)) => Ok(false),
        Err(e) => Err(e.into()),
    }
}
