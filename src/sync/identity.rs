use std::io;

use tracing::info;

use super::error::{Result, SyncError};
use crate::infra::git::{GitRepo, GitRunner};

/// Git author identity; the email also keys the stored token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
    pub display_name: String,
}

impl Identity {
    pub fn new(email: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            display_name: display_name.into(),
        }
    }

    /// Reject an identity that cannot address a credential.
    pub fn validate(&self) -> Result<()> {
        if self.email.trim().is_empty() {
            return Err(SyncError::MissingIdentity);
        }
        Ok(())
    }

    /// Read `user.email` and `user.name` from git config.
    ///
    /// Missing values are asked for through `ask` and written to the
    /// repository's local config. An empty answer for the email fails with
    /// [`SyncError::MissingIdentity`].
    pub fn resolve<R, F>(git: &GitRepo<'_, R>, mut ask: F) -> Result<Self>
    where
        R: GitRunner + ?Sized,
        F: FnMut(&str) -> io::Result<String>,
    {
        let email = match git.config_get("user.email")? {
            Some(email) => email,
            None => {
                let email = ask_value(&mut ask, "Enter git email address: ")?;
                if email.is_empty() {
                    return Err(SyncError::MissingIdentity);
                }
                git.config_set_local("user.email", &email)?;
                info!(email, "stored user.email in local config");
                email
            }
        };

        let display_name = match git.config_get("user.name")? {
            Some(name) => name,
            None => {
                let name = ask_value(&mut ask, "Enter your name: ")?;
                if !name.is_empty() {
                    git.config_set_local("user.name", &name)?;
                    info!(name, "stored user.name in local config");
                }
                name
            }
        };

        let identity = Self::new(email, display_name);
        identity.validate()?;
        Ok(identity)
    }
}

fn ask_value<F>(ask: &mut F, prompt: &str) -> Result<String>
where
    F: FnMut(&str) -> io::Result<String>,
{
    ask(prompt)
        .map(|answer| answer.trim().to_string())
        .map_err(|e| SyncError::ToolInvocation(format!("Failed to read input: {e}")))
}
