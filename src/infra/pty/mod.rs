//! Driving prompt-based commands through a pseudo terminal.
//!
//! `git push` over HTTPS asks for a username and then a password on the
//! controlling terminal. [`PtyAuthSession`] runs the command in a pty and
//! answers those two prompts in order.

mod error;
mod session;

use std::ffi::OsString;
use std::path::Path;

pub use error::{Result, SessionError};
pub use session::PtyAuthSession;

/// Marker substituted for the secret in transcripts.
pub const REDACTED: &str = "********";

/// A command to run with credentials supplied on its prompts.
#[derive(Debug, Clone)]
pub struct PushRequest<'a> {
    pub program: &'a str,
    pub args: Vec<String>,
    pub cwd: &'a Path,
    /// Extra environment for the child only.
    pub env: Vec<(String, OsString)>,
    pub identity: &'a str,
    pub secret: &'a str,
}

/// Captured output of a finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    /// Everything the child wrote, with the secret redacted.
    pub output: String,
    pub exit_code: u32,
    pub success: bool,
}

impl Transcript {
    /// Build a transcript, replacing every occurrence of `secret`.
    pub fn redacted(raw: &[u8], secret: &str, exit_code: u32, success: bool) -> Self {
        let text = String::from_utf8_lossy(raw);
        let output = if secret.is_empty() {
            text.into_owned()
        } else {
            text.replace(secret, REDACTED)
        };
        Self {
            output,
            exit_code,
            success,
        }
    }
}

/// Runs a command and feeds it identity and secret.
pub trait AuthSession {
    fn run(&self, request: &PushRequest<'_>) -> Result<Transcript>;
}
