use clap::{Parser, Subcommand};
use clap_complete::Shell;

use crate::commands::config::ConfigCommands;
use crate::commands::sync::{AddArgs, CommitArgs, PushArgs, StatusArgs};
use crate::commands::token::TokenCommands;

#[derive(Parser)]
#[command(
    name = "gitsync",
    bin_name = "gsync",
    version,
    about,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show whether the repository needs a commit or a push
    Status(StatusArgs),

    /// Stage all changes
    Add(AddArgs),

    /// Stage all changes and commit
    Commit(CommitArgs),

    /// Commit pending changes and push with the stored token
    Push(PushArgs),

    /// Manage the stored token
    #[command(subcommand)]
    Token(TokenCommands),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}
