mod cli;
mod commands;
mod infra;
mod shared;
mod sync;

use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

use crate::shared::env_var::EnvVars;

const DEFAULT_LOG_FILTER: &str = "warn";

fn main() -> anyhow::Result<()> {
    let Cli { log_json, command } = Cli::parse();
    init_tracing(EnvVars::load().log.as_deref(), log_json);

    match command {
        Commands::Status(args) => args.run()?,
        Commands::Add(args) => args.run()?,
        Commands::Commit(args) => args.run()?,
        Commands::Push(args) => args.run()?,
        Commands::Token(cmd) => cmd.run()?,
        Commands::Config(cmd) => cmd.run()?,
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "gsync", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout stays parseable (`status --json`).
fn init_tracing(filter: Option<&str>, json: bool) {
    let filter = filter
        .and_then(|f| EnvFilter::try_new(f).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
