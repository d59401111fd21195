mod cli;
mod clipboard;
mod ignore_rules;
mod persist;
mod selection;
mod summary;
mod tokens;
mod tree;
mod tui;
mod workflow;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    // Handle daemon mode first. This should stay in main.rs as it's an early exit.
    if clipboard::check_and_run_daemon_if_requested()? {
        return Ok(());
    }

    let cli_args = cli::Cli::parse();
    workflow::run_codesum(cli_args)
}
