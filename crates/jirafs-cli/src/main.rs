mod bootstrap_helpers;
mod cli_args;
mod commands;
mod shell;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use jirafs_tracker::{Credentials, JiraClient, JiraClientConfig};
use tracing::debug;

use crate::bootstrap_helpers::init_tracing;
use crate::cli_args::{Cli, CliCommand};
use crate::commands::{run_cat, run_ls, run_rm, run_write};
use crate::shell::run_shell;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run_cli(cli).await
}

async fn run_cli(cli: Cli) -> Result<()> {
    let client = JiraClient::new(JiraClientConfig {
        base_url: cli.url.clone(),
        credentials: Credentials::new(cli.user.as_str(), cli.pass.as_str()),
        request_timeout_ms: cli.request_timeout_ms,
    })
    .context("failed to build Jira client")?;
    debug!(url = %cli.url, max_listing = cli.max_listing, "mounting namespace");
    let namespace = jirafs_views::mount(Arc::new(client), cli.max_listing);

    let mut stdout = std::io::stdout();
    match cli.command {
        CliCommand::Ls { path } => run_ls(&namespace, &path, &mut stdout).await,
        CliCommand::Cat { path } => run_cat(&namespace, &path, &mut stdout).await,
        CliCommand::Write {
            path,
            append,
            input,
        } => match input {
            Some(input) => {
                let file = std::fs::File::open(&input)
                    .with_context(|| format!("failed to open {}", input.display()))?;
                run_write(&namespace, &path, append, file).await
            }
            None => run_write(&namespace, &path, append, std::io::stdin()).await,
        },
        CliCommand::Rm { path } => run_rm(&namespace, &path).await,
        CliCommand::Shell { history } => run_shell(namespace, history.as_deref()).await,
    }
}
