use std::path::PathBuf;

use clap::{Parser, Subcommand};
use jirafs_views::DEFAULT_MAX_LISTING;

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "jirafs",
    about = "Browse and edit a Jira instance as a tree of plain-text files",
    version
)]
pub(crate) struct Cli {
    #[arg(long, env = "JIRAFS_URL", help = "Base URL of the Jira instance.")]
    pub(crate) url: String,

    #[arg(long, env = "JIRAFS_USER", help = "Username for basic authentication.")]
    pub(crate) user: String,

    #[arg(
        long,
        env = "JIRAFS_PASS",
        hide_env_values = true,
        help = "Password or API token for basic authentication."
    )]
    pub(crate) pass: String,

    #[arg(
        long = "max-listing",
        env = "JIRAFS_MAX_LISTING",
        default_value_t = DEFAULT_MAX_LISTING,
        value_parser = parse_positive_usize,
        help = "Maximum number of issues fetched for one directory listing."
    )]
    pub(crate) max_listing: usize,

    #[arg(
        long = "request-timeout-ms",
        env = "JIRAFS_REQUEST_TIMEOUT_MS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT_MS,
        value_parser = parse_positive_u64,
        help = "Timeout for each HTTP request to Jira, in milliseconds."
    )]
    pub(crate) request_timeout_ms: u64,

    #[arg(long, short, help = "Log remote calls and namespace walks.")]
    pub(crate) verbose: bool,

    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub(crate) enum CliCommand {
    /// List a directory.
    Ls {
        #[arg(default_value = "/")]
        path: String,
    },
    /// Print a file.
    Cat { path: String },
    /// Replace a file with the contents of stdin (or --input) and commit it.
    Write {
        path: String,
        #[arg(long, help = "Append to the current contents instead of replacing them.")]
        append: bool,
        #[arg(long, help = "Read the new contents from this file instead of stdin.")]
        input: Option<PathBuf>,
    },
    /// Remove an entry (a saved search or a comment).
    Rm { path: String },
    /// Interactive shell that keeps its working directory between commands.
    Shell {
        #[arg(long, help = "History file for the interactive shell.")]
        history: Option<PathBuf>,
    },
}
