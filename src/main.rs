//! Ranks the most-starred GitHub repositories and counts who committed to them today.
//!
//! # Overview
//!
//! `repo-pulse` fetches the top repositories by star count from the GitHub search API,
//! then fetches the last day of commits for each of them and tallies commits per author.
//! All requests go through one executor that holds two limits at once: a ceiling on
//! requests in flight and a ceiling on requests started in any one-second window.
//!
//! # Quick Start
//!
//! ```bash
//! export GITHUB_TOKEN=ghp_xxxxxxxxxxxxxxxxxxxx
//! repo-pulse fetch --limit 20
//! ```
//!
//! # Output
//!
//! By default a ranked table is printed to the terminal. Report files replace the
//! terminal output:
//!
//! ```bash
//! repo-pulse fetch --json pulse.json
//! repo-pulse fetch --csv-dir out/
//! ```
//!
//! The CSV directory receives `repositories.csv`, `repositories_positions.csv` and
//! `repositories_authors_commits.csv`.
//!
//! # Configuration
//!
//! Settings are read from `pulse.toml`, `pulse.yml`, `pulse.yaml` or `pulse.json` in the
//! current directory, or from the file given with `--config`. Command-line flags win over
//! the file. Generate a commented default file with:
//!
//! ```bash
//! repo-pulse init
//! ```
//!
//! # Failure Behavior
//!
//! If the repository listing cannot be fetched, the command fails. If the commit history of
//! a single repository cannot be fetched, that repository is still reported, with no authors,
//! and a warning is logged (visible with `--log-level warn`).

use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};
use repo_pulse::Result;

mod commands;

use crate::commands::{FetchArgs, InitArgs, fetch, init_config};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "repo-pulse", version, about)]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the top repositories and today's commit authors
    Fetch(Box<FetchArgs>),
    /// Generate a default configuration file
    Init(InitArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    match &Cli::parse().command {
        Command::Fetch(fetch_args) => fetch(fetch_args).await,
        Command::Init(init_args) => init_config(init_args),
    }
}
