use super::common::{ColorMode, LogLevel, init_logging};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use ohno::IntoAppError;
use repo_pulse::Result;
use repo_pulse::config::{Config, Credential};
use repo_pulse::fetch::FetchOrchestrator;
use repo_pulse::model::FetchBatch;
use repo_pulse::records::{self, Record};
use repo_pulse::reports::{generate_console, generate_csv, generate_json};
use std::fs;

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Number of top repositories to fetch [default: 100]
    #[arg(long, short = 'n', value_name = "N")]
    pub limit: Option<u32>,

    /// Maximum number of API requests in flight at once [default: 10]
    #[arg(long, value_name = "N")]
    pub max_concurrent_requests: Option<usize>,

    /// Maximum number of API requests started per second [default: 30]
    #[arg(long, value_name = "N")]
    pub requests_per_second: Option<u32>,

    /// GitHub personal access token
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Base URL of the GitHub REST API [default: https://api.github.com]
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Path to configuration file [default: one of pulse.[toml|yml|yaml|json] ]
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Control when to use colored output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorMode,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none")]
    pub log_level: LogLevel,

    /// Write the fetched data to a JSON file instead of to the terminal
    #[arg(long, value_name = "PATH", help_heading = "Report Output")]
    pub json: Option<Utf8PathBuf>,

    /// Write one CSV file per table into this directory instead of to the terminal
    #[arg(long, value_name = "DIR", help_heading = "Report Output")]
    pub csv_dir: Option<Utf8PathBuf>,
}

pub async fn fetch(args: &FetchArgs) -> Result<()> {
    init_logging(args.log_level);

    let config = resolve_config(args, Utf8Path::new("."))?;
    let orchestrator = FetchOrchestrator::from_config(&config)?;
    let batch = orchestrator.run(config.limit).await?;

    report(&batch, args)
}

/// Load the configuration file, then let command-line flags override it.
fn resolve_config(args: &FetchArgs, dir: &Utf8Path) -> Result<Config> {
    let mut config = Config::load(dir, args.config.as_deref())?;

    if let Some(limit) = args.limit {
        config.limit = limit;
    }
    if let Some(max) = args.max_concurrent_requests {
        config.max_concurrent_requests = max;
    }
    if let Some(rps) = args.requests_per_second {
        config.requests_per_second = rps;
    }
    if let Some(url) = &args.api_url {
        config.api_base_url.clone_from(url);
    }
    if let Some(token) = &args.github_token {
        config.access_token = Some(Credential::new(token.as_str()));
    }

    config.validate()?;
    Ok(config)
}

fn report(batch: &FetchBatch, args: &FetchArgs) -> Result<()> {
    let generating_reports = args.json.is_some() || args.csv_dir.is_some();

    if !generating_reports {
        let mut console_output = String::new();
        generate_console(batch, args.color.use_colors(), &mut console_output)?;
        print!("{console_output}");
    }

    if let Some(filename) = &args.json {
        let mut json = String::new();
        generate_json(batch, &mut json)?;
        fs::write(filename, json).into_app_err_with(|| format!("writing JSON report to {filename}"))?;
    }

    if let Some(dir) = &args.csv_dir {
        fs::create_dir_all(dir).into_app_err_with(|| format!("creating CSV output directory {dir}"))?;
        write_csv_table(dir, &records::repository_records(batch))?;
        write_csv_table(dir, &records::position_records(batch))?;
        write_csv_table(dir, &records::author_commit_records(batch))?;
    }

    Ok(())
}

fn write_csv_table<R: Record>(dir: &Utf8Path, records: &[R]) -> Result<()> {
    let path = dir.join(format!("{}.csv", R::TABLE));
    let file = fs::File::create(&path).into_app_err_with(|| format!("creating CSV report {path}"))?;
    generate_csv(records, file)
}
