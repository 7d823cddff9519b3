//! smartcityhub: command-line client for the Smart City Hub incident reporting API.
//!
//! The report draft lives in a local SQLite store, so a report can be built up over
//! several invocations (`report category`, `report add-photo`, `report next`, ...) and
//! submitted at the end.

mod commands;
mod config;
mod context;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use sch_core::error::AppError;

use config::{Config, Overrides};
use context::AppContext;

const DEFAULT_LOG_FILTER: &str = "smartcityhub=info,sch_core=info,sch_api=info";

#[derive(Parser)]
#[command(name = "smartcityhub")]
#[command(about = "Report and follow city incidents from the terminal", version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory for the local store (draft and session)
    #[arg(long, global = true, env = "SCH_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// REST API base URL (overrides config file)
    #[arg(long, global = true, env = "SCH_API_URL")]
    api_url: Option<String>,

    /// Reverse/forward geocoding service (overrides config file)
    #[arg(long, global = true, env = "SCH_GEOCODER_URL")]
    geocoder_url: Option<String>,

    #[command(subcommand)]
    command: commands::Command,
}

fn init_tracing() -> anyhow::Result<()> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.trim().is_empty() => tracing_subscriber::EnvFilter::try_new(directives)?,
        _ => tracing_subscriber::EnvFilter::try_new(DEFAULT_LOG_FILTER)?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    Ok(())
}

fn render(e: &AppError) -> String {
    let mut out = format!("error: {e}");
    if let Some(details) = &e.details {
        out.push_str(&format!(" ({details})"));
    }
    if e.retryable {
        out.push_str("\nThis may be temporary; run the same command again.");
    }
    out
}

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let mut config = Config::load(&config_path)?;
    config.apply(Overrides {
        api_url: cli.api_url,
        geocoder_url: cli.geocoder_url,
        data_dir: cli.data_dir,
    });
    tracing::debug!(
        api = %config.api.base_url,
        data_dir = %config.data_dir().display(),
        "configuration resolved"
    );

    let ctx = AppContext::open(config)
        .map_err(|e| anyhow::anyhow!(render(&e)))
        .context("failed to open the local store")?;

    if let Err(e) = commands::run(&ctx, cli.command) {
        tracing::debug!(code = %e.code, details = ?e.details, "command failed");
        eprintln!("{}", render(&e));
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn negative_longitudes_parse() {
        let cli = Cli::try_parse_from([
            "smartcityhub",
            "report",
            "locate",
            "--lat",
            "33.5731",
            "--lon",
            "-7.5898",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            commands::Command::Report(commands::report::ReportCommand::Locate { .. })
        ));
    }

    #[test]
    fn errors_render_code_message_and_details() {
        let e = AppError::new("API_INCIDENT_CREATE_FAILED", "Failed to submit report")
            .with_details("status=503")
            .with_retryable(true);
        let text = render(&e);
        assert!(text.starts_with("error: [API_INCIDENT_CREATE_FAILED] Failed to submit report (status=503)"));
        assert!(text.contains("run the same command again"));
    }
}
