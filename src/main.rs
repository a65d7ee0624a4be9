//! Remote settings dump uploader
//!
//! Reconciles a local `{"data": [...]}` record dump with the matching
//! collection on a remote settings server.

// settingsync/src/main.rs
mod config;
mod errors;
mod records;
mod remote;
mod sync;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use config::{EnvOverrides, RawJsonConfig, RunOptions, Server, SyncConfig};
use remote::http_client::HttpRecordStore;
use std::path::PathBuf;
use std::process::ExitCode;
use sync::logic::SyncReport;
use sync::prompt::{AssumeYes, TerminalPrompt, read_auth_header};

#[derive(Debug, Parser)]
#[command(name = "settingsync")]
#[command(
    about = "Upload dump files to remote settings. Dump files are expected in \
             services/settings/dumps/main/ relative to the current directory."
)]
struct Cli {
    /// Which server to upload the collection to.
    #[arg(short, long, value_enum)]
    server: Option<Server>,

    /// The collection to upload (e.g. search-telemetry).
    #[arg(short, long)]
    collection: Option<String>,

    /// Approve every update and removal without asking.
    #[arg(short, long)]
    yes: bool,

    /// Show what would change without sending anything.
    #[arg(long)]
    dry_run: bool,

    /// Directory holding the <collection>.json dump files.
    #[arg(long, value_name = "DIR")]
    dumps_dir: Option<PathBuf>,

    /// JSON config file with server URL overrides.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Request timeout in seconds (no timeout by default).
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let cli = Cli::parse();
    let Some((server, collection)) = required_args(&cli) else {
        let _ = Cli::command().print_help();
        return ExitCode::from(1);
    };

    match run_app(&cli, server, &collection).await {
        Ok(report) => {
            println!("✅ Sync finished: {}", report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

/// Both `-s` and `-c` are needed; `None` means the run exits 1 after help.
fn required_args(cli: &Cli) -> Option<(Server, String)> {
    Some((cli.server?, cli.collection.clone()?))
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

async fn run_app(cli: &Cli, server: Server, collection: &str) -> Result<SyncReport> {
    // A missing .env is fine; only the SETTINGSYNC_* variables are read.
    dotenv::dotenv().ok();
    let env = EnvOverrides::from_env()?;

    let raw_config = match &cli.config {
        Some(path) => RawJsonConfig::load_from_json(path)?,
        None => RawJsonConfig::default(),
    };

    let options = RunOptions {
        dumps_dir: cli.dumps_dir.clone(),
        timeout_secs: cli.timeout,
        assume_yes: cli.yes,
        dry_run: cli.dry_run,
    };
    let sync_config = SyncConfig::resolve(server, collection, &options, &env, &raw_config)
        .context("Failed to resolve sync configuration")?;
    tracing::debug!(?sync_config, "configuration resolved");

    let auth_header = read_auth_header()?;
    let store = HttpRecordStore::new(sync_config.records_url.clone(), &auth_header, sync_config.timeout)?;

    if sync_config.assume_yes {
        sync::run_sync_flow(&sync_config, &store, &mut AssumeYes).await
    } else {
        sync::run_sync_flow(&sync_config, &store, &mut TerminalPrompt).await
    }
}
