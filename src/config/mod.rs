// settingsync/src/config/mod.rs
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::errors::AppError;

/// Where dump files live, relative to the working directory.
pub const DEFAULT_DUMPS_DIR: &str = "services/settings/dumps/main";
/// The writable staging bucket uploads go to.
pub const WORKSPACE_BUCKET: &str = "main-workspace";

pub const ENV_DUMPS_DIR: &str = "SETTINGSYNC_DUMPS_DIR";
pub const ENV_TIMEOUT_SECS: &str = "SETTINGSYNC_TIMEOUT_SECS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Server {
    Dev,
    Stage,
    Prod,
}

impl Server {
    pub fn name(&self) -> &'static str {
        match self {
            Server::Dev => "dev",
            Server::Stage => "stage",
            Server::Prod => "prod",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Server::Dev => "https://remote-settings-dev.allizom.org/v1/",
            Server::Stage => "https://remote-settings.allizom.org/v1/",
            Server::Prod => "https://remote-settings.mozilla.org/v1/",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        [Server::Dev, Server::Stage, Server::Prod]
            .into_iter()
            .find(|s| s.name() == name)
    }
}

// Optional config file (passed with --config)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawJsonConfig {
    /// Base URL overrides keyed by server name ("dev", "stage", "prod").
    pub servers: Option<HashMap<String, String>>,
    pub dumps_dir: Option<PathBuf>,
    pub bucket: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl RawJsonConfig {
    pub fn load_from_json(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;
        let raw: RawJsonConfig = serde_json::from_str(&config_content).with_context(|| {
            format!(
                "Failed to parse JSON from config file at {}",
                config_path.display()
            )
        })?;

        if let Some(servers) = &raw.servers {
            if let Some(unknown) = servers.keys().find(|k| Server::from_name(k).is_none()) {
                return Err(AppError::Config(format!(
                    "unknown server '{}' in 'servers' (expected dev, stage or prod)",
                    unknown
                )))
                .with_context(|| format!("Invalid config file at {}", config_path.display()));
            }
        }
        Ok(raw)
    }
}

/// Settings picked up from the environment (after `.env` has been loaded).
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub dumps_dir: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

impl EnvOverrides {
    pub fn from_env() -> Result<Self> {
        let dumps_dir = env::var(ENV_DUMPS_DIR)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);
        let timeout_secs = match env::var(ENV_TIMEOUT_SECS) {
            Ok(raw) if !raw.trim().is_empty() => Some(raw.trim().parse::<u64>().map_err(|e| {
                AppError::Config(format!("{} must be a number of seconds: {}", ENV_TIMEOUT_SECS, e))
            })?),
            _ => None,
        };
        Ok(EnvOverrides {
            dumps_dir,
            timeout_secs,
        })
    }
}

/// Options taken straight from the command line.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub dumps_dir: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub assume_yes: bool,
    pub dry_run: bool,
}

/// Everything one sync run needs, resolved once and passed down explicitly.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub server: Server,
    pub collection: String,
    pub bucket: String,
    pub records_url: Url,
    pub dump_path: PathBuf,
    pub timeout: Option<Duration>,
    pub assume_yes: bool,
    pub dry_run: bool,
}

impl SyncConfig {
    /// Command line wins over the environment, which wins over the config
    /// file, which wins over the built-in defaults.
    pub fn resolve(
        server: Server,
        collection: &str,
        options: &RunOptions,
        env: &EnvOverrides,
        raw: &RawJsonConfig,
    ) -> Result<Self> {
        let collection = collection.trim();
        if collection.is_empty() {
            return Err(AppError::InvalidInput("collection name cannot be empty".to_string()).into());
        }

        let base = raw
            .servers
            .as_ref()
            .and_then(|servers| servers.get(server.name()))
            .map(String::as_str)
            .unwrap_or(server.default_base_url());
        let base_url = Url::parse(base)
            .with_context(|| format!("Invalid base URL for server {}: {}", server.name(), base))?;

        let bucket = raw
            .bucket
            .clone()
            .filter(|b| !b.trim().is_empty())
            .unwrap_or_else(|| WORKSPACE_BUCKET.to_string());

        let records_url = records_endpoint(&base_url, &bucket, collection)?;

        let dumps_dir = options
            .dumps_dir
            .clone()
            .or_else(|| env.dumps_dir.clone())
            .or_else(|| raw.dumps_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DUMPS_DIR));
        let dump_path = dumps_dir.join(format!("{}.json", collection));

        let timeout = options
            .timeout_secs
            .or(env.timeout_secs)
            .or(raw.timeout_secs)
            .map(Duration::from_secs);

        Ok(SyncConfig {
            server,
            collection: collection.to_string(),
            bucket,
            records_url,
            dump_path,
            timeout,
            assume_yes: options.assume_yes,
            dry_run: options.dry_run,
        })
    }
}

/// `<base>/buckets/<bucket>/collections/<collection>/records`
pub fn records_endpoint(base_url: &Url, bucket: &str, collection: &str) -> Result<Url> {
    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|_| AppError::Config(format!("base URL {} cannot carry a path", base_url)))?
        .pop_if_empty()
        .extend(["buckets", bucket, "collections", collection, "records"]);
    Ok(url)
}
