use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::snapshot::ConversionOptions;

pub const DEFAULT_PORT: u16 = 3000;

const ENV_PORT: &str = "CASEBOOK_PORT";
const ENV_DB_PATH: &str = "CASEBOOK_DB_PATH";
const ENV_STRICT_SNAPSHOTS: &str = "CASEBOOK_STRICT_SNAPSHOTS";
const ENV_SYNC_STORES: &str = "CASEBOOK_SYNC_STORES";

/// Server settings, read from the environment and overridden by CLI flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    /// Database file. `None` means the per-user data directory.
    pub db_path: Option<PathBuf>,
    /// Reject snapshot writes that fail validation instead of logging them.
    pub strict_snapshots: bool,
    /// Push restored Act 2 results into the dependent containers.
    pub sync_stores: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            db_path: None,
            strict_snapshots: false,
            sync_stores: true,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Unset or blank keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(port) = get(ENV_PORT) {
            config.port = port
                .trim()
                .parse()
                .with_context(|| format!("{} must be a port number, got {:?}", ENV_PORT, port))?;
        }
        if let Some(path) = get(ENV_DB_PATH) {
            config.db_path = Some(PathBuf::from(path));
        }
        if let Some(flag) = get(ENV_STRICT_SNAPSHOTS) {
            config.strict_snapshots = parse_flag(ENV_STRICT_SNAPSHOTS, &flag)?;
        }
        if let Some(flag) = get(ENV_SYNC_STORES) {
            config.sync_stores = parse_flag(ENV_SYNC_STORES, &flag)?;
        }

        Ok(config)
    }

    /// Conversion options every request starts from.
    pub fn conversion_options(&self) -> ConversionOptions {
        let base = if self.strict_snapshots {
            ConversionOptions::strict()
        } else {
            ConversionOptions::default()
        };
        base.with_sync_stores(self.sync_stores)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("{} must be a boolean, got {:?}", key, value),
    }
}
