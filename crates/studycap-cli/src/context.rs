//! Data directory, configuration and storage shared by all commands

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use directories::ProjectDirs;
use studycap_core::{EngineConfig, Storage};

/// Database file inside the data directory
pub const DB_FILE: &str = "studycap.db";

/// Optional engine configuration inside the data directory
pub const CONFIG_FILE: &str = "config.json";

/// Everything a command needs
pub struct AppContext {
    pub storage: Storage,
    pub config: EngineConfig,
}

impl AppContext {
    /// Open storage and load configuration from `data_dir`, or the platform
    /// data directory
    pub fn open(data_dir: Option<PathBuf>) -> anyhow::Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => default_data_dir()?,
        };
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        let config = load_config(&data_dir.join(CONFIG_FILE))?;
        let storage = Storage::new(Some(data_dir.join(DB_FILE)))?;
        tracing::debug!(data_dir = %data_dir.display(), "storage opened");

        Ok(Self { storage, config })
    }
}

fn default_data_dir() -> anyhow::Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "studycap", "studycap")
        .ok_or_else(|| anyhow::anyhow!("Could not determine project directories"))?;
    Ok(proj_dirs.data_dir().to_path_buf())
}

/// Read `config.json` if present; missing keys fall back to defaults
pub fn load_config(path: &Path) -> anyhow::Result<EngineConfig> {
    if !path.exists() {
        return Ok(EngineConfig::default());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: EngineConfig = serde_json::from_str(&text)
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

/// Parse `YYYY-MM-DD`
pub fn parse_date(value: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| anyhow::anyhow!("Invalid date '{}': {}. Use YYYY-MM-DD format.", value, e))
}

/// Parse RFC 3339 or `YYYY-MM-DD HH:MM` (taken as UTC)
pub fn parse_time(value: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M")
        .map(|naive| naive.and_utc())
        .map_err(|e| {
            anyhow::anyhow!(
                "Invalid time '{}': {}. Use RFC 3339 or 'YYYY-MM-DD HH:MM'.",
                value,
                e
            )
        })
}

/// Pick the single item whose id starts with `prefix`
pub fn resolve_prefix<T>(
    items: Vec<T>,
    id_of: impl Fn(&T) -> &str,
    prefix: &str,
    kind: &str,
) -> anyhow::Result<T> {
    let mut matches: Vec<T> = items
        .into_iter()
        .filter(|item| id_of(item).starts_with(prefix))
        .collect();
    match matches.len() {
        0 => anyhow::bail!("No {} matches '{}'", kind, prefix),
        1 => Ok(matches.remove(0)),
        n => anyhow::bail!("'{}' matches {} {}s; use a longer id", prefix, n, kind),
    }
}
