use anyhow::{Result, anyhow};
use config::{Config, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub identity: Identity,
    pub bridge: Bridge,
    pub storage: Storage,
    pub log: Log,
}

#[derive(Debug, Deserialize)]
pub struct Identity {
    pub backend: String, // "fake" or "http"
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct Bridge {
    pub backend: String, // "fake" or "http"
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
    pub backend: String, // "memory" or "fs"
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}
