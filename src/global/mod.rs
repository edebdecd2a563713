//! Filesystem locations used by the CLI.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

const APP_DIR: &str = "meetvocal";

/// When set, config and session files both live directly in this directory.
pub const HOME_ENV: &str = "MEETVOCAL_HOME";

fn resolve(home: Option<PathBuf>, platform: Option<PathBuf>, kind: &str) -> Result<PathBuf> {
    home.or_else(|| platform.map(|dir| dir.join(APP_DIR)))
        .with_context(|| format!("Unable to determine {} directory", kind))
}

fn home_override() -> Option<PathBuf> {
    env::var_os(HOME_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

pub fn config_file() -> Result<PathBuf> {
    Ok(resolve(home_override(), dirs::config_dir(), "config")?.join("config.toml"))
}

/// The session holds a bearer token, so it stays in the machine-local data dir.
pub fn session_file() -> Result<PathBuf> {
    Ok(resolve(home_override(), dirs::data_local_dir(), "data")?.join("session.json"))
}

/// Where exported artifacts land when no output directory is configured.
pub fn download_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}
