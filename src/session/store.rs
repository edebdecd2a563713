//! Session persistence between CLI invocations.
//!
//! Saving and clearing are explicit calls made by the host after observing
//! session changes; the manager itself never touches disk.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

use crate::api::Session;

pub fn load(path: &Path) -> Result<Option<Session>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).context("Failed to read session file")?;
    match serde_json::from_str(&content) {
        Ok(session) => Ok(Some(session)),
        Err(e) => {
            debug!("Ignoring unreadable session file {:?}: {}", path, e);
            Ok(None)
        }
    }
}

pub fn save(path: &Path, session: &Session) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create session directory")?;
    }
    let content = serde_json::to_string_pretty(session).context("Failed to serialize session")?;
    std::fs::write(path, content).context("Failed to write session file")?;
    Ok(())
}

pub fn clear(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).context("Failed to remove session file"),
    }
}
