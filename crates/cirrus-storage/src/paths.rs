//! Path utilities for the Cirrus data directory.

use anyhow::Result;
use std::path::PathBuf;

const CIRRUS_DIR: &str = ".cirrus";
const DATABASE_FILE: &str = "cirrus.db";
const LOG_DIR: &str = "logs";

/// Environment variable to override the Cirrus data directory.
pub const CIRRUS_DIR_ENV: &str = "CIRRUS_DIR";

/// Resolve the Cirrus data directory.
/// Priority: CIRRUS_DIR env var > ~/.cirrus/
pub fn resolve_cirrus_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(CIRRUS_DIR_ENV)
        && !dir.trim().is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|h| h.join(CIRRUS_DIR))
        .ok_or_else(|| anyhow::anyhow!("Failed to determine home directory"))
}

/// Ensure the Cirrus data directory exists and return its path.
pub fn ensure_cirrus_dir() -> Result<PathBuf> {
    let dir = resolve_cirrus_dir()?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Database path: ~/.cirrus/cirrus.db
pub fn database_path() -> Result<PathBuf> {
    Ok(ensure_cirrus_dir()?.join(DATABASE_FILE))
}

/// Log directory: ~/.cirrus/logs
pub fn log_dir() -> Result<PathBuf> {
    let dir = ensure_cirrus_dir()?.join(LOG_DIR);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
