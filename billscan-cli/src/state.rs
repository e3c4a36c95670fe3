use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$BILLSCAN_HOME`, else `~/.billscan`.
pub fn billscan_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("BILLSCAN_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".billscan"))
}

pub fn ensure_billscan_home() -> Result<PathBuf> {
    let dir = billscan_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
