use anyhow::{Context, Result};
use billscan_analysis::AnalysisConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::state::{billscan_home, ensure_billscan_home};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisConfig,
    pub output: OutputSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputSection {
    /// "text" or "json"
    pub format: String,
    /// Default tracing level when `-v` is not given
    pub log_level: String,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

impl OutputSection {
    pub fn wants_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(billscan_home()?.join("config.toml"))
}

pub fn parse_config(s: &str) -> Result<Config> {
    toml::from_str(s).context("parse config.toml")
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s)
}

pub fn save_config(cfg: &Config) -> Result<PathBuf> {
    let p = ensure_billscan_home()?.join("config.toml");
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(p)
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    let p = save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let text = "[analysis]\nproximity_window = 120\n\n[output]\nformat = \"json\"\n";
        let cfg = parse_config(text).unwrap();
        assert_eq!(cfg.analysis.proximity_window, 120);
        assert_eq!(cfg.analysis.subtotal_tolerance, 0.01);
        assert!(cfg.output.wants_json());
        assert_eq!(cfg.output.log_level, "warn");
    }

    #[test]
    fn test_default_config_survives_toml() {
        let s = toml::to_string_pretty(&Config::default()).unwrap();
        assert_eq!(parse_config(&s).unwrap(), Config::default());
        assert_eq!(parse_config("").unwrap(), Config::default());
    }
}
