//! Configuration loading from deadcss.toml.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};

use crate::loader::LoaderConfig;

/// Name of the configuration file looked up in a directory.
pub const CONFIG_FILE: &str = "deadcss.toml";

/// Main configuration structure for deadcss.toml.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DeadcssConfig {
    /// Which resources pages may load.
    pub loader: LoaderConfig,
    /// Scheduling of page workers.
    pub analysis: AnalysisConfig,
    /// Report and dump settings.
    pub output: OutputConfig,
}

/// Analysis scheduling configuration.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Maximum concurrent page workers; unset means one per URL.
    pub jobs: Option<usize>,
}

/// Output configuration.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "plain" or "json".
    pub format: Option<String>,
    /// Path of the full rule dump.
    pub dump: Option<String>,
}

/// Loads configuration from deadcss.toml in `dir` if it exists.
pub fn load_config(dir: &Path) -> Result<Option<DeadcssConfig>> {
    let path = dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let cfg = toml::from_str(&content).context("Invalid deadcss.toml")?;
    Ok(Some(cfg))
}
