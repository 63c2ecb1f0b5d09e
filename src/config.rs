//! Placeholder list configuration
//!
//! Hosts usually embed these settings in their own config file; the YAML
//! helpers exist for the ones that keep a separate `placeholders.yaml`.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Behaviour switches of a placeholder list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListConfig {
    /// Strip removed placeholders from the stored layouts of child containers too
    #[serde(default = "default_true")]
    pub prune_child_maps: bool,

    /// Let `snapshot()` record a placeholder for every live panel first
    #[serde(default = "default_true")]
    pub snapshot_live_placeholders: bool,

    /// Log a before/after summary of every pruning pass at debug level
    #[serde(default)]
    pub log_changes: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            prune_child_maps: default_true(),
            snapshot_live_placeholders: default_true(),
            log_changes: false,
        }
    }
}

impl ListConfig {
    /// Parse a config from YAML, missing fields take their defaults
    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse placeholder list config")
    }

    pub fn to_yaml_string(&self) -> anyhow::Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize placeholder list config")
    }

    /// Load config from disk, or return defaults if the file does not exist
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        let config = Self::from_yaml_str(&content)
            .with_context(|| format!("Invalid config at {}", path.display()))?;
        tracing::info!("Loaded placeholder list config from {}", path.display());
        Ok(config)
    }

    /// Like `load`, but falls back to defaults on any error
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{:#}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Save config to disk, creating the parent directory if needed
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = self.to_yaml_string()?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        tracing::info!("Saved placeholder list config to {}", path.display());
        Ok(())
    }
}
