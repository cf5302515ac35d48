//! Configuration management for ipsum-blocker.
//!
//! Every setting has a built-in default, so the config file is optional.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::fetcher::DEFAULT_SOURCE_URL;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/ipsum-blocker/config.yaml";

/// Longest set name `ipset` accepts.
const MAX_SET_NAME_LEN: usize = 31;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Blocklist URL (HTTPS only)
    pub source_url: String,

    /// Name of the ipset holding the blocklist
    pub set_name: String,

    /// Chain the drop rule is inserted into
    pub chain: String,

    /// Always save the ipset after populating it (same as --save)
    pub save: bool,

    /// Where `ipset save` output is written
    pub save_path: PathBuf,

    /// ipset binary
    pub ipset_path: String,

    /// iptables binary
    pub iptables_path: String,

    /// Take an exclusive lock on this file for the whole run
    pub lock_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            set_name: "ipsum".to_string(),
            chain: "INPUT".to_string(),
            save: false,
            save_path: PathBuf::from("/etc/ipset.conf"),
            ipset_path: "ipset".to_string(),
            iptables_path: "iptables".to_string(),
            lock_file: None,
        }
    }
}

impl Config {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config = Self::from_yaml(&content)
            .with_context(|| format!("Invalid config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load the config file if it exists, otherwise use the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate YAML content
    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty file deserializes as null, not as an empty mapping.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content).context("Failed to parse YAML")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.source_url.starts_with("https://") {
            anyhow::bail!("source_url must use HTTPS: {}", self.source_url);
        }

        if !is_valid_set_name(&self.set_name) {
            anyhow::bail!(
                "Invalid set_name '{}'. Use 1-{} characters from [A-Za-z0-9_.-]",
                self.set_name,
                MAX_SET_NAME_LEN
            );
        }

        if !is_valid_chain(&self.chain) {
            anyhow::bail!("Invalid chain '{}'", self.chain);
        }

        if self.ipset_path.is_empty() || self.iptables_path.is_empty() {
            anyhow::bail!("ipset_path and iptables_path cannot be empty");
        }

        if self.save_path.as_os_str().is_empty() {
            anyhow::bail!("save_path cannot be empty");
        }

        Ok(())
    }
}

fn is_valid_set_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_SET_NAME_LEN
        && !name.starts_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

fn is_valid_chain(chain: &str) -> bool {
    !chain.is_empty()
        && !chain.starts_with('-')
        && chain.chars().all(|c| c.is_ascii_graphic())
}
