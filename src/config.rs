//! Configuration loading and persistence.
//!
//! Holds the configured delivery targets and the encryption setting. The
//! file contains push keys, so it is written owner-only.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::constants::{CONFIG_FILE, DEFAULT_SERVER_URL};
use crate::target::Target;

/// Configuration for the barkcast CLI.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Configured delivery targets.
    #[serde(default)]
    pub targets: Vec<Target>,
    /// Encrypt title and body for every target.
    #[serde(default)]
    pub encryption_enabled: bool,
    /// Server used when a target is added without one.
    #[serde(default = "default_server_url")]
    pub default_server_url: String,
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            encryption_enabled: false,
            default_server_url: default_server_url(),
        }
    }
}

impl Config {
    /// Returns the configuration directory path, creating it if necessary.
    ///
    /// Directory selection priority:
    /// 1. `#[cfg(test)]` (unit tests): `<tmp>/barkcast-test`
    /// 2. `BARKCAST_CONFIG_DIR` env var: explicit override
    /// 3. `BARKCAST_ENV=test`: `<tmp>/barkcast-test`
    /// 4. Default: platform config dir (e.g. `~/.config/barkcast`)
    pub fn config_dir() -> Result<PathBuf> {
        let dir = {
            #[cfg(test)]
            {
                std::env::temp_dir().join("barkcast-test")
            }

            #[cfg(not(test))]
            {
                if let Ok(dir) = std::env::var("BARKCAST_CONFIG_DIR") {
                    PathBuf::from(dir)
                } else if crate::env::is_test_mode() {
                    std::env::temp_dir().join("barkcast-test")
                } else {
                    dirs::config_dir()
                        .context("Could not determine config directory")?
                        .join("barkcast")
                }
            }
        };
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        Ok(dir)
    }

    /// Loads configuration from the default directory, with environment
    /// variable overrides applied.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_dir()?)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Loads configuration from `dir`. A missing file yields the defaults.
    pub fn load_from(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Applies `BARKCAST_ENCRYPT` and `BARKCAST_SERVER_URL` from the process
    /// environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Applies overrides using `lookup` in place of the process environment.
    ///
    /// An unparseable `BARKCAST_ENCRYPT` and a blank `BARKCAST_SERVER_URL`
    /// are ignored.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup("BARKCAST_ENCRYPT") {
            match parse_flag(&value) {
                Some(enabled) => self.encryption_enabled = enabled,
                None => {
                    log::warn!("Ignoring BARKCAST_ENCRYPT={value:?}: expected 1/0/true/false");
                }
            }
        }

        if let Some(server_url) = lookup("BARKCAST_SERVER_URL") {
            if !server_url.trim().is_empty() {
                self.default_server_url = server_url;
            }
        }
    }

    /// Persists the configuration to the default directory.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_dir()?)
    }

    /// Persists the configuration to `dir`.
    pub fn save_to(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        let config_path = dir.join(CONFIG_FILE);
        fs::write(&config_path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;

        // Set restrictive permissions (owner read/write only)
        #[cfg(unix)]
        fs::set_permissions(&config_path, fs::Permissions::from_mode(0o600))?;

        Ok(())
    }

    /// Adds a target. Names must be unique and the target dispatchable.
    pub fn add_target(&mut self, target: Target) -> Result<()> {
        if target.name.trim().is_empty() {
            anyhow::bail!("Target name must not be empty");
        }
        if !target.is_dispatchable() {
            anyhow::bail!(
                "Target '{}' needs both a push key and a server URL",
                target.name
            );
        }
        if self.find(&target.name).is_some() {
            anyhow::bail!("A target named '{}' already exists", target.name);
        }
        self.targets.push(target);
        Ok(())
    }

    /// Removes and returns the target called `name`.
    pub fn remove_target(&mut self, name: &str) -> Result<Target> {
        let index = self
            .targets
            .iter()
            .position(|t| t.name == name)
            .with_context(|| format!("No target named '{name}'"))?;
        Ok(self.targets.remove(index))
    }

    /// Marks the target called `name` as selected or not.
    pub fn set_selected(&mut self, name: &str, selected: bool) -> Result<()> {
        let target = self
            .targets
            .iter_mut()
            .find(|t| t.name == name)
            .with_context(|| format!("No target named '{name}'"))?;
        target.selected = selected;
        Ok(())
    }

    /// Targets in the default fan-out set, in configuration order.
    pub fn selected_targets(&self) -> Vec<Target> {
        self.targets.iter().filter(|t| t.selected).cloned().collect()
    }

    /// Looks up each named target, failing on the first unknown name.
    pub fn targets_named(&self, names: &[String]) -> Result<Vec<Target>> {
        names
            .iter()
            .map(|name| {
                self.find(name)
                    .cloned()
                    .with_context(|| format!("No target named '{name}'"))
            })
            .collect()
    }

    fn find(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.name == name)
    }
}

/// Parses a boolean environment flag.
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
