// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Evohaus Bridge.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use anyhow::{Context, Result};
use evohaus_core::PortalConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Shortest polling interval the portal should see
const MIN_POLL_INTERVAL_SECS: u64 = 10;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Portal account and connection settings
    pub portal: PortalConfig,

    /// Refresh loop configuration
    #[serde(default)]
    pub polling: PollingConfig,

    /// Read-only HTTP API
    #[serde(default)]
    pub web: WebConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Seconds between refresh cycles
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_web_enabled")]
    pub enabled: bool,

    #[serde(default = "default_web_port")]
    pub port: u16,
}

/// Flat options as the HA supervisor writes them to `/data/options.json`
#[derive(Debug, Deserialize)]
struct AddonOptions {
    #[serde(flatten)]
    portal: PortalConfig,

    #[serde(default = "default_interval_secs", alias = "interval_secs")]
    poll_interval_secs: u64,

    #[serde(default = "default_web_enabled")]
    web_enabled: bool,

    #[serde(default = "default_web_port")]
    web_port: u16,
}

/// Accepted file layouts: sectioned (`[portal]`, `[polling]`, `[web]`) or flat add-on options
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ConfigFile {
    Sectioned(AppConfig),
    Addon(AddonOptions),
}

impl From<ConfigFile> for AppConfig {
    fn from(file: ConfigFile) -> Self {
        match file {
            ConfigFile::Sectioned(config) => config,
            ConfigFile::Addon(options) => Self {
                portal: options.portal,
                polling: PollingConfig {
                    interval_secs: options.poll_interval_secs,
                },
                web: WebConfig {
                    enabled: options.web_enabled,
                    port: options.web_port,
                },
            },
        }
    }
}

fn default_interval_secs() -> u64 {
    100
}

fn default_web_enabled() -> bool {
    true
}

fn default_web_port() -> u16 {
    8099
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: default_web_enabled(),
            port: default_web_port(),
        }
    }
}

impl AppConfig {
    /// Load configuration from HA addon options or config file
    pub fn load() -> Result<Self> {
        // HA addon options first
        if Path::new("/data/options.json").exists() {
            let config = Self::from_file("/data/options.json")?;
            info!("✅ Loaded configuration from HA addon options");
            return Ok(config);
        }

        for path in ["config.toml", "config.json"] {
            if Path::new(path).exists() {
                let config = Self::from_file(path)?;
                info!("✅ Loaded configuration from {}", path);
                return Ok(config);
            }
        }

        warn!("No configuration file found, using defaults with environment overrides");
        let config = Self::from_env();
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML or JSON file, chosen by extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let file: ConfigFile = if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        };

        let config = Self::from(file);
        config.validate()?;
        Ok(config)
    }

    /// Defaults with `EVOHAUS_*` environment overrides
    fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(username) = lookup("EVOHAUS_USERNAME") {
            config.portal.username = username;
        }
        if let Some(password) = lookup("EVOHAUS_PASSWORD") {
            config.portal.password = password;
        }
        if let Some(url) = lookup("EVOHAUS_BASE_URL") {
            config.portal.base_url = url;
        }
        if let Some(interval) = lookup("EVOHAUS_POLL_INTERVAL_SECS")
            && let Ok(secs) = interval.parse::<u64>()
        {
            config.polling.interval_secs = secs;
        }

        config
    }

    pub fn validate(&self) -> Result<()> {
        self.portal
            .validate()
            .context("Invalid portal configuration")?;

        if self.polling.interval_secs < MIN_POLL_INTERVAL_SECS {
            anyhow::bail!(
                "Polling interval must be at least {} seconds, got {}",
                MIN_POLL_INTERVAL_SECS,
                self.polling.interval_secs
            );
        }

        if self.web.enabled && self.web.port == 0 {
            anyhow::bail!("Web port must not be 0");
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.polling.interval_secs)
    }
}
