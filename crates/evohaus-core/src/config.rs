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

//! Portal connection settings

use crate::errors::{PortalError, PortalResult};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Production portal host
pub const DEFAULT_BASE_URL: &str = "https://ems003.enocoo.com:48889";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_cache_ttl_secs() -> u64 {
    100
}

fn default_timezone() -> String {
    "Europe/Berlin".to_owned()
}

/// Connection and parsing settings for one portal account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Portal login name
    pub username: String,

    /// Portal password (only ever held in memory)
    #[serde(default, skip_serializing)]
    pub password: String,

    /// Portal base URL, overridable for testing
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// How long a fetched meter table is reused (seconds)
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Timezone used for the portal's date parameter and `updateTime` stamps
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Fixed surcharge (ct/kWh) added to the dynamic price before publishing
    #[serde(default)]
    pub price_surcharge_cents: f64,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            timezone: default_timezone(),
            price_surcharge_cents: 0.0,
        }
    }
}

impl PortalConfig {
    /// Create settings for the given credentials with production defaults
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Parsed timezone
    pub fn tz(&self) -> PortalResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| PortalError::Config(format!("Unknown timezone: {}", self.timezone)))
    }

    /// Check the settings before any request is made
    pub fn validate(&self) -> PortalResult<()> {
        if self.username.trim().is_empty() {
            return Err(PortalError::Config("username must not be empty".to_owned()));
        }
        if self.password.is_empty() {
            return Err(PortalError::Config("password must not be empty".to_owned()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(PortalError::Config(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(PortalError::Config(
                "request_timeout_secs must be greater than 0".to_owned(),
            ));
        }
        if self.cache_ttl_secs == 0 {
            return Err(PortalError::Config(
                "cache_ttl_secs must be greater than 0".to_owned(),
            ));
        }
        if !self.price_surcharge_cents.is_finite() {
            return Err(PortalError::Config(
                "price_surcharge_cents must be a finite number".to_owned(),
            ));
        }
        self.tz()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PortalConfig::new("user", "secret");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.cache_ttl(), Duration::from_secs(100));
        assert_eq!(config.tz().unwrap(), chrono_tz::Europe::Berlin);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_credentials() {
        assert!(PortalConfig::new("", "secret").validate().is_err());
        assert!(PortalConfig::new("user", "").validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = PortalConfig::new("user", "secret");
        config.timezone = "Mars/Olympus".to_owned();
        assert!(matches!(config.validate(), Err(PortalError::Config(_))));

        let mut config = PortalConfig::new("user", "secret");
        config.cache_ttl_secs = 0;
        assert!(config.validate().is_err());

        let config = PortalConfig::new("user", "secret").with_base_url("ftp://portal");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_password_never_serialized() {
        let config = PortalConfig::new("user", "secret");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("\"username\":\"user\""));
    }

    #[test]
    fn test_deserialize_minimal() {
        let config: PortalConfig =
            serde_json::from_str(r#"{"username": "u", "password": "p"}"#).unwrap();
        assert_eq!(config.cache_ttl_secs, 100);
        assert_eq!(config.timezone, "Europe/Berlin");
        assert!((config.price_surcharge_cents - 0.0).abs() < f64::EPSILON);
    }
}
