// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration for the store connection, locks and semaphores
//!
//! All sections have defaults, so an empty TOML document is a valid config.
//! Durations use humantime notation (`"60s"`, `"5m"`).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Where the store lives and how long to wait for it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub hostname: String,
    pub port: u16,
    /// Limit for ordinary (non-waiting) requests
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Limit for watch requests; `None` waits as long as the store keeps the request open
    #[serde(with = "humantime_serde")]
    pub watch_timeout: Option<Duration>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            hostname: "127.0.0.1".to_string(),
            port: 4001,
            request_timeout: Duration::from_secs(5),
            watch_timeout: None,
        }
    }
}

impl StoreConfig {
    pub fn new(hostname: impl Into<String>, port: u16) -> Self {
        Self {
            hostname: hostname.into(),
            port,
            ..Default::default()
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_watch_timeout(mut self, timeout: Duration) -> Self {
        self.watch_timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.hostname, self.port)
    }
}

/// Lock lease settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// How long a lock survives without renewal
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,
    /// How often a lease keeper renews; defaults to a third of the TTL
    #[serde(with = "humantime_serde")]
    pub renew_interval: Option<Duration>,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
            renew_interval: None,
        }
    }
}

impl LockConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_renew_interval(mut self, interval: Duration) -> Self {
        self.renew_interval = Some(interval);
        self
    }

    pub fn effective_renew_interval(&self) -> Duration {
        self.renew_interval.unwrap_or(self.ttl / 3)
    }
}

/// Semaphore settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemaphoreConfig {
    /// TTL of the lock guarding counter updates
    #[serde(with = "humantime_serde")]
    pub lock_ttl: Duration,
}

impl Default for SemaphoreConfig {
    fn default() -> Self {
        Self {
            lock_ttl: Duration::from_secs(60),
        }
    }
}

impl SemaphoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lock_ttl(mut self, ttl: Duration) -> Self {
        self.lock_ttl = ttl;
        self
    }
}

/// Top-level configuration document
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatchConfig {
    pub store: StoreConfig,
    pub lock: LockConfig,
    pub semaphore: SemaphoreConfig,
}

impl LatchConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: LatchConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.hostname.is_empty() {
            return Err(ConfigError::Invalid {
                field: "store.hostname",
                reason: "must not be empty".to_string(),
            });
        }
        if self.lock.ttl < Duration::from_secs(1) {
            return Err(ConfigError::Invalid {
                field: "lock.ttl",
                reason: "must be at least one second".to_string(),
            });
        }
        if self.semaphore.lock_ttl < Duration::from_secs(1) {
            return Err(ConfigError::Invalid {
                field: "semaphore.lock_ttl",
                reason: "must be at least one second".to_string(),
            });
        }
        if let Some(interval) = self.lock.renew_interval {
            if interval.is_zero() || interval >= self.lock.ttl {
                return Err(ConfigError::Invalid {
                    field: "lock.renew_interval",
                    reason: "must be non-zero and shorter than lock.ttl".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
