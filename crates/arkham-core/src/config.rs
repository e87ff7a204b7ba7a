//! Dashboard configuration
//!
//! Loaded from TOML; every field has a default so a partial file (or none at
//! all) is valid.
//!
//! ```toml
//! base_url = "http://127.0.0.1:5000"
//! poll_min_ms = 2000
//! poll_max_ms = 4000
//! snapshot_path = "/var/lib/arkham/arkhamLogStore.json"
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Dashboard configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Backend origin, e.g. `http://127.0.0.1:5000`
    pub base_url: String,
    /// Path of the sample-logs endpoint
    pub sample_logs_path: String,
    /// Lower bound of the poll delay in milliseconds
    pub poll_min_ms: u64,
    /// Upper bound of the poll delay in milliseconds
    pub poll_max_ms: u64,
    /// Period of the purge-and-persist maintenance pass in seconds
    pub maintenance_interval_secs: u64,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Snapshot file; `None` keeps the store in memory only
    pub snapshot_path: Option<PathBuf>,
    /// Items shown in the recent activity list
    pub recent_activity_limit: usize,
}

impl DashboardConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string and validate
    ///
    /// # Errors
    /// `ConfigError::Parse` or `ConfigError::Invalid`
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// `ConfigError::Io` if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str)
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// With backend origin
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// With poll delay bounds in milliseconds
    #[inline]
    #[must_use]
    pub fn with_poll_range(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.poll_min_ms = min_ms;
        self.poll_max_ms = max_ms;
        self
    }

    /// With maintenance period in seconds
    #[inline]
    #[must_use]
    pub fn with_maintenance_interval(mut self, secs: u64) -> Self {
        self.maintenance_interval_secs = secs;
        self
    }

    /// With per-request timeout in seconds
    #[inline]
    #[must_use]
    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// With snapshot file
    #[inline]
    #[must_use]
    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    /// Check value consistency
    ///
    /// # Errors
    /// `ConfigError::Invalid` describing the first bad value
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url must not be empty".into()));
        }
        if self.poll_min_ms == 0 {
            return Err(ConfigError::Invalid("poll_min_ms must be positive".into()));
        }
        if self.poll_min_ms > self.poll_max_ms {
            return Err(ConfigError::Invalid(format!(
                "poll_min_ms ({}) exceeds poll_max_ms ({})",
                self.poll_min_ms, self.poll_max_ms
            )));
        }
        if self.maintenance_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "maintenance_interval_secs must be positive".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be positive".into()));
        }
        Ok(())
    }

    /// Maintenance period
    #[inline]
    #[must_use]
    pub fn maintenance_interval(&self) -> Duration {
        Duration::from_secs(self.maintenance_interval_secs)
    }

    /// Request timeout
    #[inline]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            sample_logs_path: "/api/sample-logs".to_string(),
            poll_min_ms: 2000,
            poll_max_ms: 4000,
            maintenance_interval_secs: 10,
            request_timeout_secs: 10,
            snapshot_path: None,
            recent_activity_limit: 3,
        }
    }
}
