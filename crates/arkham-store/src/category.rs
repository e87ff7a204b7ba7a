//! The seven fixed log categories

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Response key that does not follow the `<category>_log` rule
const SERVER_LOG_KEY: &str = "server_log";

/// One of the seven log subsystems tracked by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Network traffic monitoring
    Network,
    /// Server events
    ServerLogs,
    /// Camera feeds
    VideoSurveillance,
    /// Biometric scanners
    BiometricAccess,
    /// Alarms, locks and lockdown systems
    PhysicalSecurity,
    /// Staff communications
    InternalComms,
    /// Inmate threat assessments
    InmateThreats,
}

impl Category {
    /// All categories in snapshot order
    pub const ALL: [Category; 7] = [
        Category::Network,
        Category::ServerLogs,
        Category::VideoSurveillance,
        Category::BiometricAccess,
        Category::PhysicalSecurity,
        Category::InternalComms,
        Category::InmateThreats,
    ];

    /// Store key for this category
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Category::Network => "network",
            Category::ServerLogs => "server_logs",
            Category::VideoSurveillance => "video_surveillance",
            Category::BiometricAccess => "biometric_access",
            Category::PhysicalSecurity => "physical_security",
            Category::InternalComms => "internal_comms",
            Category::InmateThreats => "inmate_threats",
        }
    }

    /// Resolve a sample-logs response key to a store category name.
    ///
    /// `server_log` maps to `server_logs`; every other key loses its
    /// `_log` suffix. The result is a name, not a category: keys such as
    /// `inmate_threat_log` resolve to names the store does not know.
    #[must_use]
    pub fn resolve_response_key(key: &str) -> &str {
        if key == SERVER_LOG_KEY {
            return Category::ServerLogs.as_str();
        }
        key.strip_suffix("_log").unwrap_or(key)
    }

    /// Category for a sample-logs response key, if the store tracks it
    #[must_use]
    pub fn from_response_key(key: &str) -> Option<Self> {
        Self::resolve_response_key(key).parse().ok()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| StoreError::UnknownCategory(s.to_string()))
    }
}
