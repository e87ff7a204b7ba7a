//! Error types for the dashboard core
//!
//! Provides error handling for:
//! - Backend fetches (sample logs and per-category tables)
//! - Renderer updates
//! - Configuration loading
//! - Table column definitions
//!
//! Every variant is recoverable: the session logs it and keeps running.

use arkham_store::StoreError;
use std::path::PathBuf;

/// Errors fetching logs from the backend
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport or HTTP status failure
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON shape
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Source has nothing more to give (scripted sources in tests)
    #[error("log source exhausted")]
    Exhausted,
}

impl FetchError {
    /// Create malformed-response error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }
}

/// Errors reported by a view renderer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// Element with this id is not present in the view
    #[error("missing render target: #{0}")]
    MissingTarget(String),

    /// Renderer-specific failure
    #[error("render failed: {0}")]
    Failed(String),
}

impl RenderError {
    /// Create missing-target error
    pub fn missing_target(element_id: impl Into<String>) -> Self {
        Self::MissingTarget(element_id.into())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`DashboardConfig`](crate::DashboardConfig)
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values parse but are inconsistent
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Table configuration errors
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// Column definitions were not valid JSON
    #[error("error parsing column definitions: {0}")]
    Columns(#[from] serde_json::Error),

    /// A table needs at least one column
    #[error("table has no columns")]
    NoColumns,

    /// Order column index out of range
    #[error("order column {index} out of range for {count} columns")]
    OrderColumn { index: usize, count: usize },

    /// Page length is neither a positive row count nor `all`
    #[error("invalid page length: {0}")]
    PageLength(String),
}

/// Combined dashboard error
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("table error: {0}")]
    Table(#[from] TableError),
}

/// Result type alias for dashboard operations
pub type DashboardResult<T> = Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_response_display() {
        let err = FetchError::malformed("expected object, got array");
        assert_eq!(err.to_string(), "malformed response: expected object, got array");
    }

    #[test]
    fn missing_target_display() {
        let err = RenderError::missing_target("networkStatus");
        assert_eq!(err.to_string(), "missing render target: #networkStatus");
    }

    #[test]
    fn error_conversions() {
        let err: DashboardError = FetchError::Exhausted.into();
        assert!(matches!(err, DashboardError::Fetch(FetchError::Exhausted)));

        let err: DashboardError = StoreError::UnknownCategory("x".into()).into();
        assert!(matches!(err, DashboardError::Store(_)));
    }
}
