//! Arkham Dashboard Core
//!
//! Everything between the backend and the screen:
//! - Polls the sample-logs endpoint on a jittered schedule
//! - Feeds the records into the [`arkham_store`] cache
//! - Classifies subsystem status from recent severities
//! - Builds chart, activity and table data for a [`ViewRenderer`]
//!
//! # Example
//!
//! ```rust,ignore
//! use arkham_core::prelude::*;
//! use arkham_store::{FileSlot, LogCache};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DashboardConfig::load("arkham.toml")?;
//! let (cache, _) = LogCache::restore(FileSlot::in_dir("./data"));
//! let source = HttpLogSource::new(&config)?;
//! let mut session = DashboardSession::new(cache, source, NullRenderer, config);
//!
//! let (_tx, rx) = tokio::sync::watch::channel(false);
//! session.run(rx).await;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod config;
pub mod error;
pub mod poller;
pub mod render;
pub mod session;
pub mod status;
pub mod table;
pub mod views;

// Re-exports for convenience
pub use config::DashboardConfig;
pub use error::{
    ConfigError, DashboardError, DashboardResult, FetchError, RenderError, TableError,
};
pub use poller::{
    category_endpoint, ingest_response, records_from_array, HttpLogSource, IngestReport,
    LogSource, PollSchedule,
};
pub use render::{NullRenderer, ViewRenderer};
pub use session::{DashboardFrame, DashboardSession};
pub use status::{classify, Severity, Status, Subsystem, STATUS_THRESHOLD, STATUS_WINDOW};
pub use table::{
    default_columns, format_timestamp, label_class, parse_columns, Cell, ColumnDef, LogTable,
    PageLength, SortDirection, TablePage, TableQuery, PAGE_LENGTHS,
};
pub use views::{
    access_results, category_counts, recent_activity, severity_distribution, AccessResults,
    ActivityItem, AlertCounts, AlertTimeline, SeverityDistribution, TIMELINE_SLOTS,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running a dashboard
    pub use crate::{
        DashboardConfig, DashboardError, DashboardFrame, DashboardSession, HttpLogSource,
        LogSource, NullRenderer, PollSchedule, Status, Subsystem, ViewRenderer,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
