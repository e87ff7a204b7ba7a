//! Arkham Log Store
//!
//! Client-side cache of dashboard log events, one bounded newest-first list
//! per category, restored from and flushed to a durable snapshot slot.
//!
//! # Core Operations
//!
//! - **Create / Restore**: load the persisted snapshot, degrading to a fresh
//!   store when it is absent or corrupt
//! - **Append**: insert at the head of a category, capped at [`MAX_LOGS`]
//! - **Purge**: drop records older than the retention window
//! - **Persist**: write the whole store back to its slot
//!
//! # Example
//!
//! ```rust,ignore
//! use arkham_store::{FileSlot, LogCache, LogRecord};
//!
//! let (mut cache, origin) = LogCache::restore(FileSlot::in_dir("./data"));
//! cache.append("network", LogRecord::new().with_field("threat_level", "high"))?;
//! cache.persist()?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod cache;
pub mod category;
pub mod error;
pub mod record;
pub mod slot;
pub mod store;

// Re-exports for convenience
pub use cache::{LogCache, RestoreOrigin};
pub use category::Category;
pub use error::{StoreError, StoreResult};
pub use record::{parse_timestamp, LogRecord, RecordTime, TIMESTAMP_FIELD};
pub use slot::{FileSlot, MemorySlot, SnapshotSlot, DEFAULT_SLOT_KEY};
pub use store::{retention, LogStore, MAX_LOGS, RETENTION_SECS};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
